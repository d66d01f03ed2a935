//! Registry service client.
//!
//! The registry stores every published version of an app. This component
//! needs two of its operations: listing the known versions of an app, and
//! unpacking one version's bundle (a gzipped tar of its source tree) into a
//! local directory.

use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::clients::create_default_client;
use crate::error::{Result, StoreError};

/// One entry of a registry version listing.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    /// Fully qualified `vendor.name@version` identifier.
    #[serde(rename = "versionIdentifier")]
    pub version_identifier: String,
}

#[derive(Debug, Deserialize)]
struct VersionListResponse {
    data: Vec<VersionEntry>,
}

#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// List the published versions of `app_name`, oldest first. The ordering
    /// is the registry's contract; callers take the last entry as current.
    async fn list_versions(&self, app_name: &str) -> Result<Vec<VersionEntry>>;

    /// Download the bundle of `app_name@version` and unpack it under `dest`.
    /// `subpath` narrows the bundle to a subtree; empty means the whole tree.
    async fn unpack_bundle(
        &self,
        app_name: &str,
        version: &str,
        subpath: &str,
        dest: &Path,
    ) -> Result<()>;
}

/// Registry client backed by the platform registry's HTTP API.
pub struct HttpRegistryClient {
    base_url: String,
    client: Client,
}

impl HttpRegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: create_default_client(Duration::from_secs(30)),
        }
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn list_versions(&self, app_name: &str) -> Result<Vec<VersionEntry>> {
        let url = format!("{}/registry/{}/versions", self.base_url, app_name);

        debug!("Listing app versions from registry: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            StoreError::Network(format!("Failed to list versions of {}: {}", app_name, e))
        })?;

        if response.status() == 404 {
            return Err(StoreError::AppNotFound(app_name.to_string()));
        }

        if !response.status().is_success() {
            return Err(StoreError::Network(format!(
                "Registry version listing for {} failed with status {}",
                app_name,
                response.status()
            )));
        }

        let listing: VersionListResponse = response.json().await.map_err(|e| {
            StoreError::Network(format!(
                "Failed to parse registry version listing for {}: {}",
                app_name, e
            ))
        })?;

        Ok(listing.data)
    }

    async fn unpack_bundle(
        &self,
        app_name: &str,
        version: &str,
        subpath: &str,
        dest: &Path,
    ) -> Result<()> {
        let url = format!(
            "{}/registry/{}/{}/bundle?subpath={}",
            self.base_url, app_name, version, subpath
        );

        debug!("Fetching app bundle from registry: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            StoreError::Network(format!(
                "Failed to fetch bundle of {}@{}: {}",
                app_name, version, e
            ))
        })?;

        if !response.status().is_success() {
            return Err(StoreError::Network(format!(
                "Registry bundle fetch for {}@{} failed with status {}",
                app_name,
                version,
                response.status()
            )));
        }

        // Stage the archive on disk before extraction so a broken transfer
        // never leaves a half-written tree under dest.
        let mut archive = tempfile::NamedTempFile::new()?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                StoreError::Network(format!(
                    "Bundle transfer for {}@{} failed: {}",
                    app_name, version, e
                ))
            })?;
            archive.write_all(&chunk)?;
        }
        archive.flush()?;

        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || extract_tar_gz(archive.path(), &dest))
            .await
            .map_err(|e| StoreError::Network(format!("Bundle extraction task failed: {}", e)))?
    }
}

/// Unpack a gzipped tar archive under `out_dir`, refusing entries that could
/// write outside of it.
fn extract_tar_gz(archive_path: &Path, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;

    let file = std::fs::File::open(archive_path)?;
    let gz = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(gz);

    for entry in archive.entries()? {
        let mut entry = entry?;

        let entry_type = entry.header().entry_type();
        if entry_type != tar::EntryType::Regular && entry_type != tar::EntryType::Directory {
            return Err(StoreError::UnsafeBundle(format!(
                "unsupported entry type {:?}",
                entry_type
            )));
        }

        let path = entry.path().map_err(|e| {
            StoreError::UnsafeBundle(format!("unreadable entry path: {}", e))
        })?;
        let relative = sanitize_entry_path(&path)?;

        let target = out_dir.join(relative);
        if entry_type == tar::EntryType::Directory {
            std::fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
    }

    Ok(())
}

fn sanitize_entry_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() || path.is_absolute() {
        return Err(StoreError::UnsafeBundle(format!(
            "forbidden entry path: {}",
            path.display()
        )));
    }

    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(StoreError::UnsafeBundle(format!(
                    "unsafe entry path component: {}",
                    path.display()
                )))
            }
        }
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_archive(entries: &[(&str, &[u8])]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let gz = flate2::write::GzEncoder::new(
            file.reopen().unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(gz);
        for (path, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        file
    }

    #[test]
    fn extracts_regular_files_into_dest() {
        let archive = write_archive(&[
            ("src/manifest.json", b"{}" as &[u8]),
            ("src/store/blocks/home.json", b"{\"blocks\":[]}"),
        ]);
        let dest = tempfile::TempDir::new().unwrap();

        extract_tar_gz(archive.path(), dest.path()).unwrap();

        assert!(dest.path().join("src/manifest.json").is_file());
        assert!(dest.path().join("src/store/blocks/home.json").is_file());
    }

    #[test]
    fn rejects_symlink_entries() {
        // The tar builder refuses `..` paths, so traversal is covered by the
        // sanitize test below; symlinks it will happily write.
        let file = tempfile::NamedTempFile::new().unwrap();
        let gz = flate2::write::GzEncoder::new(
            file.reopen().unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(gz);
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_cksum();
        header.set_link_name("/etc/passwd").unwrap();
        builder
            .append_data(&mut header, "src/link", std::io::empty())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = tempfile::TempDir::new().unwrap();
        let err = extract_tar_gz(file.path(), dest.path()).unwrap_err();
        assert!(matches!(err, StoreError::UnsafeBundle(_)));
    }

    #[test]
    fn sanitize_rejects_traversal_and_absolute_paths() {
        assert!(sanitize_entry_path(Path::new("../escape.json")).is_err());
        assert!(sanitize_entry_path(Path::new("src/../../escape.json")).is_err());
        assert!(sanitize_entry_path(Path::new("/etc/passwd")).is_err());
        assert!(sanitize_entry_path(Path::new("src/ok.json")).is_ok());
    }
}
