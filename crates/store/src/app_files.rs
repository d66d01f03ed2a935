//! Assembling the file set for one app version.
//!
//! An [`AppFiles`] value is the complete buildable source tree of a store
//! app, kept in memory as relative path → content bytes. It is either
//! scaffolded from scratch for a brand-new app, or derived from an unpacked
//! previous-version bundle with the edited page overlaid.

use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::clients::BuilderFile;
use crate::error::{Result, StoreError};
use crate::manifest::{self, Manifest};
use crate::publisher::{UploadFile, STORE_STATE};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const PAGE_INDEX_FILE: &str = "store/index.json";

#[derive(Serialize)]
struct PageIndexEntry<'a> {
    page: &'a str,
    title: &'a str,
}

/// In-memory source tree for one app version.
#[derive(Debug, Clone, Default)]
pub struct AppFiles {
    files: BTreeMap<String, Vec<u8>>,
}

impl AppFiles {
    /// Relative path of the content file for a page slug.
    pub fn page_path(slug: &str) -> String {
        format!("store/blocks/{}.json", slug)
    }

    /// Build the tree for a brand-new store app: a default manifest, the base
    /// page index seeded with the uploaded page, and the page content itself.
    pub fn scaffold(upload: &UploadFile, version: &Version, account: &str) -> Result<Self> {
        let manifest = Manifest::with_defaults(STORE_STATE, version.to_string(), account)?;

        let mut index = BTreeMap::new();
        index.insert(
            upload.slug.as_str(),
            PageIndexEntry {
                page: &upload.page,
                title: &upload.title,
            },
        );

        let mut files = BTreeMap::new();
        files.insert(
            MANIFEST_FILE.to_string(),
            serde_json::to_vec_pretty(&manifest)?,
        );
        files.insert(
            PAGE_INDEX_FILE.to_string(),
            serde_json::to_vec_pretty(&index)?,
        );
        files.insert(
            Self::page_path(&upload.slug),
            upload.file.clone().into_bytes(),
        );

        Ok(Self { files })
    }

    /// Read every file under `dir` (an unpacked previous version), overlay
    /// the uploaded page, and bump the manifest to `version`.
    pub async fn from_unpacked_tree(
        dir: &Path,
        upload: &UploadFile,
        version: &Version,
    ) -> Result<Self> {
        let mut files = BTreeMap::new();

        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(dir) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let key = relative.to_string_lossy().replace('\\', "/");
            let content = tokio::fs::read(entry.path()).await?;
            files.insert(key, content);
        }

        debug!(
            "Collected {} files from unpacked tree at {}",
            files.len(),
            dir.display()
        );

        files.insert(
            Self::page_path(&upload.slug),
            upload.file.clone().into_bytes(),
        );

        let manifest_bytes = files
            .get(MANIFEST_FILE)
            .ok_or_else(manifest::malformed_manifest)?;
        let mut manifest = Manifest::from_slice(manifest_bytes)?;
        manifest.version = version.to_string();
        files.insert(
            MANIFEST_FILE.to_string(),
            serde_json::to_vec_pretty(&manifest)?,
        );

        Ok(Self { files })
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Shape the tree into the builder's wire format. Hidden entries (any
    /// dot-prefixed path component) are not part of a buildable app.
    pub fn into_builder_files(self) -> Vec<BuilderFile> {
        self.files
            .into_iter()
            .filter(|(path, _)| !is_hidden(path))
            .map(|(path, content)| BuilderFile::new(path, &content))
            .collect()
    }
}

fn is_hidden(path: &str) -> bool {
    path.split('/').any(|component| component.starts_with('.'))
}
