//! Publish orchestration: a page edit comes in, a new store app version
//! goes out.
//!
//! The flow is strictly sequential: validate the upload, resolve the current
//! version from the registry (or decide the app is new), patch-bump, assemble
//! the file set, hand it to the builder. At most three remote calls, each
//! awaited to completion.

use std::path::PathBuf;
use std::sync::Arc;

use semver::Version;
use tracing::{debug, info, warn};

use crate::app_files::AppFiles;
use crate::app_id::AppId;
use crate::clients::{BuilderClient, RegistryClient};
use crate::error::{Result, StoreError};

/// Name of the app every account's store pages are published under.
pub const STORE_STATE: &str = "store-state";

/// One page edit, as received from the admin UI.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Serialized block tree of the page.
    pub file: String,
    /// Page template the blocks extend.
    pub page: String,
    /// URL slug of the page.
    pub slug: String,
    /// Human-readable page title.
    pub title: String,
}

impl UploadFile {
    fn has_required_fields(&self) -> bool {
        !self.file.is_empty()
            && !self.page.is_empty()
            && !self.slug.is_empty()
            && !self.title.is_empty()
    }
}

/// Publishes store apps on behalf of one account.
pub struct StorePublisher {
    registry: Arc<dyn RegistryClient>,
    builder: Arc<dyn BuilderClient>,
    account: String,
    workdir: PathBuf,
}

impl StorePublisher {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        builder: Arc<dyn BuilderClient>,
        account: impl Into<String>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            builder,
            account: account.into(),
            workdir: workdir.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Publish a new version of the account's store app from one page edit.
    /// Returns the identifier of the version handed to the builder.
    pub async fn publish_from_page(&self, upload: UploadFile) -> Result<AppId> {
        if !upload.has_required_fields() {
            warn!("Missing a parameter for the uploadFile");
            return Err(StoreError::BuildFailed(
                "Missing a parameter for the uploadFile. It is necessary to have the blocks, \
                 page, title and slug"
                    .to_string(),
            ));
        }

        let app_name = format!("{}.{}", self.account, STORE_STATE);
        let mut new_app = false;

        // Any listing failure means there is nothing to republish: start the
        // version history from scratch. A not-found is the expected first
        // publish; anything else is logged so a real outage stays visible.
        let current_id = match self.registry.list_versions(&app_name).await {
            Ok(versions) => match versions.last() {
                Some(entry) => entry.version_identifier.parse::<AppId>()?,
                None => {
                    warn!("Registry has no versions of {}", STORE_STATE);
                    new_app = true;
                    self.base_id()
                }
            },
            Err(StoreError::AppNotFound(_)) => {
                warn!("Could not find previous versions of {}", STORE_STATE);
                new_app = true;
                self.base_id()
            }
            Err(err) => {
                warn!(
                    "Version listing for {} failed ({}); treating it as a new app",
                    app_name, err
                );
                new_app = true;
                self.base_id()
            }
        };

        let next_id = current_id.bump_patch();

        let app_files = if new_app {
            debug!("Scaffolding fresh app files for {}", next_id);
            AppFiles::scaffold(&upload, &next_id.version, &self.account)?
        } else {
            tokio::fs::create_dir_all(&self.workdir).await?;

            let old_version = current_id.version.to_string();
            self.registry
                .unpack_bundle(&app_name, &old_version, "", &self.workdir)
                .await?;

            let source_path = self.workdir.join("src");
            AppFiles::from_unpacked_tree(&source_path, &upload, &next_id.version).await?
        };

        let files = app_files.into_builder_files();
        let receipt = self.builder.publish_app(&next_id, &files).await?;

        info!("Build result message: {}", receipt.message);
        info!(
            "Finished building {}. Please check to make sure the publishing was successful.",
            next_id
        );

        Ok(next_id)
    }

    fn base_id(&self) -> AppId {
        AppId::new(self.account.clone(), STORE_STATE, Version::new(0, 0, 0))
    }
}
