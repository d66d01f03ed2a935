//! Storepress store publishing: turning page edits into published store
//! app versions.
//!
//! This crate holds the domain logic of the publishing service: app manifest
//! handling, app identifiers and version bumps, file-set assembly, and the
//! orchestration that talks to the platform registry and builder services.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use storepress_store::{
//!     HttpBuilderClient, HttpRegistryClient, StorePublisher, UploadFile,
//! };
//!
//! # async fn example() -> storepress_store::Result<()> {
//! let registry = Arc::new(HttpRegistryClient::new("https://registry.internal"));
//! let builder = Arc::new(HttpBuilderClient::new("https://builder.internal"));
//! let publisher = StorePublisher::new(registry, builder, "acme", "appFilesFromRegistry");
//!
//! let app_id = publisher
//!     .publish_from_page(UploadFile {
//!         file: r#"{"blocks":[]}"#.to_string(),
//!         page: "store.custom".to_string(),
//!         slug: "about-us".to_string(),
//!         title: "About us".to_string(),
//!     })
//!     .await?;
//! println!("published {}", app_id);
//! # Ok(())
//! # }
//! ```

pub mod app_files;
pub mod app_id;
pub mod clients;
pub mod error;
pub mod manifest;
pub mod publisher;

// Re-export commonly used types
pub use app_files::AppFiles;
pub use app_id::AppId;
pub use clients::{
    BuilderClient, BuilderFile, HttpBuilderClient, HttpRegistryClient, PublishReceipt,
    RegistryClient, VersionEntry,
};
pub use error::{Result, StoreError};
pub use manifest::{default_dependencies, Manifest};
pub use publisher::{StorePublisher, UploadFile, STORE_STATE};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "storepress_store");
    }
}
