use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Upload validation failure. The message is the full user-facing text.
    #[error("{0}")]
    BuildFailed(String),

    /// Manifest parse or validation failure. The message is the full
    /// user-facing text.
    #[error("{0}")]
    InvalidManifest(String),

    #[error("App '{0}' not found in registry")]
    AppNotFound(String),

    #[error("Invalid app identifier: {0}")]
    InvalidAppId(String),

    #[error("Invalid version format: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsafe bundle entry: {0}")]
    UnsafeBundle(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
