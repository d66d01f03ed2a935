//! HTTP clients for the platform registry and builder services.
//!
//! Both collaborators sit behind narrow async traits so the publish flow can
//! be driven against in-memory fakes in tests.

pub mod builder;
pub mod registry;

pub use builder::{BuilderClient, BuilderFile, HttpBuilderClient, PublishReceipt};
pub use registry::{HttpRegistryClient, RegistryClient, VersionEntry};

pub const USER_AGENT: &str = "storepress/0.1.0";

/// Create a default HTTP client for talking to platform services.
pub(crate) fn create_default_client(timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to create HTTP client")
}
