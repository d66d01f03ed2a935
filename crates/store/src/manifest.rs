//! App manifest parsing, validation, and default population.
//!
//! The manifest (`manifest.json`) identifies one app: who publishes it
//! (`vendor`), what it is called (`name`), which version is being built, the
//! builders that process it, and the platform modules it depends on.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

static FIELD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w_-]+$").unwrap());
static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+(-.*)?$").unwrap());

/// Version range of the `store` builder a scaffolded app is pinned to.
pub const STORE_BUILDER_RANGE: &str = "0.x";

/// Platform modules every scaffolded store app depends on. Pure configuration
/// data, pinned to the ranges the builder resolves at publish time.
const DEFAULT_DEPENDENCIES: &[(&str, &str)] = &[
    ("storepress.store", "2.x"),
    ("storepress.store-header", "2.x"),
    ("storepress.product-summary", "2.x"),
    ("storepress.store-footer", "2.x"),
    ("storepress.store-components", "3.x"),
    ("storepress.styleguide", "9.x"),
    ("storepress.slider", "0.x"),
    ("storepress.carousel", "2.x"),
    ("storepress.shelf", "1.x"),
    ("storepress.menu", "2.x"),
    ("storepress.minicart", "2.x"),
    ("storepress.product-details", "1.x"),
    ("storepress.product-kit", "1.x"),
    ("storepress.search-result", "3.x"),
    ("storepress.login", "2.x"),
    ("storepress.my-account", "1.x"),
    ("storepress.flex-layout", "0.x"),
    ("storepress.rich-text", "0.x"),
    ("storepress.store-drawer", "0.x"),
    ("storepress.locale-switcher", "0.x"),
    ("storepress.product-quantity", "1.x"),
    ("storepress.product-identifier", "0.x"),
    ("storepress.breadcrumb", "1.x"),
    ("storepress.sticky-layout", "0.x"),
    ("storepress.product-customizer", "2.x"),
    ("storepress.stack-layout", "0.x"),
    ("storepress.product-specification-badges", "0.x"),
    ("storepress.product-review-interfaces", "1.x"),
    ("storepress.reviews-and-ratings", "1.x"),
    ("storepress.telemarketing", "2.x"),
    ("storepress.order-placed", "1.x"),
    ("storepress.checkout-summary", "0.x"),
    ("storepress.product-list", "0.x"),
    ("storepress.add-to-cart-button", "0.x"),
    ("storepress.product-bookmark-interfaces", "1.x"),
    ("storepress.slider-layout", "0.x"),
    ("storepress.store-image", "0.x"),
    ("storepress.store-icons", "0.x"),
    ("storepress.modal-layout", "0.x"),
    ("storepress.store-link", "0.x"),
    ("storepress.product-gifts", "0.x"),
    ("storepress.product-price", "1.x"),
];

/// The platform module dependency table shipped with every default manifest.
pub fn default_dependencies() -> BTreeMap<String, String> {
    DEFAULT_DEPENDENCIES
        .iter()
        .map(|(name, range)| (name.to_string(), range.to_string()))
        .collect()
}

fn default_builders() -> BTreeMap<String, String> {
    let mut builders = BTreeMap::new();
    builders.insert("store".to_string(), STORE_BUILDER_RANGE.to_string());
    builders
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub builders: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Manifest {
    /// A manifest with empty identity fields and the default builder and
    /// dependency tables. Does not validate; callers fill the identity in.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            vendor: String::new(),
            version: String::new(),
            builders: default_builders(),
            dependencies: default_dependencies(),
        }
    }

    /// A manifest for the given identity plus the default builder and
    /// dependency tables, validated before it is returned.
    pub fn with_defaults(
        name: impl Into<String>,
        version: impl Into<String>,
        vendor: impl Into<String>,
    ) -> Result<Self> {
        let manifest = Self {
            name: name.into(),
            vendor: vendor.into(),
            version: version.into(),
            builders: default_builders(),
            dependencies: default_dependencies(),
        };

        manifest.validate()?;
        Ok(manifest)
    }

    /// Read and validate `{dir}/manifest.json`.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = dir.as_ref().join("manifest.json");
        let bytes = tokio::fs::read(&manifest_path)
            .await
            .map_err(|_| malformed_manifest())?;
        Self::from_slice(&bytes)
    }

    /// Decode and validate manifest bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(bytes).map_err(|_| malformed_manifest())?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the identity fields. Checks run in a fixed order and only the
    /// first failure is reported. An empty field counts as unset.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(unset_field("name"));
        }
        if self.version.is_empty() {
            return Err(unset_field("version"));
        }
        if self.vendor.is_empty() {
            return Err(unset_field("vendor"));
        }

        if !FIELD_PATTERN.is_match(&self.name) {
            return Err(invalid_field("name"));
        }
        if !FIELD_PATTERN.is_match(&self.vendor) {
            return Err(invalid_field("vendor"));
        }
        if !VERSION_PATTERN.is_match(&self.version) {
            return Err(StoreError::InvalidManifest(
                "The version format is invalid.".to_string(),
            ));
        }

        Ok(())
    }

    /// Format the fully qualified `vendor.name@version` identifier.
    pub fn app_id(&self) -> String {
        format!("{}.{}@{}", self.vendor, self.name, self.version)
    }
}

pub(crate) fn malformed_manifest() -> StoreError {
    StoreError::InvalidManifest("manifest.json doesn't exist or is malformed.".to_string())
}

fn unset_field(field: &str) -> StoreError {
    StoreError::InvalidManifest(format!(
        "Field '{}' should be set in manifest.json file.",
        field
    ))
}

fn invalid_field(field: &str) -> StoreError {
    StoreError::InvalidManifest(format!(
        "Field '{}' may contain only letters, numbers, underscores and hyphens.",
        field
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_message(manifest: &Manifest) -> String {
        match manifest.validate() {
            Err(StoreError::InvalidManifest(message)) => message,
            other => panic!("expected InvalidManifest, got {:?}", other),
        }
    }

    #[test]
    fn empty_manifest_fails_validation_on_name_first() {
        let manifest = Manifest::empty();
        assert_eq!(
            manifest_message(&manifest),
            "Field 'name' should be set in manifest.json file."
        );
    }

    #[test]
    fn unset_checks_run_name_then_version_then_vendor() {
        let mut manifest = Manifest::empty();
        manifest.name = "store-state".to_string();
        assert_eq!(
            manifest_message(&manifest),
            "Field 'version' should be set in manifest.json file."
        );

        manifest.version = "1.0.0".to_string();
        assert_eq!(
            manifest_message(&manifest),
            "Field 'vendor' should be set in manifest.json file."
        );
    }

    #[test]
    fn pattern_checks_run_after_all_unset_checks() {
        let mut manifest = Manifest::empty();
        manifest.name = "no spaces allowed".to_string();
        manifest.version = "also not a version".to_string();
        manifest.vendor = "acme".to_string();
        // Both name and version are invalid; the name pattern reports first.
        assert_eq!(
            manifest_message(&manifest),
            "Field 'name' may contain only letters, numbers, underscores and hyphens."
        );
    }

    #[test]
    fn vendor_pattern_checked_before_version_pattern() {
        let mut manifest = Manifest::empty();
        manifest.name = "store-state".to_string();
        manifest.version = "not-a-version".to_string();
        manifest.vendor = "bad vendor".to_string();
        assert_eq!(
            manifest_message(&manifest),
            "Field 'vendor' may contain only letters, numbers, underscores and hyphens."
        );
    }

    #[test]
    fn invalid_version_format_is_rejected_last() {
        let mut manifest = Manifest::empty();
        manifest.name = "store-state".to_string();
        manifest.vendor = "acme".to_string();
        manifest.version = "1.0".to_string();
        assert_eq!(manifest_message(&manifest), "The version format is invalid.");
    }

    #[test]
    fn prerelease_versions_pass_validation() {
        let manifest = Manifest::with_defaults("store-state", "1.0.0-beta.2", "acme").unwrap();
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn with_defaults_passes_validation_unchanged() {
        let manifest = Manifest::with_defaults("x", "1.0.0", "y").unwrap();
        assert!(manifest.validate().is_ok());
        assert_eq!(manifest.builders.get("store").unwrap(), "0.x");
        assert_eq!(manifest.dependencies.len(), 42);
    }

    #[test]
    fn with_defaults_rejects_malformed_input() {
        assert!(Manifest::with_defaults("bad name", "1.0.0", "acme").is_err());
        assert!(Manifest::with_defaults("store-state", "1.0", "acme").is_err());
    }

    #[test]
    fn app_id_formats_vendor_name_version() {
        let manifest = Manifest::with_defaults("store", "1.2.3", "acme").unwrap();
        assert_eq!(manifest.app_id(), "acme.store@1.2.3");
    }

    #[test]
    fn default_dependencies_pin_known_modules() {
        let dependencies = default_dependencies();
        assert_eq!(dependencies.get("storepress.store").unwrap(), "2.x");
        assert_eq!(dependencies.get("storepress.styleguide").unwrap(), "9.x");
        assert_eq!(dependencies.get("storepress.product-price").unwrap(), "1.x");
    }

    #[tokio::test]
    async fn load_reads_and_validates_manifest_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let manifest = Manifest::with_defaults("store-state", "0.0.1", "acme").unwrap();
        tokio::fs::write(
            dir.path().join("manifest.json"),
            serde_json::to_vec_pretty(&manifest).unwrap(),
        )
        .await
        .unwrap();

        let loaded = Manifest::load(dir.path()).await.unwrap();
        assert_eq!(loaded.app_id(), "acme.store-state@0.0.1");
    }

    #[tokio::test]
    async fn load_reports_missing_or_malformed_manifest() {
        let dir = tempfile::TempDir::new().unwrap();

        let missing = Manifest::load(dir.path()).await.unwrap_err();
        assert_eq!(
            missing.to_string(),
            "manifest.json doesn't exist or is malformed."
        );

        tokio::fs::write(dir.path().join("manifest.json"), b"{not json")
            .await
            .unwrap();
        let malformed = Manifest::load(dir.path()).await.unwrap_err();
        assert_eq!(
            malformed.to_string(),
            "manifest.json doesn't exist or is malformed."
        );
    }
}
