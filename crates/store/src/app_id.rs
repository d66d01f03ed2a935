//! App identifiers in the `vendor.name@version` format.

use std::fmt::{self, Display};
use std::str::FromStr;

use semver::Version;

use crate::error::StoreError;

/// Fully qualified identifier of one app version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppId {
    pub vendor: String,
    pub name: String,
    pub version: Version,
}

impl AppId {
    pub fn new(vendor: impl Into<String>, name: impl Into<String>, version: Version) -> Self {
        Self {
            vendor: vendor.into(),
            name: name.into(),
            version,
        }
    }

    /// The unversioned `vendor.name` part used when addressing the registry.
    pub fn app_name(&self) -> String {
        format!("{}.{}", self.vendor, self.name)
    }

    /// Next patch release. Prerelease and build metadata are dropped.
    pub fn bump_patch(&self) -> AppId {
        AppId {
            vendor: self.vendor.clone(),
            name: self.name.clone(),
            version: Version::new(
                self.version.major,
                self.version.minor,
                self.version.patch + 1,
            ),
        }
    }
}

impl Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}@{}", self.vendor, self.name, self.version)
    }
}

impl FromStr for AppId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (app_name, version) = s
            .split_once('@')
            .ok_or_else(|| StoreError::InvalidAppId(s.to_string()))?;
        // The vendor never contains a dot; everything after the first one is
        // the app name.
        let (vendor, name) = app_name
            .split_once('.')
            .ok_or_else(|| StoreError::InvalidAppId(s.to_string()))?;

        if vendor.is_empty() || name.is_empty() {
            return Err(StoreError::InvalidAppId(s.to_string()));
        }

        Ok(AppId {
            vendor: vendor.to_string(),
            name: name.to_string(),
            version: Version::parse(version)?,
        })
    }
}
