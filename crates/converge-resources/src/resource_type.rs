//! The `(kind, group, apiVersion)` triple.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::ApiVersion;

/// Identifies one representation of a resource kind.
///
/// Two resource types are equal when all three fields are equal. The
/// `(group, api_version)` pair forms an API group version; several resource
/// types may share a `kind` across versions.
///
/// An empty `group` or `api_version` acts as a wildcard in [`ResourceType::matches`],
/// which is how extensions declare support for "every version of a kind".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    pub kind: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub api_version: String,
}

impl ResourceType {
    pub fn new(
        kind: impl Into<String>,
        group: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            group: group.into(),
            api_version: api_version.into(),
        }
    }

    /// A type matching every group and version of `kind`.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self::new(kind, "", "")
    }

    /// Build a type from a `group/version` (or bare `version`) string.
    ///
    /// ```
    /// use converge_resources::ResourceType;
    ///
    /// let t = ResourceType::from_api_version("kafka.converge.io/v1beta2", "Topic");
    /// assert_eq!(t.group, "kafka.converge.io");
    /// assert_eq!(t.api_version, "v1beta2");
    ///
    /// let core = ResourceType::from_api_version("v1", "Secret");
    /// assert_eq!(core.group, "");
    /// ```
    pub fn from_api_version(api_version: &str, kind: impl Into<String>) -> Self {
        match api_version.rsplit_once('/') {
            Some((group, version)) => Self::new(kind, group, version),
            None => Self::new(kind, "", api_version),
        }
    }

    /// The `group/version` string as written in resource documents.
    pub fn api_version_string(&self) -> String {
        if self.group.is_empty() {
            self.api_version.clone()
        } else {
            format!("{}/{}", self.group, self.api_version)
        }
    }

    /// The parsed, ordered form of `api_version`.
    pub fn version(&self) -> ApiVersion {
        ApiVersion::parse(&self.api_version)
    }

    /// Whether `other` is covered by this type.
    ///
    /// Kinds compare case-insensitively. An empty group or version on `self`
    /// matches anything.
    pub fn matches(&self, other: &ResourceType) -> bool {
        self.kind.eq_ignore_ascii_case(&other.kind)
            && (self.group.is_empty() || self.group == other.group)
            && (self.api_version.is_empty() || self.api_version == other.api_version)
    }

    /// Whether this type leaves its group or version unspecified.
    pub fn is_wildcard(&self) -> bool {
        self.group.is_empty() || self.api_version.is_empty()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.api_version_string())
    }
}
