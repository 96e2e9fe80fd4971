//! API version ordering.
//!
//! "Latest version" resolution needs a total order over version strings that
//! is not lexical (`v10` must sort after `v2`). Version strings are normalized
//! to semver:
//!
//! - `v1` -> `1.0.0`
//! - `v1.2` -> `1.2.0`
//! - `v1beta2` -> `1.0.0-beta.2`
//! - `v2alpha` -> `2.0.0-alpha`
//! - `1.4.0-rc.1` -> `1.4.0-rc.1`
//!
//! Semver precedence then gives `v1alpha1 < v1beta1 < v1beta10 < v1 < v2 < v10`.
//! Strings that cannot be normalized sort below every release version and
//! lexically among themselves, so the order stays total.
//!
//! # Examples
//!
//! ```
//! use converge_resources::ApiVersion;
//!
//! assert!(ApiVersion::parse("v2") > ApiVersion::parse("v1beta2"));
//! assert!(ApiVersion::parse("v10") > ApiVersion::parse("v2"));
//! assert!(ApiVersion::parse("v1beta10") > ApiVersion::parse("v1beta2"));
//! assert!(ApiVersion::parse("latest") < ApiVersion::parse("v1alpha1"));
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// A parsed API version string with a total order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    raw: String,
    release: Option<semver::Version>,
}

impl ApiVersion {
    /// Parse a version string. Never fails: unrecognized strings are kept
    /// as-is and order below every release version.
    pub fn parse(value: &str) -> Self {
        let raw = value.trim().to_string();
        let release = normalize_version(&raw).ok();
        Self { raw, release }
    }

    /// Parse a version string, rejecting anything that is not a release version.
    pub fn parse_strict(value: &str) -> Result<Self> {
        let raw = value.trim().to_string();
        let release = normalize_version(&raw).map_err(|reason| Error::InvalidApiVersion {
            value: value.to_string(),
            reason,
        })?;
        Ok(Self {
            raw,
            release: Some(release),
        })
    }

    /// The normalized semver form, when the string is a release version.
    pub fn release(&self) -> Option<&semver::Version> {
        self.release.as_ref()
    }

    /// Whether this is a pre-release (`alpha`, `beta`, `rc`, ...) version.
    pub fn is_prerelease(&self) -> bool {
        self.release.as_ref().is_some_and(|v| !v.pre.is_empty())
    }

    /// Return the original version string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.release, &other.release) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.raw.cmp(&other.raw)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Normalize an API version string to semver.
fn normalize_version(s: &str) -> std::result::Result<semver::Version, String> {
    let body = s
        .strip_prefix('v')
        .or_else(|| s.strip_prefix('V'))
        .unwrap_or(s);

    // Try direct parse first
    if let Ok(v) = semver::Version::parse(body) {
        return Ok(v);
    }

    let head_len = body
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(body.len());
    let (numbers, qualifier) = body.split_at(head_len);
    let numbers = numbers.trim_end_matches('.');
    if numbers.is_empty() {
        return Err(format!("'{s}' does not start with a version number"));
    }

    let parts: Vec<&str> = numbers.split('.').collect();
    if parts.len() > 3 {
        return Err(format!("'{s}' has more than three numeric components"));
    }
    let mut components = [0u64; 3];
    for (slot, part) in components.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid component '{part}' in '{s}': {e}"))?;
    }

    let mut version = semver::Version::new(components[0], components[1], components[2]);

    let qualifier = qualifier.trim_start_matches(['-', '.']);
    if !qualifier.is_empty() {
        let label_len = qualifier
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(qualifier.len());
        let (label, number) = qualifier.split_at(label_len);
        let number = number.trim_start_matches('.');
        if label.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("unrecognized qualifier '{qualifier}' in '{s}'"));
        }

        let label = label.to_ascii_lowercase();
        let pre = if number.is_empty() {
            label
        } else {
            // Strip leading zeros so semver accepts the numeric identifier
            let number = number.trim_start_matches('0');
            let number = if number.is_empty() { "0" } else { number };
            format!("{label}.{number}")
        };
        version.pre = semver::Prerelease::new(&pre)
            .map_err(|e| format!("invalid qualifier '{pre}' in '{s}': {e}"))?;
    }

    Ok(version)
}
