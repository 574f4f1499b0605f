//! Identifiers for benchmark variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a server or tester variant, as written in the configuration
/// (`flask_json_lib`, `jest_fetch_get`, ...).
///
/// # Example
/// ```
/// use reqbench_common::VariantName;
///
/// let name = VariantName::from("jest_sync_request_curl_get");
/// assert_eq!(name.display_name(), "Jest sync request curl get");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantName(String);

impl VariantName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human readable form used in reports: underscores become spaces, the
    /// first character is upper-cased and the rest lower-cased.
    pub fn display_name(&self) -> String {
        let spaced = self.0.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        }
    }
}

impl From<&str> for VariantName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VariantName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a variant plays in a pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Long-running process that must be ready before testing starts.
    Server,
    /// Short-lived process whose runtime is measured.
    Tester,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => write!(f, "server"),
            Role::Tester => write!(f, "tester"),
        }
    }
}
