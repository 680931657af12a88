//! Database models for client inventory storage.
//!
//! These models represent the structure of data in the database tables.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A monitored client host.
#[derive(Clone, Serialize)]
pub struct ClientRow {
    pub id: i64,
    pub title: String,
    pub domain: String,
    #[serde(skip)]
    pub secret: String,
    pub tstamp: Option<DateTime<Utc>>,
    pub last_successful_import: Option<DateTime<Utc>>,
    pub error_message: String,
    pub php_version: String,
    pub mysql_version: String,
    /// Current core version row.
    pub core: Option<i64>,
    /// Number of extensions in the last successful report.
    pub extensions: i64,
    /// Number of backend users in the last successful report.
    pub backend_users: i64,
    pub extra_info: String,
    pub extra_warning: String,
    pub extra_danger: String,
}

impl fmt::Debug for ClientRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRow")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("domain", &self.domain)
            .field("secret", &"<redacted>")
            .field("last_successful_import", &self.last_successful_import)
            .field("error_message", &self.error_message)
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

/// DTO for registering a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub title: String,
    pub domain: String,
    pub secret: String,
    pub hidden: bool,
}

/// Fields written to a client row after a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientUpdate {
    pub php_version: String,
    pub mysql_version: String,
    pub core: i64,
    pub extensions: i64,
    pub backend_users: i64,
    pub extra_info: String,
    pub extra_warning: String,
    pub extra_danger: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreVersionRow {
    pub id: i64,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct NewCoreVersion {
    pub version: String,
    pub version_integer: i64,
    pub is_official: bool,
    pub insecure: bool,
}

/// Identity of an extension row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionKey {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRow {
    pub id: i64,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct NewExtension {
    pub name: String,
    pub version: String,
    pub version_integer: i64,
    pub title: String,
    pub description: String,
    pub state: ExtensionState,
    pub is_official: bool,
}

/// Extension lifecycle state, stored as its integer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i64)]
pub enum ExtensionState {
    Alpha = 0,
    Beta = 1,
    Stable = 2,
    Experimental = 3,
    Test = 4,
    Obsolete = 5,
    ExcludeFromUpdates = 6,
    Unknown = 7,
}

impl ExtensionState {
    pub const ALL: [ExtensionState; 8] = [
        ExtensionState::Alpha,
        ExtensionState::Beta,
        ExtensionState::Stable,
        ExtensionState::Experimental,
        ExtensionState::Test,
        ExtensionState::Obsolete,
        ExtensionState::ExcludeFromUpdates,
        ExtensionState::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExtensionState::Alpha => "alpha",
            ExtensionState::Beta => "beta",
            ExtensionState::Stable => "stable",
            ExtensionState::Experimental => "experimental",
            ExtensionState::Test => "test",
            ExtensionState::Obsolete => "obsolete",
            ExtensionState::ExcludeFromUpdates => "excludeFromUpdates",
            ExtensionState::Unknown => "n/a",
        }
    }

    /// Resolve a reported label; anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|state| state.label() == label)
            .unwrap_or(ExtensionState::Unknown)
    }

    pub fn as_i64(&self) -> i64 {
        *self as i64
    }

    pub fn from_i64(value: i64) -> Self {
        Self::ALL
            .into_iter()
            .find(|state| state.as_i64() == value)
            .unwrap_or(ExtensionState::Unknown)
    }
}

/// Per-client snapshot stored on a client↔extension association.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientExtensionLink {
    pub extension_id: i64,
    pub title: String,
    pub state: ExtensionState,
    pub is_loaded: bool,
}

/// A client↔extension association joined with its extension row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientExtensionRecord {
    pub extension_id: i64,
    pub name: String,
    pub version: String,
    pub title: String,
    pub state: ExtensionState,
    pub is_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendUserRow {
    pub id: i64,
    pub user_name: String,
    pub real_name: String,
    pub email_address: String,
    pub description: String,
    pub last_login: String,
}

/// Profile fields of a backend user as reported by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendUserProfile {
    pub user_name: String,
    pub real_name: String,
    pub email_address: String,
    pub description: String,
    pub last_login: String,
}
