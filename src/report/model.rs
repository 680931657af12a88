//! Report model.
//!
//! Mirrors the JSON document served by a client:
//!
//! ```text
//! { core: { phpVersion, mysqlClientVersion, typo3Version },
//!   extensions: { <name>: { version, title, description, state, isLoaded } },
//!   users: { backend: [ { userName, realName, emailAddress, description, lastLogin } ] },
//!   extra?: { info?, warning?, danger? } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::values::{lenient_bool, lenient_string, list_or_map, map_or_empty_list};

#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    pub core: CoreInfo,
    /// Extension name -> detail. A name occurs at most once.
    #[serde(deserialize_with = "map_or_empty_list")]
    pub extensions: BTreeMap<String, ExtensionDetail>,
    pub users: UserLists,
    #[serde(default, deserialize_with = "extra_buckets")]
    pub extra: ExtraBuckets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreInfo {
    #[serde(rename = "phpVersion", default, deserialize_with = "lenient_string")]
    pub php_version: String,
    #[serde(
        rename = "mysqlClientVersion",
        default,
        deserialize_with = "lenient_string"
    )]
    pub mysql_client_version: String,
    #[serde(rename = "typo3Version", deserialize_with = "lenient_string")]
    pub typo3_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionDetail {
    #[serde(deserialize_with = "lenient_string")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Lifecycle label as reported (`stable`, `beta`, ...).
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(rename = "isLoaded", default, deserialize_with = "lenient_bool")]
    pub is_loaded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLists {
    #[serde(deserialize_with = "list_or_map")]
    pub backend: Vec<BackendUserDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendUserDetail {
    #[serde(rename = "userName", deserialize_with = "lenient_string")]
    pub user_name: String,
    #[serde(rename = "realName", default, deserialize_with = "lenient_string")]
    pub real_name: String,
    #[serde(rename = "emailAddress", default, deserialize_with = "lenient_string")]
    pub email_address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(rename = "lastLogin", default, deserialize_with = "lenient_string")]
    pub last_login: String,
}

/// Which diagnostic bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Info,
    Warning,
    Danger,
}

/// Free-form diagnostic messages, kept opaque.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraBuckets {
    pub info: Option<Value>,
    pub warning: Option<Value>,
    pub danger: Option<Value>,
}

impl ExtraBuckets {
    pub fn get(&self, bucket: Bucket) -> Option<&Value> {
        match bucket {
            Bucket::Info => self.info.as_ref(),
            Bucket::Warning => self.warning.as_ref(),
            Bucket::Danger => self.danger.as_ref(),
        }
    }

    /// Compact JSON of a bucket for storage, or `""` when the bucket is
    /// absent or not a list/object.
    pub fn stored_form(&self, bucket: Bucket) -> String {
        match self.get(bucket) {
            Some(value) if value.is_array() || value.is_object() => value.to_string(),
            _ => String::new(),
        }
    }
}

fn extra_buckets<'de, D>(deserializer: D) -> Result<ExtraBuckets, D::Error>
where
    D: Deserializer<'de>,
{
    let mut buckets = ExtraBuckets::default();
    if let Value::Object(mut map) = Value::deserialize(deserializer)? {
        buckets.info = map.remove("info");
        buckets.warning = map.remove("warning");
        buckets.danger = map.remove("danger");
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_stored_form() {
        let buckets = ExtraBuckets {
            info: Some(json!({"installTool": "enabled"})),
            warning: Some(json!("just a string")),
            danger: None,
        };

        assert_eq!(
            buckets.stored_form(Bucket::Info),
            r#"{"installTool":"enabled"}"#
        );
        assert_eq!(buckets.stored_form(Bucket::Warning), "");
        assert_eq!(buckets.stored_form(Bucket::Danger), "");
    }

    #[test]
    fn test_extra_as_empty_list() {
        let report: Report = serde_json::from_value(json!({
            "core": {"typo3Version": "8.7.1"},
            "extensions": [],
            "users": {"backend": []},
            "extra": []
        }))
        .unwrap();

        assert_eq!(report.extra, ExtraBuckets::default());
        assert!(report.extensions.is_empty());
        assert_eq!(report.core.php_version, "");
    }
}
