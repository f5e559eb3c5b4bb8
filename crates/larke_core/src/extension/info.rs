//! Extension metadata declaration and validation.
//!
//! # Responsibility
//! - Define the raw metadata map an extension service declares.
//! - Project raw metadata into the fixed [`ExtensionInfo`] view.
//! - Validate that the required metadata fields are present.
//!
//! # Invariants
//! - Projection never fails; missing fields become `None` or empty defaults.
//! - Validation treats `null`, `""`, `"0"`, `0`, `false`, `[]` and `{}` as
//!   empty values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw metadata declared by an extension service.
pub type InfoMap = Map<String, Value>;

pub const INFO_NAME: &str = "name";
pub const INFO_TITLE: &str = "title";
pub const INFO_INTRODUCE: &str = "introduce";
pub const INFO_AUTHOR: &str = "author";
pub const INFO_AUTHOR_SITE: &str = "authorsite";
pub const INFO_AUTHOR_EMAIL: &str = "authoremail";
pub const INFO_VERSION: &str = "version";
pub const INFO_ADAPTATION: &str = "adaptation";
pub const INFO_REQUIRE_EXTENSION: &str = "require_extension";
pub const INFO_CONFIG: &str = "config";

const REQUIRED_INFO_FIELDS: &[&str] = &[
    INFO_NAME,
    INFO_TITLE,
    INFO_INTRODUCE,
    INFO_AUTHOR,
    INFO_VERSION,
    INFO_ADAPTATION,
];

/// Returns metadata keys that must be present and non-empty.
pub fn required_info_fields() -> &'static [&'static str] {
    REQUIRED_INFO_FIELDS
}

/// Read-only view of one registered extension's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    pub name: Option<String>,
    pub title: Option<String>,
    pub introduce: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "authorsite")]
    pub author_site: Option<String>,
    #[serde(rename = "authoremail")]
    pub author_email: Option<String>,
    pub version: Option<String>,
    pub adaptation: Option<String>,
    #[serde(rename = "require_extension")]
    pub required_extensions: Vec<String>,
    pub config: InfoMap,
    /// Implementation identifier the extension is registered under.
    pub class_name: Option<String>,
}

impl ExtensionInfo {
    /// Projects raw metadata into the fixed field set.
    pub fn from_map(info: &InfoMap, class_name: Option<&str>) -> Self {
        let required_extensions = match info.get(INFO_REQUIRE_EXTENSION) {
            Some(Value::Array(items)) => items.iter().filter_map(value_as_string).collect(),
            Some(Value::String(single)) if !single.is_empty() => vec![single.clone()],
            _ => Vec::new(),
        };
        let config = match info.get(INFO_CONFIG) {
            Some(Value::Object(map)) => map.clone(),
            _ => InfoMap::new(),
        };

        Self {
            name: string_field(info, INFO_NAME),
            title: string_field(info, INFO_TITLE),
            introduce: string_field(info, INFO_INTRODUCE),
            author: string_field(info, INFO_AUTHOR),
            author_site: string_field(info, INFO_AUTHOR_SITE),
            author_email: string_field(info, INFO_AUTHOR_EMAIL),
            version: string_field(info, INFO_VERSION),
            adaptation: string_field(info, INFO_ADAPTATION),
            required_extensions,
            config,
            class_name: class_name.map(str::to_string),
        }
    }
}

fn string_field(info: &InfoMap, key: &str) -> Option<String> {
    info.get(key).and_then(value_as_string)
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Returns whether a metadata value counts as empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Checks required metadata fields, naming the first one missing.
pub fn check_info(info: &InfoMap) -> Result<(), InfoValidationError> {
    if info.is_empty() {
        return Err(InfoValidationError::EmptyInfo);
    }
    for field in REQUIRED_INFO_FIELDS {
        match info.get(*field) {
            Some(value) if !is_empty_value(value) => {}
            _ => return Err(InfoValidationError::MissingField(*field)),
        }
    }
    Ok(())
}

/// Returns whether all required metadata fields are present and non-empty.
pub fn validate_info(info: &InfoMap) -> bool {
    check_info(info).is_ok()
}

/// Metadata validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValidationError {
    EmptyInfo,
    MissingField(&'static str),
}

impl Display for InfoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInfo => write!(f, "extension info must not be empty"),
            Self::MissingField(field) => {
                write!(f, "extension info missing required field: {field}")
            }
        }
    }
}

impl Error for InfoValidationError {}

#[cfg(test)]
mod tests {
    use super::{
        check_info, is_empty_value, required_info_fields, validate_info, ExtensionInfo, InfoMap,
        InfoValidationError,
    };
    use serde_json::{json, Value};

    fn valid_info() -> InfoMap {
        match json!({
            "name": "x",
            "title": "t",
            "introduce": "i",
            "author": "a",
            "version": "1",
            "adaptation": "1",
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn empty_info_is_invalid() {
        assert!(!validate_info(&InfoMap::new()));
        assert_eq!(
            check_info(&InfoMap::new()).unwrap_err(),
            InfoValidationError::EmptyInfo
        );
    }

    #[test]
    fn complete_info_is_valid() {
        assert!(validate_info(&valid_info()));
    }

    #[test]
    fn omitting_any_required_field_flips_to_invalid() {
        for field in required_info_fields() {
            let mut info = valid_info();
            info.remove(*field);
            assert_eq!(
                check_info(&info).unwrap_err(),
                InfoValidationError::MissingField(*field),
                "field {field}"
            );
        }
    }

    #[test]
    fn empty_like_values_count_as_missing() {
        for empty in [json!(null), json!(""), json!("0"), json!(0), json!(false), json!([])] {
            assert!(is_empty_value(&empty), "{empty}");
            let mut info = valid_info();
            info.insert("title".to_string(), empty);
            assert!(!validate_info(&info));
        }
        assert!(!is_empty_value(&json!("false")));
    }

    #[test]
    fn projection_defaults_optional_fields() {
        let mut info = valid_info();
        info.insert("version".to_string(), json!(2));
        let projected = ExtensionInfo::from_map(&info, Some("demo.service"));

        assert_eq!(projected.name.as_deref(), Some("x"));
        assert_eq!(projected.version.as_deref(), Some("2"));
        assert!(projected.author_site.is_none());
        assert!(projected.required_extensions.is_empty());
        assert!(projected.config.is_empty());
        assert_eq!(projected.class_name.as_deref(), Some("demo.service"));
    }

    #[test]
    fn projection_serializes_with_metadata_keys() {
        let mut info = valid_info();
        info.insert("authorsite".to_string(), json!("https://example.com"));
        info.insert("require_extension".to_string(), json!(["base"]));
        let value = serde_json::to_value(ExtensionInfo::from_map(&info, None)).unwrap();
        assert_eq!(value["authorsite"], "https://example.com");
        assert_eq!(value["require_extension"], json!(["base"]));
    }
}
