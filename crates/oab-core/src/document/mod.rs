//! Emitted document models for both target dialects.
//!
//! These are plain serde data structures with no ties to the builder's
//! internal cache, so external encoders can serialize them directly.

pub mod info;
pub mod v2;
pub mod v3;

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub use info::{Contact, ExternalDocs, Info, License, Tag};

/// Target OpenAPI version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum OpenApiVersion {
    #[serde(rename = "2.0")]
    V2_0,
    #[serde(rename = "3.0.3")]
    V3_0,
    #[default]
    #[serde(rename = "3.1.0")]
    V3_1,
    #[serde(rename = "3.2.0")]
    V3_2,
}

impl OpenApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenApiVersion::V2_0 => "2.0",
            OpenApiVersion::V3_0 => "3.0.3",
            OpenApiVersion::V3_1 => "3.1.0",
            OpenApiVersion::V3_2 => "3.2.0",
        }
    }

    /// Parse a version string; minor-only forms such as `"3.1"` are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "2" | "2.0" => Some(OpenApiVersion::V2_0),
            "3" | "3.0" | "3.0.0" | "3.0.1" | "3.0.2" | "3.0.3" | "3.0.4" => {
                Some(OpenApiVersion::V3_0)
            }
            "3.1" | "3.1.0" | "3.1.1" => Some(OpenApiVersion::V3_1),
            "3.2" | "3.2.0" => Some(OpenApiVersion::V3_2),
            _ => None,
        }
    }

    pub fn is_v2(&self) -> bool {
        matches!(self, OpenApiVersion::V2_0)
    }

    pub fn supports_webhooks(&self) -> bool {
        *self >= OpenApiVersion::V3_1
    }

    /// 3.1 aligned with JSON Schema 2020-12: `null` joins the type set and
    /// exclusive bounds become numbers.
    pub fn uses_json_schema_2020(&self) -> bool {
        *self >= OpenApiVersion::V3_1
    }
}

/// Accepts `"3.1.0"`, `"3.1"` and bare YAML numbers such as `2.0`.
impl<'de> Deserialize<'de> for OpenApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => format!("{n:?}"),
        };
        Self::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("unsupported OpenAPI version \"{text}\"")))
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished document in one of the two dialects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    V2(Box<v2::Swagger>),
    V3(Box<v3::OpenApiSpec>),
}

impl Document {
    pub fn version(&self) -> &str {
        match self {
            Document::V2(doc) => &doc.swagger,
            Document::V3(doc) => &doc.openapi,
        }
    }

    pub fn as_v2(&self) -> Option<&v2::Swagger> {
        match self {
            Document::V2(doc) => Some(doc),
            Document::V3(_) => None,
        }
    }

    pub fn as_v3(&self) -> Option<&v3::OpenApiSpec> {
        match self {
            Document::V3(doc) => Some(doc),
            Document::V2(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        assert_eq!(OpenApiVersion::parse("2.0"), Some(OpenApiVersion::V2_0));
        assert_eq!(OpenApiVersion::parse("3.0"), Some(OpenApiVersion::V3_0));
        assert_eq!(OpenApiVersion::parse("3.1.0"), Some(OpenApiVersion::V3_1));
        assert_eq!(OpenApiVersion::parse(" 3.2 "), Some(OpenApiVersion::V3_2));
        assert_eq!(OpenApiVersion::parse("4.0"), None);
    }

    #[test]
    fn test_version_capabilities() {
        assert!(OpenApiVersion::V2_0.is_v2());
        assert!(!OpenApiVersion::V3_0.supports_webhooks());
        assert!(OpenApiVersion::V3_1.supports_webhooks());
        assert!(OpenApiVersion::V3_2.uses_json_schema_2020());
    }

    #[test]
    fn test_version_serde_strings() {
        let v: OpenApiVersion = serde_yaml_ng::from_str("\"3.0.3\"").unwrap();
        assert_eq!(v, OpenApiVersion::V3_0);
        assert_eq!(serde_json::to_string(&OpenApiVersion::V2_0).unwrap(), "\"2.0\"");
    }

    #[test]
    fn test_version_from_yaml_number() {
        let v: OpenApiVersion = serde_yaml_ng::from_str("2.0").unwrap();
        assert_eq!(v, OpenApiVersion::V2_0);
        let v: OpenApiVersion = serde_yaml_ng::from_str("3.1").unwrap();
        assert_eq!(v, OpenApiVersion::V3_1);
        assert!(serde_yaml_ng::from_str::<OpenApiVersion>("\"9.9\"").is_err());
    }
}
