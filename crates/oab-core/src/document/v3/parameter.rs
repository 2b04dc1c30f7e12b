use serde::{Deserialize, Serialize};

use crate::ir::ParamLocation;
use crate::schema::SchemaOrRef;

/// Where a 3.x parameter travels. Form fields have no location of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    /// `None` for form fields, which fold into the request body instead.
    pub fn from_node(location: ParamLocation) -> Option<Self> {
        match location {
            ParamLocation::Path => Some(Self::Path),
            ParamLocation::Query => Some(Self::Query),
            ParamLocation::Header => Some(Self::Header),
            ParamLocation::Cookie => Some(Self::Cookie),
            ParamLocation::Form => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Serialized even when false; path parameters must say `true`.
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Parameter(Parameter),
}
