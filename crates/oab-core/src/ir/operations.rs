use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::constraint::Constraints;
use crate::document::v3::SecurityRequirement;
use crate::schema::SchemaOrRef;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
    /// Safe method with a request body, added in 3.2.
    Query,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Query => "QUERY",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter lives. `Form` fields are relocated per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    Form,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
            ParamLocation::Form => "formData",
        }
    }
}

/// A configured parameter. `schema` already carries overrides; constraints
/// are kept apart so each dialect can place them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterNode {
    pub name: String,
    pub location: ParamLocation,
    pub description: Option<String>,
    pub required: bool,
    pub deprecated: bool,
    pub example: Option<Value>,
    pub schema: SchemaOrRef,
    pub constraints: Constraints,
    /// File upload form field.
    pub file: bool,
}

/// An operation parameter: inline, or a named component.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamEntry {
    Inline(ParameterNode),
    Ref(String),
}

impl ParamEntry {
    /// The parameter this entry stands for, if a reference names a known component.
    pub fn resolve<'a>(
        &'a self,
        components: &'a IndexMap<String, ParameterNode>,
    ) -> Option<&'a ParameterNode> {
        match self {
            ParamEntry::Inline(node) => Some(node),
            ParamEntry::Ref(name) => components.get(name),
        }
    }
}

/// One content-type entry of a body or response.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaNode {
    pub schema: SchemaOrRef,
    pub example: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestBodyNode {
    pub description: Option<String>,
    pub required: bool,
    pub content: IndexMap<String, MediaNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderNode {
    pub description: Option<String>,
    pub schema: SchemaOrRef,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseNode {
    pub description: String,
    pub content: IndexMap<String, MediaNode>,
    pub headers: IndexMap<String, HeaderNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEntry {
    Inline(ResponseNode),
    Ref(String),
}

/// A fully configured operation, dialect independent.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationNode {
    pub method: HttpMethod,
    /// Path template, or the webhook name for webhook operations.
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<ParamEntry>,
    pub request_body: Option<RequestBodyNode>,
    pub responses: IndexMap<String, ResponseEntry>,
    pub security: Option<Vec<SecurityRequirement>>,
    pub deprecated: bool,
}

impl OperationNode {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            request_body: None,
            responses: IndexMap::new(),
            security: None,
            deprecated: false,
        }
    }

    /// `"GET /items/{id}"`, used in issue messages.
    pub fn location(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Form-field parameters, with references looked up in `components`.
    pub fn form_fields<'a>(
        &'a self,
        components: &'a IndexMap<String, ParameterNode>,
    ) -> impl Iterator<Item = &'a ParameterNode> {
        self.parameters
            .iter()
            .filter_map(|entry| entry.resolve(components))
            .filter(|node| node.location == ParamLocation::Form)
    }
}
