use std::fmt::Display;

use indexmap::IndexMap;
use log::warn;
use serde_json::Value;

use crate::constraint::{Constraints, apply_overrides};
use crate::describe::{Describe, DescribeFn};
use crate::document::OpenApiVersion;
use crate::error::Issue;
use crate::ir::{
    HeaderNode, MediaNode, OperationNode, ParamEntry, ParamLocation, ParameterNode,
    RequestBodyNode, ResponseEntry, ResponseNode,
};
use crate::reflect::Reflector;
use crate::schema::{Schema, SchemaOrRef, SchemaType};

use super::profile::TargetProfile;

pub const JSON: &str = "application/json";

/// A parameter declaration, resolved against the builder's reflector when it
/// is attached to an operation or registered as a component.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    location: ParamLocation,
    ty: DescribeFn,
    description: Option<String>,
    required: Option<bool>,
    deprecated: bool,
    example: Option<Value>,
    annotation: Option<String>,
    constraints: Option<Constraints>,
    type_override: Option<String>,
    format_override: Option<String>,
    schema_override: Option<SchemaOrRef>,
    file: bool,
}

impl Param {
    fn of<T: Describe>(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            location,
            ty: T::describe,
            description: None,
            required: None,
            deprecated: false,
            example: None,
            annotation: None,
            constraints: None,
            type_override: None,
            format_override: None,
            schema_override: None,
            file: false,
        }
    }

    /// Path parameters are always required.
    pub fn path<T: Describe>(name: impl Into<String>) -> Self {
        Self::of::<T>(name, ParamLocation::Path)
    }

    pub fn query<T: Describe>(name: impl Into<String>) -> Self {
        Self::of::<T>(name, ParamLocation::Query)
    }

    pub fn header<T: Describe>(name: impl Into<String>) -> Self {
        Self::of::<T>(name, ParamLocation::Header)
    }

    pub fn cookie<T: Describe>(name: impl Into<String>) -> Self {
        Self::of::<T>(name, ParamLocation::Cookie)
    }

    /// A form field: `formData` in 2.0, a form-encoded request body in 3.x.
    pub fn form<T: Describe>(name: impl Into<String>) -> Self {
        Self::of::<T>(name, ParamLocation::Form)
    }

    /// A file upload form field.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            file: true,
            ..Self::of::<Vec<u8>>(name, ParamLocation::Form)
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Constraint annotation, e.g. `"minimum=1,maximum=100"`.
    pub fn constraints(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn type_override(mut self, ty: impl Into<String>) -> Self {
        self.type_override = Some(ty.into());
        self
    }

    pub fn format_override(mut self, format: impl Into<String>) -> Self {
        self.format_override = Some(format.into());
        self
    }

    pub fn schema_override(mut self, schema: impl Into<SchemaOrRef>) -> Self {
        self.schema_override = Some(schema.into());
        self
    }

    pub fn location(&self) -> ParamLocation {
        self.location
    }

    pub(crate) fn resolve(
        self,
        reflector: &mut Reflector,
        issues: &mut Vec<Issue>,
        context: &str,
    ) -> ParameterNode {
        let inferred = if self.file {
            SchemaOrRef::inline(Schema::formatted(SchemaType::String, "binary"))
        } else {
            reflect(reflector, issues, self.ty)
        };

        let mut constraints = match (self.constraints, self.annotation.as_deref()) {
            (Some(c), _) => c,
            (None, Some(annotation)) => Constraints::parse(annotation),
            (None, None) => Constraints::default(),
        };
        let errors = constraints.validate();
        if !errors.is_empty() {
            issues.push(Issue::Constraint {
                location: format!("parameter \"{}\" of {context}", self.name),
                errors,
            });
        }

        let type_override = self.type_override.or_else(|| constraints.type_override.take());
        let format_override = self.format_override.or_else(|| constraints.format.take());
        let schema = apply_overrides(
            &inferred,
            type_override.as_deref(),
            format_override.as_deref(),
            self.schema_override.as_ref(),
        );

        let required = match self.location {
            ParamLocation::Path => true,
            _ => self.required.or(constraints.required).unwrap_or(false),
        };
        let deprecated = self.deprecated || constraints.deprecated == Some(true);

        ParameterNode {
            name: self.name,
            location: self.location,
            description: self.description.or_else(|| constraints.description.take()),
            required,
            deprecated,
            example: self.example,
            schema,
            constraints,
            file: self.file,
        }
    }
}

#[derive(Debug, Clone)]
struct ContentDecl {
    content_type: String,
    ty: DescribeFn,
    example: Option<Value>,
}

fn resolve_content(
    decls: Vec<ContentDecl>,
    reflector: &mut Reflector,
    issues: &mut Vec<Issue>,
) -> IndexMap<String, MediaNode> {
    decls
        .into_iter()
        .map(|decl| {
            let schema = reflect(reflector, issues, decl.ty);
            (
                decl.content_type,
                MediaNode {
                    schema,
                    example: decl.example,
                },
            )
        })
        .collect()
}

/// A request body declaration.
#[derive(Debug, Clone)]
pub struct Body {
    description: Option<String>,
    required: bool,
    content: Vec<ContentDecl>,
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl Body {
    pub fn new() -> Self {
        Self {
            description: None,
            required: true,
            content: Vec::new(),
        }
    }

    pub fn json<T: Describe>() -> Self {
        Self::new().content::<T>(JSON)
    }

    pub fn content<T: Describe>(mut self, content_type: impl Into<String>) -> Self {
        self.content.push(ContentDecl {
            content_type: content_type.into(),
            ty: T::describe,
            example: None,
        });
        self
    }

    /// Example for the most recently added content type.
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        if let Some(last) = self.content.last_mut() {
            last.example = Some(example.into());
        }
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn resolve(self, reflector: &mut Reflector, issues: &mut Vec<Issue>) -> RequestBodyNode {
        RequestBodyNode {
            description: self.description,
            required: self.required,
            content: resolve_content(self.content, reflector, issues),
        }
    }
}

#[derive(Debug, Clone)]
struct HeaderDecl {
    name: String,
    ty: DescribeFn,
    description: Option<String>,
}

/// A response declaration.
#[derive(Debug, Clone)]
pub struct Reply {
    description: String,
    content: Vec<ContentDecl>,
    headers: Vec<HeaderDecl>,
}

impl Reply {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            content: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// A response without a payload.
    pub fn empty(description: impl Into<String>) -> Self {
        Self::new(description)
    }

    pub fn json<T: Describe>(description: impl Into<String>) -> Self {
        Self::new(description).content::<T>(JSON)
    }

    pub fn content<T: Describe>(mut self, content_type: impl Into<String>) -> Self {
        self.content.push(ContentDecl {
            content_type: content_type.into(),
            ty: T::describe,
            example: None,
        });
        self
    }

    /// Example for the most recently added content type.
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        if let Some(last) = self.content.last_mut() {
            last.example = Some(example.into());
        }
        self
    }

    pub fn header<T: Describe>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.headers.push(HeaderDecl {
            name: name.into(),
            ty: T::describe,
            description: Some(description.into()),
        });
        self
    }

    pub(crate) fn resolve(self, reflector: &mut Reflector, issues: &mut Vec<Issue>) -> ResponseNode {
        let headers = self
            .headers
            .into_iter()
            .map(|h| {
                let schema = reflect(reflector, issues, h.ty);
                (
                    h.name,
                    HeaderNode {
                        description: h.description,
                        schema,
                    },
                )
            })
            .collect();
        ResponseNode {
            description: self.description,
            content: resolve_content(self.content, reflector, issues),
            headers,
        }
    }
}

/// Generate a schema and move any recorded issues into `issues`.
pub(crate) fn reflect(
    reflector: &mut Reflector,
    issues: &mut Vec<Issue>,
    ty: DescribeFn,
) -> SchemaOrRef {
    let node = reflector.generate_desc(&ty(), None);
    issues.extend(reflector.take_issues());
    node
}

/// Configures one operation. Every method records problems instead of
/// failing, so calls can always be chained.
pub struct OperationBuilder<'a> {
    pub(crate) node: OperationNode,
    reflector: &'a mut Reflector,
    issues: &'a mut Vec<Issue>,
    version: OpenApiVersion,
}

impl<'a> OperationBuilder<'a> {
    pub(crate) fn new(
        node: OperationNode,
        reflector: &'a mut Reflector,
        issues: &'a mut Vec<Issue>,
        version: OpenApiVersion,
    ) -> Self {
        Self {
            node,
            reflector,
            issues,
            version,
        }
    }

    pub fn id(&mut self, operation_id: impl Into<String>) -> &mut Self {
        self.node.operation_id = Some(operation_id.into());
        self
    }

    pub fn summary(&mut self, summary: impl Into<String>) -> &mut Self {
        self.node.summary = Some(summary.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.node.description = Some(description.into());
        self
    }

    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.node.tags.push(tag.into());
        self
    }

    pub fn deprecated(&mut self) -> &mut Self {
        self.node.deprecated = true;
        self
    }

    /// Require `scheme` with `scopes`. Repeated calls add alternatives.
    pub fn security(&mut self, scheme: impl Into<String>, scopes: &[&str]) -> &mut Self {
        let requirement = IndexMap::from([(
            scheme.into(),
            scopes.iter().map(|s| (*s).to_string()).collect(),
        )]);
        self.node.security.get_or_insert_with(Vec::new).push(requirement);
        self
    }

    /// Mark the operation as public, overriding document-level security.
    pub fn no_security(&mut self) -> &mut Self {
        self.node.security = Some(Vec::new());
        self
    }

    pub fn param(&mut self, param: Param) -> &mut Self {
        let location = self.node.location();
        if !TargetProfile::for_version(self.version).supports_location(param.location()) {
            self.issues.push(Issue::UnsupportedLocation {
                param_in: param.location().as_str().to_string(),
                version: self.version.to_string(),
                location: location.clone(),
            });
        }
        let resolved = param.resolve(self.reflector, self.issues, &location);
        let duplicate = self.node.parameters.iter().position(|p| match p {
            ParamEntry::Inline(existing) => {
                existing.name == resolved.name && existing.location == resolved.location
            }
            ParamEntry::Ref(_) => false,
        });
        match duplicate {
            Some(index) => {
                warn!(
                    "parameter {} declared twice on {location}, keeping the last",
                    resolved.name
                );
                self.node.parameters[index] = ParamEntry::Inline(resolved);
            }
            None => self.node.parameters.push(ParamEntry::Inline(resolved)),
        }
        self
    }

    /// Reference a parameter registered with
    /// [`DocumentBuilder::component_parameter`](super::DocumentBuilder::component_parameter).
    pub fn param_ref(&mut self, name: impl Into<String>) -> &mut Self {
        self.node.parameters.push(ParamEntry::Ref(name.into()));
        self
    }

    pub fn body(&mut self, body: Body) -> &mut Self {
        let resolved = body.resolve(self.reflector, self.issues);
        self.node.request_body = Some(resolved);
        self
    }

    pub fn json_body<T: Describe>(&mut self) -> &mut Self {
        self.body(Body::json::<T>())
    }

    /// Add a response under a status code (`200`) or `"default"`.
    pub fn response(&mut self, status: impl Display, reply: Reply) -> &mut Self {
        let resolved = reply.resolve(self.reflector, self.issues);
        self.node
            .responses
            .insert(status.to_string(), ResponseEntry::Inline(resolved));
        self
    }

    pub fn json_response<T: Describe>(
        &mut self,
        status: impl Display,
        description: impl Into<String>,
    ) -> &mut Self {
        self.response(status, Reply::json::<T>(description))
    }

    /// Reference a response registered with
    /// [`DocumentBuilder::component_response`](super::DocumentBuilder::component_response).
    pub fn response_ref(&mut self, status: impl Display, name: impl Into<String>) -> &mut Self {
        self.node
            .responses
            .insert(status.to_string(), ResponseEntry::Ref(name.into()));
        self
    }
}
