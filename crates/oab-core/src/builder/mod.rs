//! The document assembler.
//!
//! A [`DocumentBuilder`] accumulates operations, components and document
//! metadata through chained calls that never fail. Problems are recorded as
//! [`Issue`]s and reported together by [`DocumentBuilder::build`], which is
//! the only step that can fail.

mod emit_v2;
mod emit_v3;
pub mod operation;
pub mod profile;
pub mod route;

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::config::{NamingStrategy, OabConfig};
use crate::describe::{Describe, TypeDesc};
use crate::document::v3::{SecurityRequirement, Server};
use crate::document::{Document, ExternalDocs, Info, License, OpenApiVersion, Tag};
use crate::error::{BuildError, Issue};
use crate::ir::{
    HttpMethod, OperationNode, ParamEntry, ParameterNode, ResponseEntry, ResponseNode,
    SecuritySchemeNode,
};
use crate::operation_id::derive_operation_id;
use crate::reflect::Reflector;
use crate::reflect::naming::schema_name;
use crate::schema::SchemaOrRef;

pub use operation::{Body, JSON, OperationBuilder, Param, Reply};
pub use profile::{ConstraintPlacement, NullableStyle, PayloadPlacement, TargetProfile};
pub use route::{Handler, Route, RouteBinder};

type MethodMap = IndexMap<HttpMethod, OperationNode>;

/// Accumulates a document's configuration and emits it in either dialect.
///
/// Not synchronized: one builder belongs to one thread of configuration.
/// Independent builders share nothing.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    version: OpenApiVersion,
    info: Info,
    servers: Vec<Server>,
    tags: Vec<Tag>,
    external_docs: Option<ExternalDocs>,
    security: Option<Vec<SecurityRequirement>>,
    reflector: Reflector,
    paths: IndexMap<String, MethodMap>,
    webhooks: IndexMap<String, MethodMap>,
    schemas: IndexMap<String, SchemaOrRef>,
    parameters: IndexMap<String, ParameterNode>,
    responses: IndexMap<String, ResponseNode>,
    security_schemes: IndexMap<String, SecuritySchemeNode>,
    /// operation id → location where it was first declared
    operation_ids: HashMap<String, String>,
    derive_operation_ids: bool,
    issues: Vec<Issue>,
}

macro_rules! method_shorthand {
    ($($name:ident => $method:expr),* $(,)?) => {
        $(
            pub fn $name<F>(&mut self, path: &str, configure: F) -> &mut Self
            where
                F: FnOnce(&mut OperationBuilder<'_>),
            {
                self.operation($method, path, configure)
            }
        )*
    };
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_naming(strategy: NamingStrategy) -> Self {
        Self {
            reflector: Reflector::new(strategy),
            ..Self::default()
        }
    }

    /// Seed version, info, servers and naming options from a config file.
    pub fn from_config(config: &OabConfig) -> Self {
        let mut builder = Self::with_naming(config.naming.strategy);
        builder.version = config.openapi;
        builder.info.title = config.info.title.clone();
        builder.info.version = config.info.version.clone();
        builder.info.description = config.info.description.clone();
        builder.servers = config
            .servers
            .iter()
            .map(|s| {
                let server = Server {
                    description: s.description.clone(),
                    ..Server::new(s.url.clone())
                };
                s.variables
                    .iter()
                    .fold(server, |server, (name, default)| server.variable(name, default, &[]))
            })
            .collect();
        builder.derive_operation_ids = config.naming.derive_operation_ids;
        builder
    }

    /// Set the active target version used by [`build`](Self::build) and for
    /// method/location checks at configuration time.
    pub fn openapi(&mut self, version: OpenApiVersion) -> &mut Self {
        self.version = version;
        self
    }

    pub fn active_version(&self) -> OpenApiVersion {
        self.version
    }

    pub fn info(&mut self, info: Info) -> &mut Self {
        self.info = info;
        self
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.info.title = title.into();
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.info.description = Some(description.into());
        self
    }

    /// Version of the described API, not of the document format.
    pub fn info_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.info.version = version.into();
        self
    }

    pub fn license(&mut self, name: impl Into<String>, url: Option<&str>) -> &mut Self {
        self.info.license = Some(License {
            name: name.into(),
            url: url.map(str::to_string),
        });
        self
    }

    pub fn server(&mut self, url: impl Into<String>) -> &mut Self {
        self.servers.push(Server::new(url));
        self
    }

    pub fn server_with(&mut self, server: Server) -> &mut Self {
        self.servers.push(server);
        self
    }

    pub fn tag(&mut self, name: impl Into<String>, description: Option<&str>) -> &mut Self {
        self.tags.push(Tag {
            name: name.into(),
            description: description.map(str::to_string),
            external_docs: None,
        });
        self
    }

    pub fn external_docs(&mut self, url: impl Into<String>, description: Option<&str>) -> &mut Self {
        self.external_docs = Some(ExternalDocs {
            url: url.into(),
            description: description.map(str::to_string),
        });
        self
    }

    /// Derive missing operation ids from method and path.
    pub fn derive_operation_ids(&mut self, enabled: bool) -> &mut Self {
        self.derive_operation_ids = enabled;
        self
    }

    /// Document-wide security requirement. Repeated calls add alternatives.
    pub fn security(&mut self, scheme: impl Into<String>, scopes: &[&str]) -> &mut Self {
        let requirement = IndexMap::from([(
            scheme.into(),
            scopes.iter().map(|s| (*s).to_string()).collect(),
        )]);
        self.security.get_or_insert_with(Vec::new).push(requirement);
        self
    }

    pub fn security_scheme(&mut self, name: impl Into<String>, scheme: SecuritySchemeNode) -> &mut Self {
        self.security_schemes.insert(name.into(), scheme);
        self
    }

    /// Schema node for `T`, registering named records as components.
    pub fn schema<T: Describe>(&mut self) -> SchemaOrRef {
        self.reflect(&T::describe(), None)
    }

    /// Register `T` as a named component schema.
    pub fn component_schema<T: Describe>(&mut self) -> &mut Self {
        self.register_schema(T::describe(), None)
    }

    /// Register `T` under an explicit component name.
    pub fn component_schema_named<T: Describe>(&mut self, name: &str) -> &mut Self {
        self.register_schema(T::describe(), Some(name))
    }

    fn register_schema(&mut self, desc: TypeDesc, name: Option<&str>) -> &mut Self {
        let node = self.reflect(&desc, name);
        match (node.ref_name(), name) {
            (Some(registered), Some(wanted)) if registered == wanted => {}
            (Some(_), None) => {}
            (_, Some(wanted)) => {
                self.schemas.insert(wanted.to_string(), node);
            }
            (None, None) => {
                let derived = schema_name(&desc.key, self.reflector.strategy());
                self.schemas.insert(derived, node);
            }
        }
        self
    }

    pub fn component_parameter(&mut self, name: impl Into<String>, param: Param) -> &mut Self {
        let name = name.into();
        let context = format!("component parameter {name}");
        let profile = TargetProfile::for_version(self.version);
        if !profile.supports_location(param.location()) {
            self.issues.push(Issue::UnsupportedLocation {
                param_in: param.location().as_str().to_string(),
                version: self.version.to_string(),
                location: context.clone(),
            });
        }
        let node = param.resolve(&mut self.reflector, &mut self.issues, &context);
        self.parameters.insert(name, node);
        self
    }

    pub fn component_response(&mut self, name: impl Into<String>, reply: Reply) -> &mut Self {
        let node = reply.resolve(&mut self.reflector, &mut self.issues);
        self.responses.insert(name.into(), node);
        self
    }

    /// Add an operation at `path`. Methods the active version cannot express
    /// are recorded as issues and the operation is not stored.
    pub fn operation<F>(&mut self, method: HttpMethod, path: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut OperationBuilder<'_>),
    {
        let node = OperationNode::new(method, path);
        let location = node.location();
        if !self.method_supported(method, &location) {
            return self;
        }

        let node = self.configure_node(node, configure);
        self.claim_operation_id(node.operation_id.as_deref(), &location);
        if self
            .paths
            .entry(path.to_string())
            .or_default()
            .insert(method, node)
            .is_some()
        {
            warn!("{location} declared twice, keeping the last");
        }
        self
    }

    method_shorthand! {
        get => HttpMethod::Get,
        put => HttpMethod::Put,
        post => HttpMethod::Post,
        delete => HttpMethod::Delete,
        patch => HttpMethod::Patch,
        options => HttpMethod::Options,
        head => HttpMethod::Head,
        trace => HttpMethod::Trace,
        query => HttpMethod::Query,
    }

    /// Add a webhook operation. Needs a version with webhook support.
    pub fn webhook<F>(&mut self, name: &str, method: HttpMethod, configure: F) -> &mut Self
    where
        F: FnOnce(&mut OperationBuilder<'_>),
    {
        let location = format!("webhook {name} {method}");
        if !self.version.supports_webhooks() {
            self.issues.push(Issue::WebhooksUnsupported {
                version: self.version.to_string(),
                location,
            });
            return self;
        }
        if !self.method_supported(method, &location) {
            return self;
        }

        let node = self.configure_node(OperationNode::new(method, name), configure);
        self.claim_operation_id(node.operation_id.as_deref(), &location);
        if self
            .webhooks
            .entry(name.to_string())
            .or_default()
            .insert(method, node)
            .is_some()
        {
            warn!("{location} declared twice, keeping the last");
        }
        self
    }

    /// Issues recorded so far, in insertion order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Every operation as seen by an external router; webhooks last.
    pub fn routes(&self) -> Vec<Route> {
        let ops = |map: &IndexMap<String, MethodMap>, webhook: bool| {
            map.values()
                .flat_map(|methods| methods.values())
                .map(|op| Route {
                    method: op.method,
                    path: op.path.clone(),
                    operation_id: op.operation_id.clone(),
                    webhook,
                })
                .collect::<Vec<_>>()
        };
        let mut routes = ops(&self.paths, false);
        routes.extend(ops(&self.webhooks, true));
        routes
    }

    /// Hand every non-webhook route to `binder`.
    pub fn bind_routes<B: RouteBinder>(&self, binder: &mut B) {
        for route in self.routes().iter().filter(|r| !r.webhook) {
            binder.bind(route);
        }
    }

    /// Emit the document for the active version.
    pub fn build(&self) -> Result<Document, BuildError> {
        self.build_as(self.version)
    }

    /// Emit the same configuration for `version`. Constructs the target
    /// cannot express are dropped with a warning.
    pub fn build_as(&self, version: OpenApiVersion) -> Result<Document, BuildError> {
        let issues = self.collect_issues();
        if !issues.is_empty() {
            return Err(BuildError::Invalid {
                count: issues.len(),
                issues,
            });
        }

        let profile = TargetProfile::for_version(version);
        debug!("building OpenAPI {version} document");
        Ok(match profile.payload {
            PayloadPlacement::BodyParameter => Document::V2(Box::new(self.emit_v2(&profile))),
            PayloadPlacement::RequestBody => Document::V3(Box::new(self.emit_v3(&profile))),
        })
    }

    fn reflect(&mut self, desc: &TypeDesc, name: Option<&str>) -> SchemaOrRef {
        let node = self.reflector.generate_desc(desc, name);
        self.issues.extend(self.reflector.take_issues());
        node
    }

    fn method_supported(&mut self, method: HttpMethod, location: &str) -> bool {
        if TargetProfile::for_version(self.version).supports_method(method) {
            return true;
        }
        self.issues.push(Issue::UnsupportedMethod {
            method: method.to_string(),
            version: self.version.to_string(),
            location: location.to_string(),
        });
        false
    }

    fn configure_node<F>(&mut self, node: OperationNode, configure: F) -> OperationNode
    where
        F: FnOnce(&mut OperationBuilder<'_>),
    {
        let mut op = OperationBuilder::new(node, &mut self.reflector, &mut self.issues, self.version);
        configure(&mut op);
        let mut node = op.node;
        if node.operation_id.is_none() && self.derive_operation_ids {
            node.operation_id = Some(derive_operation_id(node.method, &node.path));
        }
        node
    }

    /// Record the id; a duplicate is an issue but the operation is kept.
    fn claim_operation_id(&mut self, id: Option<&str>, location: &str) {
        let Some(id) = id else {
            return;
        };
        match self.operation_ids.get(id) {
            Some(first_seen) => self.issues.push(Issue::DuplicateOperationId {
                id: id.to_string(),
                location: location.to_string(),
                first_seen: first_seen.clone(),
            }),
            None => {
                self.operation_ids.insert(id.to_string(), location.to_string());
            }
        }
    }

    fn operations(&self) -> impl Iterator<Item = &OperationNode> {
        self.paths
            .values()
            .chain(self.webhooks.values())
            .flat_map(|methods| methods.values())
    }

    /// Recorded issues plus references to components that were never added.
    fn collect_issues(&self) -> Vec<Issue> {
        let mut issues = self.issues.clone();
        for op in self.operations() {
            for entry in &op.parameters {
                if let ParamEntry::Ref(name) = entry
                    && !self.parameters.contains_key(name)
                {
                    issues.push(Issue::UnknownComponent {
                        kind: "parameter".to_string(),
                        name: name.clone(),
                        location: op.location(),
                    });
                }
            }
            for entry in op.responses.values() {
                if let ResponseEntry::Ref(name) = entry
                    && !self.responses.contains_key(name)
                {
                    issues.push(Issue::UnknownComponent {
                        kind: "response".to_string(),
                        name: name.clone(),
                        location: op.location(),
                    });
                }
            }
        }
        issues
    }

    /// Named schemas: reflected records first, then explicit registrations.
    fn schema_components(&self, profile: &TargetProfile) -> IndexMap<String, SchemaOrRef> {
        let mut out: IndexMap<String, SchemaOrRef> = self
            .reflector
            .definitions()
            .into_iter()
            .map(|(name, schema)| {
                let node = profile.finish_schema(&SchemaOrRef::inline(schema));
                (name, node)
            })
            .collect();
        for (name, node) in &self.schemas {
            if out.contains_key(name) {
                warn!("component schema {name} shadows a reflected type, keeping the reflected one");
                continue;
            }
            out.insert(name.clone(), profile.finish_schema(node));
        }
        out
    }
}
