use indexmap::IndexMap;
use log::warn;

use crate::constraint::apply_to_schema;
use crate::document::v3::{
    self, ApiKeyLocation, Components, MediaType, OAuthFlow, OAuthFlows, OpenApiSpec, PathItem,
    RequestBody, SecurityScheme,
};
use crate::ir::{
    ApiKeyIn, MediaNode, OAuthFlowType, OperationNode, ParamEntry, ParamLocation, ParameterNode,
    ResponseEntry, ResponseNode, SecurityKind, SecuritySchemeNode,
};
use crate::schema::{Schema, SchemaOrRef, SchemaType};

use super::DocumentBuilder;
use super::profile::TargetProfile;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

impl DocumentBuilder {
    pub(super) fn emit_v3(&self, profile: &TargetProfile) -> OpenApiSpec {
        let paths = self.emit_path_items(&self.paths, profile);
        let webhooks = if profile.version.supports_webhooks() {
            self.emit_path_items(&self.webhooks, profile)
        } else {
            if !self.webhooks.is_empty() {
                warn!(
                    "OpenAPI {} has no webhooks, dropping {} webhook(s)",
                    profile.version,
                    self.webhooks.len()
                );
            }
            IndexMap::new()
        };

        let components = Components {
            schemas: self.schema_components(profile),
            responses: self
                .responses
                .iter()
                .map(|(name, r)| {
                    let emitted = v3::ResponseOrRef::Response(emit_response(r, profile));
                    (name.clone(), emitted)
                })
                .collect(),
            parameters: self
                .parameters
                .iter()
                .filter_map(|(name, p)| {
                    let emitted = emit_parameter(p, profile)?;
                    Some((name.clone(), v3::ParameterOrRef::Parameter(emitted)))
                })
                .collect(),
            security_schemes: self
                .security_schemes
                .iter()
                .map(|(name, s)| (name.clone(), emit_security_scheme(s)))
                .collect(),
        };

        OpenApiSpec {
            openapi: profile.version.as_str().to_string(),
            info: self.info.clone(),
            servers: self.servers.clone(),
            paths,
            webhooks,
            components: (!components.is_empty()).then_some(components),
            security: self.security.clone(),
            tags: self.tags.clone(),
            external_docs: self.external_docs.clone(),
        }
    }

    fn emit_path_items(
        &self,
        source: &IndexMap<String, super::MethodMap>,
        profile: &TargetProfile,
    ) -> IndexMap<String, PathItem> {
        let mut out: IndexMap<String, PathItem> = IndexMap::new();
        for (path, methods) in source {
            for op in methods.values() {
                if !profile.supports_method(op.method) {
                    warn!(
                        "OpenAPI {} has no {} operations, dropping {}",
                        profile.version,
                        op.method,
                        op.location()
                    );
                    continue;
                }
                let emitted = self.emit_operation(op, profile);
                out.entry(path.clone()).or_default().set(op.method, emitted);
            }
        }
        out
    }

    fn emit_operation(&self, op: &OperationNode, profile: &TargetProfile) -> v3::Operation {
        let parameters = op
            .parameters
            .iter()
            .filter_map(|entry| match entry {
                ParamEntry::Inline(p) => {
                    emit_parameter(p, profile).map(v3::ParameterOrRef::Parameter)
                }
                ParamEntry::Ref(name)
                    if self
                        .parameters
                        .get(name)
                        .is_some_and(|p| p.location == ParamLocation::Form) =>
                {
                    None
                }
                ParamEntry::Ref(name) => Some(v3::ParameterOrRef::Ref {
                    ref_path: profile.parameter_ref(name),
                }),
            })
            .collect();

        let responses = op
            .responses
            .iter()
            .map(|(status, entry)| {
                let emitted = match entry {
                    ResponseEntry::Inline(r) => v3::ResponseOrRef::Response(emit_response(r, profile)),
                    ResponseEntry::Ref(name) => v3::ResponseOrRef::Ref {
                        ref_path: profile.response_ref(name),
                    },
                };
                (status.clone(), emitted)
            })
            .collect();

        v3::Operation {
            tags: op.tags.clone(),
            summary: op.summary.clone(),
            description: op.description.clone(),
            operation_id: op.operation_id.clone(),
            parameters,
            request_body: self.emit_request_body(op, profile),
            responses,
            deprecated: op.deprecated.then_some(true),
            security: op.security.clone(),
        }
    }

    /// The declared body plus, if any, one form-encoded entry built from the
    /// operation's form fields.
    fn emit_request_body(&self, op: &OperationNode, profile: &TargetProfile) -> Option<RequestBody> {
        let declared = op.request_body.as_ref();
        let form = form_body(op, &self.parameters, profile);
        if declared.is_none() && form.is_none() {
            return None;
        }

        let mut body = RequestBody {
            description: declared.and_then(|b| b.description.clone()),
            content: declared
                .map(|b| emit_content(&b.content, profile))
                .unwrap_or_default(),
            required: declared.is_some_and(|b| b.required),
        };
        if let Some((content_type, media, required)) = form {
            if body.content.contains_key(content_type) {
                warn!(
                    "{} declares both a {content_type} body and form fields, using the form fields",
                    op.location()
                );
            }
            body.content.insert(content_type.to_string(), media);
            body.required = body.required || required;
        }
        Some(body)
    }
}

/// Fold form fields into one object schema. Returns the content type, the
/// media entry and whether any field is required.
fn form_body(
    op: &OperationNode,
    components: &IndexMap<String, ParameterNode>,
    profile: &TargetProfile,
) -> Option<(&'static str, MediaType, bool)> {
    let fields: Vec<&ParameterNode> = op.form_fields(components).collect();
    if fields.is_empty() {
        return None;
    }

    let mut schema = Schema::typed(SchemaType::Object);
    let mut has_file = false;
    let mut any_required = false;
    for field in &fields {
        has_file |= field.file;
        any_required |= field.required;
        let mut node = apply_to_schema(&field.schema, &field.constraints);
        if let Some(ref description) = field.description
            && let SchemaOrRef::Schema(s) = &mut node
        {
            s.description = Some(description.clone());
        }
        schema.properties.insert(field.name.clone(), node);
        if field.required {
            schema.required.push(field.name.clone());
        }
    }

    let content_type = if has_file { MULTIPART } else { FORM_URLENCODED };
    let media = MediaType {
        schema: Some(profile.finish_schema(&SchemaOrRef::inline(schema))),
        ..MediaType::default()
    };
    Some((content_type, media, any_required))
}

/// Form fields yield `None`; they are emitted through [`form_body`].
fn emit_parameter(p: &ParameterNode, profile: &TargetProfile) -> Option<v3::Parameter> {
    let location = v3::ParameterLocation::from_node(p.location)?;
    let schema = apply_to_schema(&p.schema, &p.constraints);
    Some(v3::Parameter {
        name: p.name.clone(),
        location,
        description: p.description.clone(),
        required: p.required,
        deprecated: p.deprecated.then_some(true),
        schema: Some(profile.finish_schema(&schema)),
        example: p.example.clone(),
    })
}

fn emit_content(
    content: &IndexMap<String, MediaNode>,
    profile: &TargetProfile,
) -> IndexMap<String, MediaType> {
    content
        .iter()
        .map(|(content_type, media)| {
            let emitted = MediaType {
                schema: Some(profile.finish_schema(&media.schema)),
                example: media.example.clone(),
                ..MediaType::default()
            };
            (content_type.clone(), emitted)
        })
        .collect()
}

fn emit_response(r: &ResponseNode, profile: &TargetProfile) -> v3::Response {
    v3::Response {
        description: r.description.clone(),
        headers: r
            .headers
            .iter()
            .map(|(name, h)| {
                let header = v3::response::Header {
                    description: h.description.clone(),
                    schema: Some(profile.finish_schema(&h.schema)),
                };
                (name.clone(), header)
            })
            .collect(),
        content: emit_content(&r.content, profile),
    }
}

fn emit_security_scheme(s: &SecuritySchemeNode) -> SecurityScheme {
    let description = s.description.clone();
    match &s.kind {
        SecurityKind::ApiKey { name, location } => SecurityScheme::ApiKey {
            description,
            name: name.clone(),
            location: match location {
                ApiKeyIn::Query => ApiKeyLocation::Query,
                ApiKeyIn::Header => ApiKeyLocation::Header,
                ApiKeyIn::Cookie => ApiKeyLocation::Cookie,
            },
        },
        SecurityKind::Http {
            scheme,
            bearer_format,
        } => SecurityScheme::Http {
            description,
            scheme: scheme.clone(),
            bearer_format: bearer_format.clone(),
        },
        SecurityKind::OAuth2 { flows } => {
            let mut emitted = OAuthFlows::default();
            for flow in flows {
                let slot = match flow.flow {
                    OAuthFlowType::Implicit => &mut emitted.implicit,
                    OAuthFlowType::Password => &mut emitted.password,
                    OAuthFlowType::ClientCredentials => &mut emitted.client_credentials,
                    OAuthFlowType::AuthorizationCode => &mut emitted.authorization_code,
                };
                *slot = Some(OAuthFlow {
                    authorization_url: flow.authorization_url.clone(),
                    token_url: flow.token_url.clone(),
                    refresh_url: flow.refresh_url.clone(),
                    scopes: flow.scopes.clone(),
                });
            }
            SecurityScheme::OAuth2 {
                description,
                flows: emitted,
            }
        }
        SecurityKind::OpenIdConnect { url } => SecurityScheme::OpenIdConnect {
            description,
            url: url.clone(),
        },
    }
}
