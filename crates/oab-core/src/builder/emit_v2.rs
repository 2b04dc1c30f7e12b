use indexmap::IndexMap;
use log::{debug, warn};

use crate::constraint::{apply_to_parameter, project_onto_parameter};
use crate::document::v2::{
    self, ApiKeyLocation, OAuthFlowKind, ParameterLocation, ParameterOrRef, ParameterType,
    ResponseOrRef, SecurityScheme, Swagger,
};
use crate::ir::{
    ApiKeyIn, OAuthFlowType, OperationNode, ParamEntry, ParamLocation, ParameterNode,
    RequestBodyNode, ResponseEntry, ResponseNode, SecurityKind, SecuritySchemeNode,
};

use super::DocumentBuilder;
use super::profile::TargetProfile;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

impl DocumentBuilder {
    pub(super) fn emit_v2(&self, profile: &TargetProfile) -> Swagger {
        let (schemes, host, base_path) = self
            .servers
            .first()
            .map(|s| split_server_url(&s.expanded_url()))
            .unwrap_or_default();
        if self.servers.len() > 1 {
            debug!("2.0 keeps only the first of {} servers", self.servers.len());
        }
        if !self.webhooks.is_empty() {
            warn!("OpenAPI 2.0 has no webhooks, dropping {} webhook(s)", self.webhooks.len());
        }

        let mut paths: IndexMap<String, v2::PathItem> = IndexMap::new();
        for (path, methods) in &self.paths {
            for op in methods.values() {
                if !profile.supports_method(op.method) {
                    warn!("OpenAPI 2.0 has no {} operations, dropping {}", op.method, op.location());
                    continue;
                }
                let emitted = self.emit_v2_operation(op, profile);
                if paths.entry(path.clone()).or_default().set(op.method, emitted).is_err() {
                    warn!("no 2.0 slot for {}", op.location());
                }
            }
        }

        Swagger {
            swagger: profile.version.as_str().to_string(),
            info: self.info.clone(),
            host,
            base_path,
            schemes,
            consumes: Vec::new(),
            produces: Vec::new(),
            paths,
            definitions: self.schema_components(profile),
            parameters: self
                .parameters
                .iter()
                .filter_map(|(name, p)| {
                    emit_parameter(p)
                        .map(|param| (name.clone(), ParameterOrRef::Parameter(Box::new(param))))
                })
                .collect(),
            responses: self
                .responses
                .iter()
                .map(|(name, r)| (name.clone(), ResponseOrRef::Response(emit_response(r, profile))))
                .collect(),
            security_definitions: self
                .security_schemes
                .iter()
                .filter_map(|(name, s)| emit_security_scheme(name, s).map(|s| (name.clone(), s)))
                .collect(),
            security: self.security.clone(),
            tags: self.tags.clone(),
            external_docs: self.external_docs.clone(),
        }
    }

    fn emit_v2_operation(&self, op: &OperationNode, profile: &TargetProfile) -> v2::Operation {
        let mut parameters = Vec::new();
        let mut has_form = false;
        let mut has_file = false;

        for entry in &op.parameters {
            if let Some(p) = entry.resolve(&self.parameters)
                && p.location == ParamLocation::Form
            {
                has_form = true;
                has_file |= p.file;
            }
            match entry {
                ParamEntry::Inline(p) => {
                    if let Some(param) = emit_parameter(p) {
                        parameters.push(ParameterOrRef::Parameter(Box::new(param)));
                    }
                }
                ParamEntry::Ref(name) => parameters.push(ParameterOrRef::Ref {
                    ref_path: profile.parameter_ref(name),
                }),
            }
        }

        let mut consumes: Vec<String> = Vec::new();
        if let Some(body) = &op.request_body {
            if has_form {
                warn!("{} mixes a body with form fields, which 2.0 does not allow", op.location());
            }
            push_unique(&mut consumes, body.content.keys());
            if let Some(param) = body_parameter(body, profile) {
                parameters.push(ParameterOrRef::Parameter(Box::new(param)));
            }
        }
        if has_form {
            let form_type = if has_file { MULTIPART } else { FORM_URLENCODED };
            push_unique(&mut consumes, [form_type.to_string()].iter());
        }

        let mut produces: Vec<String> = Vec::new();
        let mut responses = IndexMap::new();
        for (status, entry) in &op.responses {
            let emitted = match entry {
                ResponseEntry::Inline(r) => {
                    push_unique(&mut produces, r.content.keys());
                    ResponseOrRef::Response(emit_response(r, profile))
                }
                ResponseEntry::Ref(name) => {
                    if let Some(r) = self.responses.get(name) {
                        push_unique(&mut produces, r.content.keys());
                    }
                    ResponseOrRef::Ref {
                        ref_path: profile.response_ref(name),
                    }
                }
            };
            responses.insert(status.clone(), emitted);
        }

        v2::Operation {
            tags: op.tags.clone(),
            summary: op.summary.clone(),
            description: op.description.clone(),
            operation_id: op.operation_id.clone(),
            consumes,
            produces,
            parameters,
            responses,
            deprecated: op.deprecated.then_some(true),
            security: op.security.clone(),
        }
    }
}

fn push_unique<'a>(out: &mut Vec<String>, items: impl Iterator<Item = &'a String>) {
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
}

/// Non-body parameter with type, format and constraints on the parameter
/// itself. Cookie parameters have no 2.0 form and are dropped.
fn emit_parameter(p: &ParameterNode) -> Option<v2::Parameter> {
    let location = match p.location {
        ParamLocation::Path => ParameterLocation::Path,
        ParamLocation::Query => ParameterLocation::Query,
        ParamLocation::Header => ParameterLocation::Header,
        ParamLocation::Form => ParameterLocation::FormData,
        ParamLocation::Cookie => {
            warn!("OpenAPI 2.0 has no cookie parameters, dropping {}", p.name);
            return None;
        }
    };

    let mut param = v2::Parameter::new(&p.name, location);
    param.description = p.description.clone();
    param.required = p.required;
    if p.file {
        param.param_type = Some(ParameterType::File);
    } else if !project_onto_parameter(&mut param, &p.schema) {
        warn!("parameter {} has no 2.0 primitive type, emitting it as a string", p.name);
        param.param_type = Some(ParameterType::String);
    }
    apply_to_parameter(&mut param, &p.constraints);
    if p.example.is_some() {
        param.example = p.example.clone();
    }
    if p.deprecated {
        param.deprecated = Some(true);
    }
    Some(param)
}

/// The synthetic `body` parameter: the first content type's schema.
fn body_parameter(body: &RequestBodyNode, profile: &TargetProfile) -> Option<v2::Parameter> {
    let (content_type, media) = body.content.first()?;
    if body.content.len() > 1 {
        debug!("2.0 body parameter uses the {content_type} schema");
    }
    let mut param = v2::Parameter::new("body", ParameterLocation::Body);
    param.description = body.description.clone();
    param.required = body.required;
    param.schema = Some(profile.finish_schema(&media.schema));
    Some(param)
}

/// One direct schema (first content type wins) plus examples keyed by
/// content type.
fn emit_response(r: &ResponseNode, profile: &TargetProfile) -> v2::Response {
    v2::Response {
        description: r.description.clone(),
        schema: r.content.values().next().map(|m| profile.finish_schema(&m.schema)),
        headers: r
            .headers
            .iter()
            .map(|(name, h)| {
                let schema = h.schema.as_schema();
                let header = v2::Header {
                    description: h.description.clone(),
                    header_type: schema
                        .and_then(|s| s.primary_type())
                        .and_then(ParameterType::from_schema_type),
                    format: schema.and_then(|s| s.format.clone()),
                };
                (name.clone(), header)
            })
            .collect(),
        examples: r
            .content
            .iter()
            .filter_map(|(ct, m)| m.example.clone().map(|e| (ct.clone(), e)))
            .collect(),
    }
}

fn emit_security_scheme(name: &str, s: &SecuritySchemeNode) -> Option<SecurityScheme> {
    let description = s.description.clone();
    let scheme = match &s.kind {
        SecurityKind::ApiKey {
            name: key_name,
            location,
        } => SecurityScheme::ApiKey {
            description,
            name: key_name.clone(),
            location: match location {
                ApiKeyIn::Query => ApiKeyLocation::Query,
                ApiKeyIn::Header => ApiKeyLocation::Header,
                ApiKeyIn::Cookie => {
                    warn!("OpenAPI 2.0 has no cookie API keys, dropping scheme {name}");
                    return None;
                }
            },
        },
        SecurityKind::Http { scheme, .. } if scheme.eq_ignore_ascii_case("basic") => {
            SecurityScheme::Basic { description }
        }
        SecurityKind::Http { scheme, .. } if scheme.eq_ignore_ascii_case("bearer") => {
            SecurityScheme::ApiKey {
                description,
                name: "Authorization".to_string(),
                location: ApiKeyLocation::Header,
            }
        }
        SecurityKind::Http { scheme, .. } => {
            warn!("OpenAPI 2.0 has no http {scheme} scheme, dropping scheme {name}");
            return None;
        }
        SecurityKind::OAuth2 { flows } => {
            let Some(flow) = flows.first() else {
                warn!("OAuth2 scheme {name} declares no flows, dropping it");
                return None;
            };
            if flows.len() > 1 {
                warn!("OpenAPI 2.0 allows one OAuth2 flow per scheme, {name} keeps the first");
            }
            SecurityScheme::OAuth2 {
                description,
                flow: match flow.flow {
                    OAuthFlowType::Implicit => OAuthFlowKind::Implicit,
                    OAuthFlowType::Password => OAuthFlowKind::Password,
                    OAuthFlowType::ClientCredentials => OAuthFlowKind::Application,
                    OAuthFlowType::AuthorizationCode => OAuthFlowKind::AccessCode,
                },
                authorization_url: flow.authorization_url.clone(),
                token_url: flow.token_url.clone(),
                scopes: flow.scopes.clone(),
            }
        }
        SecurityKind::OpenIdConnect { .. } => {
            warn!("OpenAPI 2.0 has no OpenID Connect, dropping scheme {name}");
            return None;
        }
    };
    Some(scheme)
}

/// Split a server URL into 2.0 `schemes`, `host` and `basePath`.
fn split_server_url(url: &str) -> (Vec<String>, Option<String>, Option<String>) {
    let (schemes, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (vec![scheme.to_string()], rest),
        None => (Vec::new(), url),
    };
    let (host, path) = if schemes.is_empty() {
        (None, rest)
    } else {
        match rest.find('/') {
            Some(i) => (Some(&rest[..i]), &rest[i..]),
            None => (Some(rest), ""),
        }
    };
    let base_path = path.trim_end_matches('/');
    (
        schemes,
        host.filter(|h| !h.is_empty()).map(str::to_string),
        (!base_path.is_empty()).then(|| base_path.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::OAuthFlowNode;

    #[test]
    fn test_split_server_url() {
        assert_eq!(
            split_server_url("https://api.example.com/v1/"),
            (
                vec!["https".to_string()],
                Some("api.example.com".to_string()),
                Some("/v1".to_string())
            )
        );
        assert_eq!(
            split_server_url("http://localhost:8080"),
            (vec!["http".to_string()], Some("localhost:8080".to_string()), None)
        );
        assert_eq!(
            split_server_url("/api"),
            (Vec::new(), None, Some("/api".to_string()))
        );
    }

    #[test]
    fn test_security_conversion() {
        let bearer = emit_security_scheme("jwt", &SecuritySchemeNode::bearer(Some("JWT"))).unwrap();
        assert_eq!(
            bearer,
            SecurityScheme::ApiKey {
                description: None,
                name: "Authorization".to_string(),
                location: ApiKeyLocation::Header,
            }
        );

        let basic = emit_security_scheme("basic", &SecuritySchemeNode::basic()).unwrap();
        assert_eq!(basic, SecurityScheme::Basic { description: None });

        let oauth = SecuritySchemeNode::oauth2(vec![
            OAuthFlowNode::new(OAuthFlowType::ClientCredentials)
                .token_url("https://auth.example.com/token")
                .scope("read", "Read access"),
        ]);
        let oauth = emit_security_scheme("oauth", &oauth).unwrap();
        let SecurityScheme::OAuth2 { flow, scopes, .. } = &oauth else {
            panic!("expected oauth2, got {oauth:?}");
        };
        assert_eq!(*flow, OAuthFlowKind::Application);
        assert_eq!(scopes["read"], "Read access");

        assert!(
            emit_security_scheme("oidc", &SecuritySchemeNode::open_id_connect("https://x")).is_none()
        );
        assert!(
            emit_security_scheme("c", &SecuritySchemeNode::api_key("sid", ApiKeyIn::Cookie))
                .is_none()
        );
    }
}
