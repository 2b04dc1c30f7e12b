use indexmap::IndexMap;

/// A security scheme, dialect independent.
#[derive(Debug, Clone, PartialEq)]
pub struct SecuritySchemeNode {
    pub description: Option<String>,
    pub kind: SecurityKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SecurityKind {
    ApiKey { name: String, location: ApiKeyIn },
    Http {
        scheme: String,
        bearer_format: Option<String>,
    },
    OAuth2 { flows: Vec<OAuthFlowNode> },
    OpenIdConnect { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyIn {
    Query,
    Header,
    Cookie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthFlowType {
    Implicit,
    Password,
    ClientCredentials,
    AuthorizationCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthFlowNode {
    pub flow: OAuthFlowType,
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub refresh_url: Option<String>,
    pub scopes: IndexMap<String, String>,
}

impl OAuthFlowNode {
    pub fn new(flow: OAuthFlowType) -> Self {
        Self {
            flow,
            authorization_url: None,
            token_url: None,
            refresh_url: None,
            scopes: IndexMap::new(),
        }
    }

    pub fn authorization_url(mut self, url: impl Into<String>) -> Self {
        self.authorization_url = Some(url.into());
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    pub fn scope(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.scopes.insert(name.into(), description.into());
        self
    }
}

impl SecuritySchemeNode {
    fn of(kind: SecurityKind) -> Self {
        Self {
            description: None,
            kind,
        }
    }

    pub fn api_key(name: impl Into<String>, location: ApiKeyIn) -> Self {
        Self::of(SecurityKind::ApiKey {
            name: name.into(),
            location,
        })
    }

    pub fn http(scheme: impl Into<String>) -> Self {
        Self::of(SecurityKind::Http {
            scheme: scheme.into(),
            bearer_format: None,
        })
    }

    pub fn basic() -> Self {
        Self::http("basic")
    }

    pub fn bearer(format: Option<&str>) -> Self {
        Self::of(SecurityKind::Http {
            scheme: "bearer".to_string(),
            bearer_format: format.map(str::to_string),
        })
    }

    pub fn oauth2(flows: Vec<OAuthFlowNode>) -> Self {
        Self::of(SecurityKind::OAuth2 { flows })
    }

    pub fn open_id_connect(url: impl Into<String>) -> Self {
        Self::of(SecurityKind::OpenIdConnect { url: url.into() })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
