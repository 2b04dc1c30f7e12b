use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where an API key travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

/// One slot per OAuth2 grant; absent grants are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    /// Always present, even when empty.
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

/// A 3.x security scheme, discriminated by its `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SecurityScheme {
    ApiKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    Http {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        scheme: String,
        #[serde(
            rename = "bearerFormat",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        bearer_format: Option<String>,
    },
    #[serde(rename = "oauth2")]
    OAuth2 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        flows: OAuthFlows,
    },
    OpenIdConnect {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(rename = "openIdConnectUrl")]
        url: String,
    },
}

/// Scheme name mapped to the scopes an operation needs.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_type_tag() {
        let http = SecurityScheme::Http {
            description: None,
            scheme: "bearer".into(),
            bearer_format: Some("JWT".into()),
        };
        assert_eq!(
            serde_json::to_value(&http).unwrap(),
            serde_json::json!({"type": "http", "scheme": "bearer", "bearerFormat": "JWT"})
        );

        let oauth = SecurityScheme::OAuth2 {
            description: None,
            flows: OAuthFlows {
                client_credentials: Some(OAuthFlow {
                    token_url: Some("https://auth.example.com/token".into()),
                    ..OAuthFlow::default()
                }),
                ..OAuthFlows::default()
            },
        };
        let value = serde_json::to_value(&oauth).unwrap();
        assert_eq!(value["type"], "oauth2");
        assert_eq!(
            value["flows"]["clientCredentials"]["tokenUrl"],
            "https://auth.example.com/token"
        );
        assert_eq!(value["flows"]["clientCredentials"]["scopes"], serde_json::json!({}));
    }
}
