use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One server a document is reachable at. `{name}` placeholders in `url`
/// are filled from `variables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    pub default: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: IndexMap::new(),
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a placeholder and its default. `choices`, when given, should
    /// include the default.
    pub fn variable(
        mut self,
        name: impl Into<String>,
        default: impl Into<String>,
        choices: &[&str],
    ) -> Self {
        self.variables.insert(
            name.into(),
            ServerVariable {
                choices: choices.iter().map(|c| (*c).to_string()).collect(),
                default: default.into(),
                description: None,
            },
        );
        self
    }

    /// The URL with every declared placeholder replaced by its default.
    /// Undeclared placeholders are left as written.
    pub fn expanded_url(&self) -> String {
        self.variables
            .iter()
            .fold(self.url.clone(), |url, (name, var)| {
                url.replace(&format!("{{{name}}}"), &var.default)
            })
    }
}
