use std::fmt;

use thiserror::Error;

/// A single violated rule inside a constraint set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ConstraintError {
    pub field: String,
    pub message: String,
}

impl ConstraintError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every violation found in one constraint set, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstraintErrors(pub Vec<ConstraintError>);

impl ConstraintErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintError> {
        self.0.iter()
    }
}

impl fmt::Display for ConstraintErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConstraintErrors {}

/// A non-fatal problem recorded while configuring a document.
///
/// Issues never interrupt the fluent chain; they are reported together when
/// the document is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    #[error("invalid constraints on {location}: {errors}")]
    Constraint {
        location: String,
        errors: ConstraintErrors,
    },

    #[error("duplicate operationId \"{id}\" at {location} (first defined at {first_seen})")]
    DuplicateOperationId {
        id: String,
        location: String,
        first_seen: String,
    },

    #[error("method {method} is not supported by OpenAPI {version} ({location})")]
    UnsupportedMethod {
        method: String,
        version: String,
        location: String,
    },

    #[error("parameter location \"{param_in}\" is not supported by OpenAPI {version} ({location})")]
    UnsupportedLocation {
        param_in: String,
        version: String,
        location: String,
    },

    #[error("webhooks are not supported by OpenAPI {version} ({location})")]
    WebhooksUnsupported { version: String, location: String },

    #[error("unknown {kind} component \"{name}\" referenced at {location}")]
    UnknownComponent {
        kind: String,
        name: String,
        location: String,
    },
}

/// Failure of the single finalize step.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{count} error(s) building document:{}", render_issues(.issues))]
    Invalid { count: usize, issues: Vec<Issue> },
}

impl BuildError {
    pub fn issues(&self) -> &[Issue] {
        match self {
            BuildError::Invalid { issues, .. } => issues,
        }
    }
}

fn render_issues(issues: &[Issue]) -> String {
    issues.iter().map(|i| format!("\n  - {i}")).collect()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_errors_join() {
        let errs = ConstraintErrors(vec![
            ConstraintError::new("minimum", "must not exceed maximum"),
            ConstraintError::new("pattern", "invalid regex"),
        ]);
        assert_eq!(
            errs.to_string(),
            "minimum: must not exceed maximum; pattern: invalid regex"
        );
    }

    #[test]
    fn test_build_error_lists_every_issue() {
        let err = BuildError::Invalid {
            count: 2,
            issues: vec![
                Issue::WebhooksUnsupported {
                    version: "3.0.3".into(),
                    location: "webhook newPet".into(),
                },
                Issue::UnsupportedMethod {
                    method: "TRACE".into(),
                    version: "2.0".into(),
                    location: "TRACE /echo".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 error(s) building document:"));
        assert!(msg.contains("\n  - webhooks are not supported by OpenAPI 3.0.3"));
        assert!(msg.contains("\n  - method TRACE is not supported by OpenAPI 2.0"));
        assert_eq!(err.issues().len(), 2);
    }
}
