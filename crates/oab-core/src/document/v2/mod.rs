//! OpenAPI 2.0 (Swagger) document model.

pub mod operation;
pub mod parameter;
pub mod response;
pub mod security;
pub mod spec;

pub use operation::{Operation, PathItem};
pub use parameter::{Items, Parameter, ParameterLocation, ParameterOrRef, ParameterType};
pub use response::{Header, Response, ResponseOrRef};
pub use security::{ApiKeyLocation, OAuthFlowKind, SecurityScheme};
pub use spec::Swagger;
