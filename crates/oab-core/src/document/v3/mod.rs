//! OpenAPI 3.x document model.

pub mod components;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod response;
pub mod security;
pub mod server;
pub mod spec;

pub use components::Components;
pub use media_type::{MediaType, RequestBody};
pub use operation::{Operation, PathItem};
pub use parameter::{Parameter, ParameterLocation, ParameterOrRef};
pub use response::{Response, ResponseOrRef};
pub use security::{ApiKeyLocation, OAuthFlow, OAuthFlows, SecurityRequirement, SecurityScheme};
pub use server::{Server, ServerVariable};
pub use spec::OpenApiSpec;
