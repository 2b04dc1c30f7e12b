//! Build OpenAPI 2.0 and 3.x documents from Rust type descriptions.
//!
//! Types describe themselves through [`Describe`]; a [`DocumentBuilder`]
//! compiles them into schemas, accumulates operations and components, and
//! emits either dialect from the same configuration.

pub mod builder;
pub mod config;
pub mod constraint;
pub mod describe;
pub mod document;
pub mod error;
pub mod ir;
pub mod operation_id;
pub mod reflect;
pub mod schema;
pub mod tag;

pub use builder::{Body, DocumentBuilder, OperationBuilder, Param, Reply, Route, RouteBinder};
pub use constraint::Constraints;
pub use describe::{Describe, Field, TypeDesc};
pub use document::{Document, OpenApiVersion};
pub use error::{BuildError, Issue};
pub use ir::{HttpMethod, SecuritySchemeNode};
pub use reflect::Reflector;
pub use schema::{Schema, SchemaOrRef};
