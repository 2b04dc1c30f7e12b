//! Type-to-schema compiler front end.

pub mod naming;
pub mod reflector;
pub mod registry;

pub use reflector::Reflector;
pub use registry::SchemaRegistry;
