//! Dialect-independent nodes accumulated by the builder.

pub mod operations;
pub mod security;

pub use operations::*;
pub use security::*;
