pub mod client;
pub mod types;

pub use client::{HttpIntrospector, IntrospectionError, TokenIntrospector, introspect};
pub use types::IntrospectionResult;
