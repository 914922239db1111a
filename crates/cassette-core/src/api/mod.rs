//! Typed endpoint wrappers
//!
//! Thin `impl AuthenticatedRequestClient` blocks, one module per server
//! area. Each wrapper builds a [`RequestDescriptor`](crate::executor::RequestDescriptor),
//! runs it through [`execute`](crate::client::AuthenticatedRequestClient::execute)
//! and decodes the body into a model.

pub mod auth;
pub mod generation;
pub mod library;
pub mod songs;

/// Request body for a serializable model.
///
/// Models in this crate only hold strings, numbers and enums, so
/// serialization can't fail.
pub(crate) fn body_of<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_default()
}
