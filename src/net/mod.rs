//! Networking layer for the auth API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` sends every request and normalizes failures into `error`'s
//! single shape, `unauthorized` carries 401s to the session owner, and
//! `types` defines the wire schema.

pub mod client;
pub mod error;
pub mod types;
pub mod unauthorized;

pub use client::{Method, RequestClient, RequestOptions};
pub use error::{ErrorCode, ErrorKind, NormalizedError};
pub use types::{Role, User};
pub use unauthorized::UnauthorizedSignal;
