//! # authkeeper
//!
//! Client-side session lifecycle for a cookie-authenticated HTTP API.
//!
//! [`SessionStore`] resumes an existing session on startup, signs users in and
//! out, keeps the server session alive with periodic renewal, and evicts the
//! local session when any request sent through its [`RequestClient`] is
//! rejected with 401. Hosts plug in a [`Navigator`] to move the UI between the
//! home and landing routes, and read state through snapshots or a `watch`
//! subscription.
//!
//! The session credential is an HttpOnly cookie held in the client's cookie
//! store; this crate never reads or stores it directly.

pub mod config;
pub mod navigation;
pub mod net;
pub mod services;
pub mod state;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{ConfigError, HttpTimeouts, SessionConfig};
pub use navigation::{Navigator, TracingNavigator};
pub use net::{ErrorCode, ErrorKind, NormalizedError, RequestClient, RequestOptions, Role, UnauthorizedSignal, User};
pub use services::SessionStore;
pub use state::SessionState;
pub use validation::{RegistrationError, RegistrationForm, RegistrationParts};
