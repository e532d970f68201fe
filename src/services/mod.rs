//! Session services.
//!
//! ARCHITECTURE
//! ============
//! `session` owns the lifecycle (resume, sign in, sign out, eviction) and
//! drives `renewal`, which knows nothing about sessions beyond a tick
//! closure and a period.

pub mod renewal;
pub mod session;

pub use renewal::RenewalTask;
pub use session::SessionStore;
