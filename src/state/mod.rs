//! Client-side session state.
//!
//! DESIGN
//! ======
//! State lives in one cell owned by the session store. The UI only reads
//! snapshots or subscribes; writes happen through session operations.

pub mod session;

pub use session::{SessionCell, SessionState, UserTransition};
