//! Session state snapshot and its single-writer cell.
//!
//! DESIGN
//! ======
//! `SessionCell` owns a `watch` sender: readers take cheap snapshots or
//! subscribe for changes, and every write goes through `send_if_modified`,
//! which serializes writers and only wakes subscribers on a real change.
//!
//! `is_authenticated` is derived from `user` and never stored. `is_loading`
//! starts `true` and can be cleared exactly once.

use tokio::sync::watch;

use crate::net::types::User;

/// Read-only view of the session exposed to the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    user: Option<User>,
    is_loading: bool,
}

impl SessionState {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// True only until the initial resumption check completes.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self { user: None, is_loading: true }
    }
}

/// Outcome of a user write, used to start or stop renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTransition {
    pub was_authenticated: bool,
    pub is_authenticated: bool,
}

impl UserTransition {
    #[must_use]
    pub fn signed_in(self) -> bool {
        !self.was_authenticated && self.is_authenticated
    }

    #[must_use]
    pub fn signed_out(self) -> bool {
        self.was_authenticated && !self.is_authenticated
    }
}

#[derive(Debug)]
pub struct SessionCell {
    tx: watch::Sender<SessionState>,
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCell {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    /// Replace the current user.
    pub fn set_user(&self, user: Option<User>) -> UserTransition {
        let mut transition = UserTransition { was_authenticated: false, is_authenticated: user.is_some() };
        self.tx.send_if_modified(|state| {
            transition.was_authenticated = state.user.is_some();
            if state.user == user {
                return false;
            }
            state.user = user;
            true
        });
        transition
    }

    /// Clear `is_loading`. Returns `true` only for the call that actually cleared it.
    pub fn finish_loading(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_loading {
                state.is_loading = false;
                true
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
