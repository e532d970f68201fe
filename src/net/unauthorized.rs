//! Single-slot listener for authorization failures.
//!
//! DESIGN
//! ======
//! The request client only reports that a 401 happened; what to do about it
//! belongs to whoever owns the session. Exactly one owner exists, so this is
//! one slot rather than a subscriber list: registering again replaces the
//! previous callback and is never an error.
//!
//! The callback is invoked outside the slot lock, so it may itself register,
//! clear, or notify without deadlocking. Callbacks must be idempotent: several
//! requests failing at once each call `notify`.

use std::sync::{Arc, Mutex, PoisonError};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct UnauthorizedSignal {
    slot: Arc<Mutex<Option<Listener>>>,
}

impl std::fmt::Debug for UnauthorizedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnauthorizedSignal")
            .field("has_listener", &self.has_listener())
            .finish()
    }
}

impl UnauthorizedSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `listener`, replacing any previous one. Returns `true` if one was replaced.
    pub fn set_listener<F>(&self, listener: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        let previous = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::new(listener));
        if previous.is_some() {
            tracing::debug!("unauthorized listener replaced");
        }
        previous.is_some()
    }

    pub fn clear_listener(&self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    #[must_use]
    pub fn has_listener(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Invoke the registered listener, if any. Returns whether one ran.
    pub fn notify(&self) -> bool {
        let listener = self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match listener {
            Some(listener) => {
                listener();
                true
            }
            None => {
                tracing::debug!("unauthorized signal with no listener");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "unauthorized_test.rs"]
mod tests;
