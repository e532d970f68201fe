//! Navigation seam between the session core and the UI.
//!
//! The session core decides *when* to move the user (after login, after
//! logout, on eviction); the UI decides *how*. Implementations are called
//! synchronously from session operations and must not block.

use std::sync::{Mutex, PoisonError};

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator for headless hosts: records the current route and logs changes.
///
/// Navigating to the route that is already current is a no-op.
#[derive(Debug, Default)]
pub struct TracingNavigator {
    current: Mutex<Option<String>>,
}

impl TracingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_deref() == Some(route) {
            return;
        }
        tracing::info!(route, "navigate");
        *current = Some(route.to_owned());
    }
}
