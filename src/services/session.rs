//! Session store: resumption, sign in and out, renewal, eviction.
//!
//! DESIGN
//! ======
//! `SessionStore` is a cheap cloneable handle over one `SessionInner`. The
//! host creates one per application and passes it to whatever needs session
//! state; tests create a fresh one per case.
//!
//! State machine:
//!
//! ```text
//! UNINITIALIZED --init--> RESUMING --+--> AUTHENTICATED
//!                                    +--> ANONYMOUS
//! AUTHENTICATED --logout | 401 signal--> ANONYMOUS
//! ANONYMOUS --login | register--> AUTHENTICATED
//! ```
//!
//! A failed background renewal is not a transition. Only a 401 on a real
//! request (via the unauthorized signal) or an explicit logout ends the
//! session.
//!
//! Renewal follows the user: every write that leaves a user present makes
//! sure a renewal task is running, every write that clears the user cancels
//! it.
//!
//! ERROR HANDLING
//! ==============
//! `login` and `register` return the server's `NormalizedError` unchanged.
//! `refresh_token`, `logout`, and `init` never fail; they log and degrade.
//!
//! Requests made by this module are silent: a 401 from login means bad
//! credentials, from refresh means renewal failed, and from logout means the
//! session was already gone. None of those is an eviction of a live session.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::renewal::RenewalTask;
use crate::config::{ConfigError, SessionConfig};
use crate::navigation::Navigator;
use crate::net::client::{Method, RequestClient, RequestOptions};
use crate::net::error::NormalizedError;
use crate::net::types::{LoginRequest, RegisterRequest, User, UserPayload};
use crate::net::unauthorized::UnauthorizedSignal;
use crate::state::{SessionCell, SessionState, UserTransition};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const ME_PATH: &str = "/api/auth/me";

// =============================================================================
// STORE HANDLE
// =============================================================================

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: RequestClient,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    cell: SessionCell,
    renewal: Mutex<Option<RenewalTask>>,
    initialized: AtomicBool,
    shut_down: AtomicBool,
}

impl SessionStore {
    /// Build a store with its own request client.
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails validation or the HTTP client
    /// cannot be built.
    pub fn new(config: SessionConfig, navigator: Arc<dyn Navigator>) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = RequestClient::new(&config, UnauthorizedSignal::new())?;
        Ok(Self::with_client(config, client, navigator))
    }

    /// Build a store around an existing request client, e.g. one sharing a
    /// restored cookie jar.
    #[must_use]
    pub fn with_client(config: SessionConfig, client: RequestClient, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client,
                navigator,
                config,
                cell: SessionCell::new(),
                renewal: Mutex::new(None),
                initialized: AtomicBool::new(false),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// The shared request client. Other features send their authenticated
    /// requests through it so that a 401 anywhere evicts the session.
    #[must_use]
    pub fn client(&self) -> &RequestClient {
        &self.inner.client
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.cell.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.cell.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.snapshot().user().cloned()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading()
    }

    /// Whether a background renewal task is currently scheduled.
    #[must_use]
    pub fn is_renewing(&self) -> bool {
        self.inner
            .renewal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Run the initialization protocol: silent resumption, then listener
    /// registration. Only the first call does anything; returns whether this
    /// call ran it.
    pub async fn init(&self) -> bool {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            debug!("session init already ran");
            return false;
        }

        {
            let _loading = LoadingGuard(&self.inner.cell);
            match self.inner.resume().await {
                Some(user) => {
                    self.inner.apply_user(Some(user));
                }
                None => debug!("no resumable session"),
            }
        }

        let weak = Arc::downgrade(&self.inner);
        self.inner.client.unauthorized_signal().set_listener(move || {
            if let Some(inner) = weak.upgrade() {
                inner.handle_unauthorized();
            }
        });
        true
    }

    /// Sign in with email and password, then navigate to the home route.
    ///
    /// # Errors
    ///
    /// Returns the server's [`NormalizedError`] unchanged.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, NormalizedError> {
        let body = LoginRequest { email, password };
        let payload: UserPayload = self
            .inner
            .client
            .request_with(Method::POST, LOGIN_PATH, Some(&body), RequestOptions::silent())
            .await?;
        Ok(self.inner.sign_in(payload.into_user()))
    }

    /// Create an account and sign in. `display_name` defaults to
    /// `"{first_name} {last_name}"`. Input validation is the caller's job;
    /// see [`crate::validation::RegistrationForm`].
    ///
    /// # Errors
    ///
    /// Returns the server's [`NormalizedError`] unchanged, including its
    /// structured `code`.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        display_name: Option<&str>,
    ) -> Result<User, NormalizedError> {
        let body = RegisterRequest::new(email, password, first_name, last_name, display_name);
        let payload: UserPayload = self
            .inner
            .client
            .request_with(Method::POST, REGISTER_PATH, Some(&body), RequestOptions::silent())
            .await?;
        Ok(self.inner.sign_in(payload.into_user()))
    }

    /// Best-effort server logout, then unconditional local sign-out.
    pub async fn logout(&self) {
        let result = self
            .inner
            .client
            .request_with::<Value, ()>(Method::POST, LOGOUT_PATH, None, RequestOptions::silent())
            .await;
        if let Err(e) = result {
            debug!(status = e.status_code, error = %e, "logout request failed; clearing session anyway");
        }
        self.inner.apply_user(None);
        self.inner.navigator.navigate(&self.inner.config.landing_route);
    }

    /// Ask the server to extend the session. `false` on any failure.
    pub async fn refresh_token(&self) -> bool {
        self.inner.refresh_token().await
    }

    /// Stop renewal and detach from the unauthorized signal. Session state is
    /// kept; later sign-ins no longer start renewal.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.inner.stop_renewal();
        self.inner.client.unauthorized_signal().clear_listener();
        debug!("session store shut down");
    }
}

// =============================================================================
// INNER
// =============================================================================

impl SessionInner {
    async fn resume(&self) -> Option<User> {
        if !self.refresh_token().await {
            return None;
        }
        let fetched = self
            .client
            .request_with::<UserPayload, ()>(Method::GET, ME_PATH, None, RequestOptions::silent())
            .await;
        match fetched {
            Ok(payload) => Some(payload.into_user()),
            Err(e) => {
                debug!(status = e.status_code, error = %e, "current user fetch failed after refresh");
                None
            }
        }
    }

    async fn refresh_token(&self) -> bool {
        let call = self
            .client
            .request_with::<Value, ()>(Method::POST, REFRESH_PATH, None, RequestOptions::silent());
        match tokio::time::timeout(self.config.refresh_timeout, call).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(status = e.status_code, error = %e, "session refresh failed");
                false
            }
            Err(_) => {
                debug!(timeout_secs = self.config.refresh_timeout.as_secs_f64(), "session refresh timed out");
                false
            }
        }
    }

    fn sign_in(self: &Arc<Self>, user: User) -> User {
        self.apply_user(Some(user.clone()));
        self.navigator.navigate(&self.config.home_route);
        user
    }

    fn handle_unauthorized(self: &Arc<Self>) {
        if self.apply_user(None).signed_out() {
            warn!("session rejected by server; signing out");
            self.navigator.navigate(&self.config.landing_route);
        }
    }

    /// Write the user and start or stop renewal as one step. The renewal slot
    /// is held across the write so a concurrent sign-in and sign-out cannot
    /// leave a task running for an absent user.
    fn apply_user(self: &Arc<Self>, user: Option<User>) -> UserTransition {
        let user_id = user.as_ref().map(|u| u.user_id.clone());
        let (transition, stale) = {
            let mut slot = self.renewal.lock().unwrap_or_else(PoisonError::into_inner);
            let transition = self.cell.set_user(user);
            let stale = if transition.is_authenticated {
                self.ensure_renewal(&mut slot);
                None
            } else {
                slot.take()
            };
            (transition, stale)
        };
        if let Some(task) = stale {
            task.cancel();
        }
        if transition.signed_in() {
            info!(user_id = user_id.as_deref().unwrap_or_default(), "session authenticated");
        } else if transition.signed_out() {
            info!("session cleared");
        }
        transition
    }

    /// Start renewal unless it is already running. Caller holds the slot lock.
    fn ensure_renewal(self: &Arc<Self>, slot: &mut Option<RenewalTask>) {
        if self.shut_down.load(Ordering::SeqCst) {
            return;
        }
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(self);
        *slot = Some(RenewalTask::spawn(self.config.renew_interval, move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                if !inner.cell.is_authenticated() {
                    debug!("renewal tick without a session; stopping");
                    return ControlFlow::Break(());
                }
                if !inner.refresh_token().await {
                    debug!("background renewal failed; keeping session");
                }
                ControlFlow::Continue(())
            }
        }));
    }

    fn stop_renewal(&self) {
        let task = self.renewal.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.cancel();
        }
    }
}

/// Clears `is_loading` when dropped, including when `init` is cancelled.
struct LoadingGuard<'a>(&'a SessionCell);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_loading();
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
