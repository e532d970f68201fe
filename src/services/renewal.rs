//! Background session renewal.
//!
//! DESIGN
//! ======
//! A renewal is a repeating tokio task that calls its tick closure once per
//! period, starting one full period after spawn (the session was just
//! established or verified when the task starts). The `RenewalTask` handle
//! owns the task: cancelling it or dropping it aborts the task, so no timer
//! outlives the session that started it.
//!
//! Ticks are sequential. A slow tick delays the next one instead of
//! stacking concurrent refresh calls.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug)]
pub struct RenewalTask {
    handle: JoinHandle<()>,
}

impl RenewalTask {
    /// Spawn a task that awaits `tick()` every `period` until it returns
    /// `ControlFlow::Break` or the handle is cancelled.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        tracing::debug!(period_secs = period.as_secs_f64(), "renewal task started");
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tick().await.is_break() {
                    tracing::debug!("renewal task stopped by owner");
                    break;
                }
            }
        });
        Self { handle }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the task. Equivalent to dropping the handle.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for RenewalTask {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            tracing::debug!("renewal task cancelled");
        }
        self.handle.abort();
    }
}

#[cfg(test)]
#[path = "renewal_test.rs"]
mod tests;
