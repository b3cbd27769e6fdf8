//! Per-call cancellation and deadlines.
//!
//! A `Context` bounds a single client call. It is independent of the
//! transport's own timeout: whichever fires first ends the call with
//! `Error::Transport`.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl Context {
    /// A context that never cancels and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self::background().cancel_on(token)
    }

    /// Also end the call when `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Tighten the deadline to `timeout` from now. Never extends an earlier one.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is already done, if it is.
    pub fn err(&self) -> Option<Error> {
        if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Some(Error::Transport("context canceled".to_string()));
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Some(Error::Transport("context deadline exceeded".to_string()));
        }
        None
    }

    /// Drive `fut` to completion unless the context fires first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            res = fut => res,
            _ = cancelled => Err(Error::Transport("context canceled".to_string())),
            _ = expired => Err(Error::Transport("context deadline exceeded".to_string())),
        }
    }
}
