//! Request context for storage operations.
//!
//! Every repository and store operation takes a [`RequestContext`]. It carries
//! the caller's cancellation signal and deadline into the storage layer so a
//! request abandoned by the API layer stops touching the database, and so a
//! transaction interrupted half-way is rolled back instead of committed.
//!
//! ```
//! use std::time::Duration;
//! use model_registry_persistence::RequestContext;
//!
//! let (ctx, handle) = RequestContext::cancellable();
//! let ctx = ctx
//!     .with_timeout(Duration::from_secs(5))
//!     .with_correlation_id("req-42");
//!
//! assert!(!ctx.is_cancelled());
//! handle.cancel();
//! assert!(ctx.is_cancelled());
//! assert!(ctx.check().is_err());
//! ```

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{StorageResult, TransactionError};

/// Per-request context carrying cancellation and deadline information.
///
/// Cloning a context is cheap; clones observe the same cancellation signal.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Optional correlation ID for request tracing.
    correlation_id: Option<String>,
    /// When the context was created.
    started: Instant,
    /// Absolute deadline, if any.
    deadline: Option<Instant>,
    /// Cancellation signal; `true` once the caller has cancelled.
    cancel: Option<watch::Receiver<bool>>,
}

/// The caller's side of a cancellable [`RequestContext`].
///
/// Dropping the handle without calling [`CancelHandle::cancel`] leaves the
/// context uncancelled.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals cancellation to every clone of the associated context.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Creates a context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self {
            correlation_id: None,
            started: Instant::now(),
            deadline: None,
            cancel: None,
        }
    }

    /// Creates a context together with the handle that cancels it.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            cancel: Some(rx),
            ..Self::new()
        };
        (ctx, CancelHandle { tx })
    }

    /// Sets a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    /// Sets an absolute deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Creates a context with the specified correlation ID for tracing.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Returns the correlation ID, if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Returns the deadline, if set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true once the caller has cancelled this request.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Returns an error if the request was cancelled or its deadline passed.
    pub fn check(&self) -> StorageResult<()> {
        if self.is_cancelled() {
            return Err(TransactionError::Cancelled.into());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(self.deadline_error().into());
            }
        }
        Ok(())
    }

    /// Resolves when the request is cancelled or its deadline passes.
    ///
    /// Never resolves for a context with neither a deadline nor a live
    /// cancellation handle.
    pub async fn done(&self) -> TransactionError {
        let cancelled = async {
            if let Some(rx) = &self.cancel {
                let mut rx = rx.clone();
                if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                    return;
                }
            }
            std::future::pending::<()>().await
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancelled => TransactionError::Cancelled,
            _ = expired => self.deadline_error(),
        }
    }

    fn deadline_error(&self) -> TransactionError {
        TransactionError::DeadlineExceeded {
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}
