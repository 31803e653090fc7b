//! Cooperative cancellation for executions.
//!
//! The executor checks the token between sibling batches and before each
//! resolver dispatch. Cancelling discards partial results; errors collected
//! before the cancellation are returned together with a top-level
//! `cancelled` error. Timeouts stay host-side; the deadline variant only
//! saves the host the racing boilerplate.

use std::time::{Duration, Instant};

/// A cancellation token, optionally carrying a deadline.
#[derive(Debug, Default, Clone)]
pub struct CancellationToken(tokio_util::sync::CancellationToken, Option<Instant>);

impl CancellationToken {
    /// Creates a new token.
    pub fn new() -> Self {
        Self(tokio_util::sync::CancellationToken::new(), None)
    }

    /// Creates a token that cancels itself after the given duration.
    pub fn with_timeout(duration: Duration) -> Self {
        let deadline = Instant::now() + duration;
        Self(tokio_util::sync::CancellationToken::new(), Some(deadline))
    }

    /// Cancels the token. Clones share the cancelled state.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Returns an error if the token was cancelled or the deadline passed.
    #[inline]
    pub fn bail_if_cancelled(&self) -> Result<(), CancellationError> {
        if let Some(deadline) = self.1 {
            if deadline <= Instant::now() {
                self.cancel();
                return Err(CancellationError::TimedOut);
            }
        }
        if self.0.is_cancelled() {
            return Err(CancellationError::Cancelled);
        }
        Ok(())
    }
}

/// Why an execution stopped early.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CancellationError {
    #[error("execution was cancelled")]
    Cancelled,
    #[error("execution timed out")]
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(token.bail_if_cancelled().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_across_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(matches!(
            clone.bail_if_cancelled(),
            Err(CancellationError::Cancelled)
        ));
    }

    #[test]
    fn test_elapsed_deadline_cancels() {
        let token = CancellationToken::with_timeout(Duration::from_secs(0));
        assert!(matches!(
            token.bail_if_cancelled(),
            Err(CancellationError::TimedOut)
        ));
    }
}
