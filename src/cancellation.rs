//! Per-request cancellation tokens.
//!
//! The interceptor attaches a [`CancellationToken`] to every request before
//! scoped services are built. It is cancelled if the request future is dropped
//! before completing, so long-running builders and handlers can stop early.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// A token that signals cancellation of the request it belongs to.
///
/// Scoped builders read it from the request extensions; handlers get it from
/// [`RequestServices::cancellation`](crate::axum_integration::RequestServices::cancellation).
///
/// # Examples
///
/// ```
/// use ferrous_locator::{CancellationToken, Locator};
///
/// let mut locator = Locator::new();
/// locator.try_add_scoped("report", |parts, _| {
///     if let Some(token) = parts.extensions.get::<CancellationToken>() {
///         token.throw_if_cancelled()?;
///     }
///     Ok::<_, ferrous_locator::CancellationError>(String::from("report"))
/// });
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

#[derive(Debug)]
struct CancellationTokenInner {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
    created_at: Instant,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                parent: None,
                created_at: Instant::now(),
            }),
        }
    }

    /// Creates a child token that is cancelled when either it or this token is.
    ///
    /// ```
    /// use ferrous_locator::CancellationToken;
    ///
    /// let request = CancellationToken::new();
    /// let query = request.child_token();
    ///
    /// request.cancel();
    /// assert!(query.is_cancelled());
    /// ```
    pub fn child_token(&self) -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
                created_at: Instant::now(),
            }),
        }
    }

    /// Cancels the token.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Returns true if this token or any ancestor has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }

        match self.inner.parent {
            Some(ref parent) => parent.is_cancelled(),
            None => false,
        }
    }

    /// Returns an error if the token is cancelled.
    pub fn throw_if_cancelled(&self) -> Result<(), CancellationError> {
        if self.is_cancelled() {
            Err(CancellationError::new("request was cancelled"))
        } else {
            Ok(())
        }
    }

    /// Time since the token was created, i.e. since the request entered the interceptor.
    pub fn elapsed(&self) -> Duration {
        self.inner.created_at.elapsed()
    }

    /// Returns a guard that cancels this token when dropped, unless disarmed.
    pub fn drop_guard(&self) -> DropGuard {
        DropGuard {
            token: Some(self.clone()),
        }
    }

    /// Completes once the token is cancelled.
    ///
    /// ```
    /// use ferrous_locator::CancellationToken;
    ///
    /// # async fn example() {
    /// let token = CancellationToken::new();
    /// tokio::select! {
    ///     _ = slow_query() => {}
    ///     _ = token.cancelled() => return,
    /// }
    /// # }
    /// # async fn slow_query() {}
    /// ```
    #[cfg(feature = "async")]
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels its token on drop unless [`disarm`](DropGuard::disarm)ed.
#[derive(Debug)]
pub struct DropGuard {
    token: Option<CancellationToken>,
}

impl DropGuard {
    /// Consumes the guard without cancelling, returning the token.
    pub fn disarm(mut self) -> CancellationToken {
        self.token.take().unwrap_or_default()
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

/// Error returned by [`CancellationToken::throw_if_cancelled`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("Cancellation error: {message}")]
pub struct CancellationError {
    message: String,
}

impl CancellationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_basic() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_child_token_cancellation() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_token_independent_cancellation() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        child.cancel();
        assert!(!parent.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_throw_if_cancelled() {
        let token = CancellationToken::new();
        assert!(token.throw_if_cancelled().is_ok());

        token.cancel();
        let err = token.throw_if_cancelled().unwrap_err();
        assert_eq!(err.to_string(), "Cancellation error: request was cancelled");
    }

    #[test]
    fn test_drop_guard_cancels() {
        let token = CancellationToken::new();
        drop(token.drop_guard());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_disarmed_guard_does_not_cancel() {
        let token = CancellationToken::new();
        let returned = token.drop_guard().disarm();
        assert!(!token.is_cancelled());
        assert!(!returned.is_cancelled());
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_cancelled_future() {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token_clone.cancel();
        });

        token.cancelled().await;
        assert!(token.is_cancelled());
    }
}
