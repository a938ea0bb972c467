//! Observation hooks for resolution and request-scope events.
//!
//! Observers give structured visibility into what the locator is doing without
//! the locator committing to a logging backend. [`TracingObserver`] forwards
//! every event to `tracing`.

use std::sync::Arc;
use std::time::Duration;

use crate::error::LocatorError;
use crate::lifetime::Lifetime;

/// Observer trait for locator events.
///
/// All hooks have empty default implementations. They are called synchronously
/// on the resolving thread, so keep them cheap.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{Lifetime, Locator, LocatorObserver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counting(AtomicUsize);
///
/// impl LocatorObserver for Counting {
///     fn resolved(&self, _name: &str, _lifetime: Lifetime, _elapsed: Duration) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let counting = Arc::new(Counting::default());
/// let mut locator = Locator::new();
/// locator.add_observer(counting.clone());
/// locator.add_transient("answer", |_| 42u32);
///
/// locator.resolve("answer").unwrap();
/// locator.resolve("answer").unwrap();
/// assert_eq!(counting.0.load(Ordering::Relaxed), 2);
/// ```
pub trait LocatorObserver: Send + Sync {
    /// Called before a registered service is resolved.
    fn resolving(&self, _name: &str, _lifetime: Lifetime) {}

    /// Called after a successful resolution.
    fn resolved(&self, _name: &str, _lifetime: Lifetime, _elapsed: Duration) {}

    /// Called when a resolution fails, including unknown names.
    fn resolution_failed(&self, _name: &str, _error: &LocatorError, _elapsed: Duration) {}

    /// Called after every scoped service for a request has been built.
    fn scope_built(&self, _services: usize, _elapsed: Duration) {}

    /// Called when a scoped builder fails and the request scope is abandoned.
    fn scope_failed(&self, _name: &str, _error: &LocatorError) {}
}

impl<O: LocatorObserver + ?Sized> LocatorObserver for Arc<O> {
    fn resolving(&self, name: &str, lifetime: Lifetime) {
        (**self).resolving(name, lifetime)
    }

    fn resolved(&self, name: &str, lifetime: Lifetime, elapsed: Duration) {
        (**self).resolved(name, lifetime, elapsed)
    }

    fn resolution_failed(&self, name: &str, error: &LocatorError, elapsed: Duration) {
        (**self).resolution_failed(name, error, elapsed)
    }

    fn scope_built(&self, services: usize, elapsed: Duration) {
        (**self).scope_built(services, elapsed)
    }

    fn scope_failed(&self, name: &str, error: &LocatorError) {
        (**self).scope_failed(name, error)
    }
}

/// Observer that emits a `tracing` event for every hook.
///
/// Successful resolutions are logged at `TRACE`, scope passes at `DEBUG` and
/// failures at `WARN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl LocatorObserver for TracingObserver {
    fn resolving(&self, name: &str, lifetime: Lifetime) {
        tracing::trace!(service = name, %lifetime, "resolving service");
    }

    fn resolved(&self, name: &str, lifetime: Lifetime, elapsed: Duration) {
        tracing::trace!(
            service = name,
            %lifetime,
            elapsed_us = elapsed.as_micros() as u64,
            "service resolved"
        );
    }

    fn resolution_failed(&self, name: &str, error: &LocatorError, elapsed: Duration) {
        tracing::warn!(
            service = name,
            %error,
            elapsed_us = elapsed.as_micros() as u64,
            "service resolution failed"
        );
    }

    fn scope_built(&self, services: usize, elapsed: Duration) {
        tracing::debug!(services, elapsed_us = elapsed.as_micros() as u64, "request scope built");
    }

    fn scope_failed(&self, name: &str, error: &LocatorError) {
        tracing::warn!(service = name, %error, "request scope build failed");
    }
}

/// Observers registered on a locator
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn LocatorObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn LocatorObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn resolving(&self, name: &str, lifetime: Lifetime) {
        for observer in &self.observers {
            observer.resolving(name, lifetime);
        }
    }

    pub(crate) fn resolved(&self, name: &str, lifetime: Lifetime, elapsed: Duration) {
        for observer in &self.observers {
            observer.resolved(name, lifetime, elapsed);
        }
    }

    pub(crate) fn resolution_failed(&self, name: &str, error: &LocatorError, elapsed: Duration) {
        for observer in &self.observers {
            observer.resolution_failed(name, error, elapsed);
        }
    }

    pub(crate) fn scope_built(&self, services: usize, elapsed: Duration) {
        for observer in &self.observers {
            observer.scope_built(services, elapsed);
        }
    }

    pub(crate) fn scope_failed(&self, name: &str, error: &LocatorError) {
        for observer in &self.observers {
            observer.scope_failed(name, error);
        }
    }
}
