//! Error types for the service locator.

use std::sync::Arc;

use crate::lifetime::Lifetime;

/// Error type returned by fallible builders.
///
/// Anything convertible into a boxed error works, so builders can use `?` on
/// I/O, parsing or driver errors without wrapping them first.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Locator errors
///
/// Every condition here is recoverable: the caller (usually request-handling
/// code) decides whether to turn it into an error response or escalate.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{Locator, LocatorError};
///
/// let locator = Locator::new();
/// match locator.resolve("database") {
///     Err(LocatorError::NotFound(name)) => assert_eq!(name, "database"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocatorError {
    /// No registration under this name, or the scoped value is absent from the
    /// request context.
    #[error("Service not found: {0}")]
    NotFound(String),
    /// The access path does not match the registered lifetime.
    #[error("Wrong access pattern for {name}: registered as {registered}, {}", .registered.access_hint())]
    WrongAccessPattern {
        name: String,
        registered: Lifetime,
    },
    /// A typed helper could not downcast the resolved value.
    #[error("Type mismatch for {name}: expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
    /// The builder returned an error.
    #[error("Builder for {name} failed: {source}")]
    Builder {
        name: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
    /// The builder panicked.
    #[error("Builder for {name} panicked: {message}")]
    BuilderPanicked { name: String, message: String },
}

impl LocatorError {
    /// Name of the service the error refers to.
    pub fn service_name(&self) -> &str {
        match self {
            LocatorError::NotFound(name) => name,
            LocatorError::WrongAccessPattern { name, .. }
            | LocatorError::TypeMismatch { name, .. }
            | LocatorError::Builder { name, .. }
            | LocatorError::BuilderPanicked { name, .. } => name,
        }
    }

    pub(crate) fn builder(name: &str, source: BoxError) -> Self {
        LocatorError::Builder {
            name: name.to_string(),
            source: Arc::from(source),
        }
    }
}

/// Result type for locator operations
pub type LocatorResult<T> = Result<T, LocatorError>;
