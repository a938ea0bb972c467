//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling how instances are built and shared
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{Lifetime, Locator};
///
/// let mut locator = Locator::new();
/// locator.add_singleton("config", |_| String::from("postgres://localhost"));
/// locator.add_transient("id", |_| 7u32);
/// locator.add_scoped("user", |parts, _| parts.uri.path().to_string());
///
/// assert_eq!(locator.lifetime_of("config"), Some(Lifetime::Singleton));
/// assert_eq!(locator.lifetime_of("id"), Some(Lifetime::Transient));
/// assert_eq!(locator.lifetime_of("user"), Some(Lifetime::Scoped));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// New instance per resolution, never cached
    Transient,
    /// Single instance per locator, built on first resolution and cached forever
    ///
    /// The same `Arc` is handed to every caller on every thread. Best for
    /// expensive shared resources such as connection pools or clients.
    Singleton,
    /// Single instance per inbound request
    ///
    /// Built eagerly by the request interceptor before the handler runs and
    /// only reachable through [`Locator::resolve_scoped`](crate::Locator::resolve_scoped).
    Scoped,
}

impl Lifetime {
    pub(crate) fn access_hint(&self) -> &'static str {
        match self {
            Lifetime::Scoped => "use resolve_scoped with the request context",
            Lifetime::Transient | Lifetime::Singleton => "use resolve instead of resolve_scoped",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifetime::Transient => "transient",
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
        };
        f.write_str(name)
    }
}
