//! Module system for grouped registration.

use crate::error::LocatorResult;
use crate::locator::Locator;

/// A group of related registrations.
///
/// # Example
///
/// ```rust
/// use ferrous_locator::{Locator, LocatorModule, LocatorResult};
///
/// struct StorageModule {
///     url: String,
/// }
///
/// impl LocatorModule for StorageModule {
///     fn register(self, locator: &mut Locator) -> LocatorResult<()> {
///         let url = self.url;
///         locator.add_singleton("storage.url", move |_| url.clone());
///         locator.try_add_transient("storage.session", |loc| {
///             let url = loc.resolve_as::<String>("storage.url")?;
///             Ok::<_, ferrous_locator::LocatorError>(format!("session on {url}"))
///         });
///         Ok(())
///     }
/// }
///
/// # fn main() -> LocatorResult<()> {
/// let mut locator = Locator::new();
/// locator.add_module(StorageModule { url: "sqlite::memory:".into() })?;
/// assert!(locator.contains("storage.session"));
/// # Ok(())
/// # }
/// ```
pub trait LocatorModule {
    /// Registers this module's services.
    fn register(self, locator: &mut Locator) -> LocatorResult<()>;
}

impl<F> LocatorModule for F
where
    F: FnOnce(&mut Locator) -> LocatorResult<()>,
{
    fn register(self, locator: &mut Locator) -> LocatorResult<()> {
        self(locator)
    }
}

impl Locator {
    /// Applies a module's registrations. Later modules override earlier ones.
    pub fn add_module<M: LocatorModule>(&mut self, module: M) -> LocatorResult<&mut Self> {
        module.register(self)?;
        Ok(self)
    }
}
