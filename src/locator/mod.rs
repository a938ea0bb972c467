//! The service locator.
//!
//! [`Locator`] owns every registration and resolves services by name according
//! to their [`Lifetime`].

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::http::request::Parts;

use crate::error::{BoxError, LocatorError, LocatorResult};
use crate::internal::invoke_builder;
use crate::lifetime::Lifetime;
use crate::observer::{LocatorObserver, Observers};
use crate::registration::{AnyArc, Registration, RegistrationKind, Registry};

pub mod scope;
pub use scope::{RequestScope, ScopeSource};

/// Named service locator.
///
/// Services are registered at startup while the locator is still exclusively
/// owned, then the locator is wrapped in an `Arc` and shared with the server.
/// From that point on the registration table is read-only; the only shared
/// mutable state is each singleton's one-time-initialisation cell.
///
/// Registering a second service under an existing name replaces the first,
/// whatever the lifetimes involved. This is intentional last-write-wins
/// behaviour and lets tests or later modules override defaults.
///
/// # Thread Safety
///
/// `Locator` is `Send + Sync`. Concurrent first resolutions of a singleton
/// invoke its builder at most once; the other callers block until the value
/// is ready and then share it.
///
/// # Examples
///
/// ```
/// use ferrous_locator::Locator;
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut locator = Locator::new();
/// locator.add_singleton("db", |_| Database { url: "postgres://localhost".to_string() });
/// locator.try_add_transient("users", |loc| {
///     Ok::<_, ferrous_locator::LocatorError>(UserService { db: loc.resolve_as::<Database>("db")? })
/// });
///
/// let users = locator.resolve_as::<UserService>("users").unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
#[derive(Default)]
pub struct Locator {
    pub(crate) registry: Registry,
    pub(crate) observers: Observers,
}

impl Locator {
    /// Creates an empty locator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transient service: the builder runs on every [`resolve`](Self::resolve).
    ///
    /// The builder receives the locator so it can resolve its own dependencies.
    pub fn add_transient<T, F>(&mut self, name: impl Into<String>, builder: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&Locator) -> T + Send + Sync + 'static,
    {
        self.try_add_transient(name, move |loc| Ok::<T, Infallible>(builder(loc)))
    }

    /// Registers a transient service with a fallible builder.
    pub fn try_add_transient<T, E, F>(&mut self, name: impl Into<String>, builder: F) -> &mut Self
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(&Locator) -> Result<T, E> + Send + Sync + 'static,
    {
        let registration = Registration::transient(erase_shared(builder), type_name::<T>());
        self.register(name.into(), registration)
    }

    /// Registers a singleton service: the builder runs once, on first resolution.
    ///
    /// The builder must not resolve its own name, directly or through other
    /// singletons: initialisation is not re-entrant and such a cycle blocks forever.
    pub fn add_singleton<T, F>(&mut self, name: impl Into<String>, builder: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&Locator) -> T + Send + Sync + 'static,
    {
        self.try_add_singleton(name, move |loc| Ok::<T, Infallible>(builder(loc)))
    }

    /// Registers a singleton service with a fallible builder.
    ///
    /// A failed build leaves the singleton unbuilt; the next resolution retries.
    /// The same no-self-resolution rule as [`add_singleton`](Self::add_singleton) applies.
    pub fn try_add_singleton<T, E, F>(&mut self, name: impl Into<String>, builder: F) -> &mut Self
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(&Locator) -> Result<T, E> + Send + Sync + 'static,
    {
        let registration = Registration::singleton(erase_shared(builder), type_name::<T>());
        self.register(name.into(), registration)
    }

    /// Registers an already-built value as a singleton.
    pub fn add_instance<T>(&mut self, name: impl Into<String>, value: T) -> &mut Self
    where
        T: Any + Send + Sync,
    {
        let registration = Registration::instance(Arc::new(value), type_name::<T>());
        self.register(name.into(), registration)
    }

    /// Registers a request-scoped service.
    ///
    /// The builder runs once per inbound request, before the handler, and
    /// receives the request head along with the locator. Scoped builders may
    /// resolve transient and singleton services but not other scoped ones:
    /// no request scope exists yet while they run.
    pub fn add_scoped<T, F>(&mut self, name: impl Into<String>, builder: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&Parts, &Locator) -> T + Send + Sync + 'static,
    {
        self.try_add_scoped(name, move |parts, loc| Ok::<T, Infallible>(builder(parts, loc)))
    }

    /// Registers a request-scoped service with a fallible builder.
    ///
    /// A failing builder aborts the whole request scope.
    pub fn try_add_scoped<T, E, F>(&mut self, name: impl Into<String>, builder: F) -> &mut Self
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(&Parts, &Locator) -> Result<T, E> + Send + Sync + 'static,
    {
        let erased = Box::new(move |parts: &Parts, loc: &Locator| -> Result<AnyArc, BoxError> {
            builder(parts, loc)
                .map(|value| Arc::new(value) as AnyArc)
                .map_err(Into::into)
        });
        let registration = Registration::scoped(erased, type_name::<T>());
        self.register(name.into(), registration)
    }

    /// Adds an observer that is notified of resolution and scope events.
    pub fn add_observer<O>(&mut self, observer: O) -> &mut Self
    where
        O: LocatorObserver + 'static,
    {
        self.observers.add(Arc::new(observer));
        self
    }

    fn register(&mut self, name: String, registration: Registration) -> &mut Self {
        let lifetime = registration.lifetime();
        let type_name = registration.type_name;
        match self.registry.insert(name.clone(), registration) {
            Some(previous) => tracing::debug!(
                service = %name,
                %lifetime,
                previous = %previous.lifetime(),
                type_name,
                "replacing service registration"
            ),
            None => tracing::debug!(service = %name, %lifetime, type_name, "service registered"),
        }
        self
    }

    /// Resolves a transient or singleton service by name.
    ///
    /// # Errors
    ///
    /// * [`LocatorError::NotFound`] if nothing is registered under `name`
    /// * [`LocatorError::WrongAccessPattern`] if `name` is a scoped service
    /// * [`LocatorError::Builder`] / [`LocatorError::BuilderPanicked`] if the builder fails
    pub fn resolve(&self, name: &str) -> LocatorResult<AnyArc> {
        let registration = self.lookup(name)?;
        self.observed(name, registration.lifetime(), || match &registration.kind {
            RegistrationKind::Transient { builder } => invoke_builder(name, || builder(self)),
            RegistrationKind::Singleton { builder, cell } => cell
                .get_or_try_init(|| {
                    let value = invoke_builder(name, || builder(self))?;
                    tracing::debug!(service = name, "singleton built");
                    Ok(value)
                })
                .map(Arc::clone),
            RegistrationKind::Instance { value } => Ok(Arc::clone(value)),
            RegistrationKind::Scoped { .. } => Err(LocatorError::WrongAccessPattern {
                name: name.to_string(),
                registered: Lifetime::Scoped,
            }),
        })
    }

    /// Resolves a transient or singleton service and downcasts it to `T`.
    pub fn resolve_as<T>(&self, name: &str) -> LocatorResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast(name, self.resolve(name)?)
    }

    /// Retrieves the instance of a scoped service built for the current request.
    ///
    /// `ctx` is anything carrying the request scope: the [`RequestScope`]
    /// itself, the request, its [`Parts`] or its extensions.
    ///
    /// # Errors
    ///
    /// * [`LocatorError::NotFound`] if nothing is registered under `name`, or
    ///   the interceptor did not build a value for it in this request
    /// * [`LocatorError::WrongAccessPattern`] if `name` is not a scoped service
    pub fn resolve_scoped<C>(&self, ctx: &C, name: &str) -> LocatorResult<AnyArc>
    where
        C: ScopeSource + ?Sized,
    {
        let registration = self.lookup(name)?;
        let lifetime = registration.lifetime();
        self.observed(name, lifetime, || match lifetime {
            Lifetime::Scoped => ctx
                .request_scope()
                .and_then(|scope| scope.get(name))
                .ok_or_else(|| LocatorError::NotFound(name.to_string())),
            registered => Err(LocatorError::WrongAccessPattern {
                name: name.to_string(),
                registered,
            }),
        })
    }

    /// Retrieves a scoped instance and downcasts it to `T`.
    pub fn resolve_scoped_as<T, C>(&self, ctx: &C, name: &str) -> LocatorResult<Arc<T>>
    where
        T: Any + Send + Sync,
        C: ScopeSource + ?Sized,
    {
        downcast(name, self.resolve_scoped(ctx, name)?)
    }

    /// Builds every scoped service for one request.
    ///
    /// All scoped registrations are built eagerly, whether or not the handler
    /// will use them. The first failing builder aborts the pass and its error
    /// is returned; a partially built scope is never handed out. Build order
    /// across scoped services is unspecified.
    ///
    /// Builders see `parts` as passed in. [`ScopeLayer`](crate::ScopeLayer)
    /// strips any stale [`RequestScope`] from the extensions first, so that a
    /// scoped builder can never observe another scoped value.
    pub fn build_scope(&self, parts: &Parts) -> LocatorResult<RequestScope> {
        let start = Instant::now();
        let mut values = HashMap::new();

        for (name, builder) in self.registry.scoped() {
            match invoke_builder(name, || builder(parts, self)) {
                Ok(value) => {
                    values.insert(name.to_string(), value);
                }
                Err(error) => {
                    tracing::debug!(service = name, %error, "scoped builder failed");
                    self.observers.scope_failed(name, &error);
                    return Err(error);
                }
            }
        }

        let scope = RequestScope::new(values);
        self.observers.scope_built(scope.len(), start.elapsed());
        Ok(scope)
    }

    /// Returns true if a service is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.registry.get(name).is_some()
    }

    /// Lifetime of the service registered under `name`.
    pub fn lifetime_of(&self, name: &str) -> Option<Lifetime> {
        self.registry.get(name).map(Registration::lifetime)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, name: &str) -> LocatorResult<&Registration> {
        self.registry.get(name).ok_or_else(|| {
            let error = LocatorError::NotFound(name.to_string());
            if !self.observers.is_empty() {
                self.observers.resolution_failed(name, &error, Default::default());
            }
            error
        })
    }

    #[inline]
    fn observed<F>(&self, name: &str, lifetime: Lifetime, resolve: F) -> LocatorResult<AnyArc>
    where
        F: FnOnce() -> LocatorResult<AnyArc>,
    {
        tracing::trace!(service = name, %lifetime, "resolve");
        if self.observers.is_empty() {
            return resolve();
        }

        self.observers.resolving(name, lifetime);
        let start = Instant::now();
        let result = resolve();
        match &result {
            Ok(_) => self.observers.resolved(name, lifetime, start.elapsed()),
            Err(error) => self.observers.resolution_failed(name, error, start.elapsed()),
        }
        result
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut services: Vec<(&str, Lifetime)> = self
            .registry
            .iter()
            .map(|(name, reg)| (name, reg.lifetime()))
            .collect();
        services.sort_unstable_by_key(|(name, _)| *name);
        f.debug_struct("Locator")
            .field("services", &services)
            .field("observers", &self.observers.len())
            .finish()
    }
}

fn erase_shared<T, E, F>(builder: F) -> crate::registration::SharedBuilder
where
    T: Any + Send + Sync,
    E: Into<BoxError>,
    F: Fn(&Locator) -> Result<T, E> + Send + Sync + 'static,
{
    Box::new(move |loc: &Locator| -> Result<AnyArc, BoxError> {
        builder(loc)
            .map(|value| Arc::new(value) as AnyArc)
            .map_err(Into::into)
    })
}

fn downcast<T>(name: &str, value: AnyArc) -> LocatorResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    value.downcast::<T>().map_err(|_| LocatorError::TypeMismatch {
        name: name.to_string(),
        expected: type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parts() -> Parts {
        Request::get("/").body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_locator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Locator>();
        assert_send_sync::<RequestScope>();
    }

    #[test]
    fn test_instance_is_prebuilt() {
        let mut locator = Locator::new();
        locator.add_instance("port", 8080u16);

        assert!(locator.registry.get("port").unwrap().is_instantiated());
        assert_eq!(locator.lifetime_of("port"), Some(Lifetime::Singleton));

        let first = locator.resolve("port").unwrap();
        let second = locator.resolve("port").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*locator.resolve_as::<u16>("port").unwrap(), 8080);

        let report = locator.prewarm_singletons();
        assert!(report.is_ready());
        assert_eq!(report.warmed, vec!["port".to_string()]);
    }

    #[test]
    fn test_failed_singleton_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let mut locator = Locator::new();
        locator.try_add_singleton("flaky", move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("not yet")
            } else {
                Ok(7u8)
            }
        });

        assert!(matches!(locator.resolve("flaky"), Err(LocatorError::Builder { .. })));
        assert!(!locator.registry.get("flaky").unwrap().is_instantiated());

        assert_eq!(*locator.resolve_as::<u8>("flaky").unwrap(), 7);
        assert_eq!(*locator.resolve_as::<u8>("flaky").unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_scope_for_no_scoped_registrations() {
        let mut locator = Locator::new();
        locator.add_transient("a", |_| 1u8);

        let scope = locator.build_scope(&parts()).unwrap();
        assert!(scope.is_empty());
    }

    #[test]
    fn test_debug_lists_services_sorted() {
        let mut locator = Locator::new();
        locator.add_transient("b", |_| 1u8);
        locator.add_singleton("a", |_| 2u8);

        let rendered = format!("{locator:?}");
        assert!(rendered.find("\"a\"").unwrap() < rendered.find("\"b\"").unwrap());
    }
}
