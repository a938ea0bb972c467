//! Per-request scoped value sets.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::request::Parts;
use axum::http::{Extensions, Request};

use crate::registration::AnyArc;

/// Scoped instances built for a single inbound request.
///
/// A `RequestScope` is produced once per request by
/// [`Locator::build_scope`](crate::Locator::build_scope) (normally through the
/// [`ScopeLayer`](crate::ScopeLayer) interceptor) and attached to the request's
/// extensions. It is immutable afterwards and cheap to clone; all clones share
/// the same instances, and the instances are dropped together with the request.
///
/// # Examples
///
/// ```
/// use ferrous_locator::Locator;
/// use axum::http::Request;
///
/// let mut locator = Locator::new();
/// locator.add_scoped("path", |parts, _| parts.uri.path().to_string());
///
/// let (parts, _) = Request::get("/users/7").body(()).unwrap().into_parts();
/// let scope = locator.build_scope(&parts).unwrap();
///
/// let path = locator.resolve_scoped_as::<String, _>(&scope, "path").unwrap();
/// assert_eq!(*path, "/users/7");
/// ```
#[derive(Clone, Default)]
pub struct RequestScope {
    values: Arc<HashMap<String, AnyArc>>,
}

impl RequestScope {
    pub(crate) fn new(values: HashMap<String, AnyArc>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// Returns the instance built for `name` in this request, if any.
    pub fn get(&self, name: &str) -> Option<AnyArc> {
        self.values.get(name).cloned()
    }

    /// Returns true if an instance was built for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names of every instance in this scope, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("RequestScope").field("services", &names).finish()
    }
}

/// Anything a [`RequestScope`] can be read from.
///
/// Implemented for the scope itself and for the `http` request types the
/// interceptor attaches it to, so handlers can pass whatever they hold.
pub trait ScopeSource {
    /// The request scope, or `None` if the interceptor has not run.
    fn request_scope(&self) -> Option<&RequestScope>;
}

impl ScopeSource for RequestScope {
    fn request_scope(&self) -> Option<&RequestScope> {
        Some(self)
    }
}

impl ScopeSource for Extensions {
    fn request_scope(&self) -> Option<&RequestScope> {
        self.get::<RequestScope>()
    }
}

impl ScopeSource for Parts {
    fn request_scope(&self) -> Option<&RequestScope> {
        self.extensions.get::<RequestScope>()
    }
}

impl<B> ScopeSource for Request<B> {
    fn request_scope(&self) -> Option<&RequestScope> {
        self.extensions().get::<RequestScope>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope_with(name: &str, value: u32) -> RequestScope {
        let mut values: HashMap<String, AnyArc> = HashMap::new();
        values.insert(name.to_string(), Arc::new(value));
        RequestScope::new(values)
    }

    #[test]
    fn test_clones_share_instances() {
        let scope = scope_with("counter", 3);
        let clone = scope.clone();

        let a = scope.get("counter").unwrap();
        let b = clone.get("counter").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_sources_without_scope() {
        let request = Request::new(());
        assert!(request.request_scope().is_none());

        let (parts, _) = request.into_parts();
        assert!(parts.request_scope().is_none());
        assert!(parts.extensions.request_scope().is_none());
    }

    #[test]
    fn test_sources_with_scope() {
        let mut request = Request::new(());
        request.extensions_mut().insert(scope_with("counter", 9));

        let scope = request.request_scope().unwrap();
        assert!(scope.contains("counter"));
        assert_eq!(scope.len(), 1);
        assert!(!scope.is_empty());
    }
}
