//! Axum integration for ferrous-locator.
//!
//! - [`RequestServices`] extracts the locator and the request scope placed by
//!   [`ScopeLayer`] so handlers can resolve services.
//! - [`LocatorError`] converts into a `500` response, so handlers can
//!   return `Result<_, LocatorError>` and a misused service only fails the
//!   request it belongs to.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Router,
};

use crate::cancellation::CancellationToken;
use crate::error::{LocatorError, LocatorResult};
use crate::interceptor::ScopeLayer;
use crate::locator::{Locator, RequestScope};
use crate::registration::AnyArc;

/// Extractor giving handlers access to the locator and their request scope
///
/// # Examples
///
/// ```
/// use ferrous_locator::{axum_integration::RequestServices, LocatorError};
///
/// async fn whoami(services: RequestServices) -> Result<String, LocatorError> {
///     let user = services.resolve_scoped_as::<String>("user")?;
///     Ok(format!("hello {user}"))
/// }
/// ```
#[derive(Clone, Debug)]
pub struct RequestServices {
    locator: Arc<Locator>,
    scope: RequestScope,
    cancellation: CancellationToken,
}

impl RequestServices {
    /// Resolves a transient or singleton service.
    pub fn resolve(&self, name: &str) -> LocatorResult<AnyArc> {
        self.locator.resolve(name)
    }

    pub fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> LocatorResult<Arc<T>> {
        self.locator.resolve_as(name)
    }

    /// Retrieves a scoped service built for this request.
    pub fn resolve_scoped(&self, name: &str) -> LocatorResult<AnyArc> {
        self.locator.resolve_scoped(&self.scope, name)
    }

    pub fn resolve_scoped_as<T: Any + Send + Sync>(&self, name: &str) -> LocatorResult<Arc<T>> {
        self.locator.resolve_scoped_as(&self.scope, name)
    }

    /// Cancellation token of this request.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn scope(&self) -> &RequestScope {
        &self.scope
    }

    pub fn locator(&self) -> &Arc<Locator> {
        &self.locator
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestServices
where
    S: Send + Sync,
{
    type Rejection = LocatorRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locator = parts
            .extensions
            .get::<Arc<Locator>>()
            .cloned()
            .ok_or(LocatorRejection::MissingInterceptor)?;
        let scope = parts
            .extensions
            .get::<RequestScope>()
            .cloned()
            .ok_or(LocatorRejection::MissingInterceptor)?;
        let cancellation = parts
            .extensions
            .get::<CancellationToken>()
            .cloned()
            .unwrap_or_default();

        Ok(RequestServices {
            locator,
            scope,
            cancellation,
        })
    }
}

/// Rejection for [`RequestServices`] extraction failures
#[derive(Debug, thiserror::Error)]
pub enum LocatorRejection {
    /// The route is not wrapped in a [`ScopeLayer`].
    #[error("request scope not found in extensions; wrap the router in a ScopeLayer")]
    MissingInterceptor,
}

impl IntoResponse for LocatorRejection {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request services unavailable");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Fails the request with `500` and the error message as a plain-text body.
///
/// Unlike a failed request scope, whose body follows
/// [`InterceptorConfig::expose_error_details`](crate::InterceptorConfig::expose_error_details),
/// this always names the service. Handlers that must not reveal service names
/// should map the error to their own response before returning it.
impl IntoResponse for LocatorError {
    fn into_response(self) -> Response {
        tracing::warn!(service = self.service_name(), error = %self, "service resolution failed in handler");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Builds a router with every route wrapped in a [`ScopeLayer`].
///
/// ```
/// use axum::routing::get;
/// use ferrous_locator::{axum_integration::create_app_with_locator, Locator};
/// use std::sync::Arc;
///
/// let locator = Arc::new(Locator::new());
/// let app = create_app_with_locator(locator, |router| {
///     router.route("/health", get(|| async { "ok" }))
/// });
/// ```
pub fn create_app_with_locator<F>(locator: Arc<Locator>, configure: F) -> Router
where
    F: FnOnce(Router) -> Router,
{
    configure(Router::new()).layer(ScopeLayer::new(locator))
}
