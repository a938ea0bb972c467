//! Request-scoping interceptor.
//!
//! [`ScopeLayer`] is a tower [`Layer`] that runs once per inbound request,
//! before the wrapped service. It builds every scoped registration for that
//! request and attaches the resulting [`RequestScope`] to the request
//! extensions, together with the shared [`Locator`] and a per-request
//! [`CancellationToken`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use tower::{Layer, Service};

use crate::cancellation::CancellationToken;
use crate::config::InterceptorConfig;
use crate::error::LocatorError;
use crate::locator::{Locator, RequestScope};

/// Tower layer that materialises scoped services for every request
///
/// # Examples
///
/// ```
/// use axum::{routing::get, Router};
/// use ferrous_locator::{Locator, ScopeLayer};
/// use std::sync::Arc;
///
/// let mut locator = Locator::new();
/// locator.add_scoped("path", |parts, _| parts.uri.path().to_string());
/// let locator = Arc::new(locator);
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "ok" }))
///     .layer(ScopeLayer::new(locator));
/// ```
#[derive(Clone, Debug)]
pub struct ScopeLayer {
    locator: Arc<Locator>,
    config: Arc<InterceptorConfig>,
}

impl ScopeLayer {
    pub fn new(locator: Arc<Locator>) -> Self {
        Self::with_config(locator, InterceptorConfig::default())
    }

    /// Creates a layer that reports scope failures according to `config`.
    pub fn with_config(locator: Arc<Locator>, config: InterceptorConfig) -> Self {
        Self {
            locator,
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for ScopeLayer {
    type Service = ScopeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ScopeService {
            inner,
            locator: self.locator.clone(),
            config: self.config.clone(),
        }
    }
}

/// Service produced by [`ScopeLayer`]
#[derive(Clone, Debug)]
pub struct ScopeService<S> {
    inner: S,
    locator: Arc<Locator>,
    config: Arc<InterceptorConfig>,
}

impl<S, B> Service<Request<B>> for ScopeService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let (mut parts, body) = req.into_parts();

        // A scope left over from an outer layer must not leak into scoped builders.
        parts.extensions.remove::<RequestScope>();
        // Cancelling an outer request also cancels this one.
        let token = match parts.extensions.remove::<CancellationToken>() {
            Some(upstream) => upstream.child_token(),
            None => CancellationToken::new(),
        };
        parts.extensions.insert(token.clone());
        parts.extensions.insert(self.locator.clone());

        let scope = match self.locator.build_scope(&parts) {
            Ok(scope) => scope,
            Err(error) => {
                tracing::error!(
                    method = %parts.method,
                    uri = %parts.uri,
                    service = error.service_name(),
                    %error,
                    "request scope could not be built"
                );
                let response = failure_response(&self.config, &error);
                return Box::pin(async move { Ok(response) });
            }
        };

        tracing::debug!(
            method = %parts.method,
            uri = %parts.uri,
            services = scope.len(),
            "request scope attached"
        );
        parts.extensions.insert(scope);
        let req = Request::from_parts(parts, body);

        // The clone may not be ready; keep the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        // Armed before the future exists, so dropping it unpolled still cancels.
        let guard = token.drop_guard();
        Box::pin(async move {
            let result = inner.call(req).await;
            guard.disarm();
            result
        })
    }
}

pub(crate) fn failure_response(config: &InterceptorConfig, error: &LocatorError) -> Response {
    let body = if config.expose_error_details {
        error.to_string()
    } else {
        "request services unavailable".to_string()
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = config.status();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

impl Locator {
    /// Convenience constructor for a [`ScopeLayer`] over this locator.
    pub fn layer(self: &Arc<Self>) -> ScopeLayer {
        ScopeLayer::new(self.clone())
    }
}
