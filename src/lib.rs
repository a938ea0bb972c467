//! # ferrous-locator
//!
//! Named service locator for tower/axum services, with three lifetimes.
//!
//! ## Features
//!
//! - **Transient**: a fresh instance on every resolution
//! - **Singleton**: built once on first resolution, shared for the locator's lifetime,
//!   with at most one builder invocation under concurrent first access
//! - **Scoped**: one instance per inbound request, built eagerly by [`ScopeLayer`]
//!   before the handler runs
//! - **Recoverable errors**: unknown names, access-path misuse and failing or
//!   panicking builders are returned as [`LocatorError`], never fatal
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_locator::Locator;
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! let mut locator = Locator::new();
//! locator.add_singleton("db", |_| Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! locator.add_transient("greeting", |_| String::from("hello"));
//!
//! let locator = Arc::new(locator);
//! let db = locator.resolve_as::<Database>("db").unwrap();
//! assert_eq!(db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Request Scopes
//!
//! Scoped builders receive the request head. Wrap the router in a
//! [`ScopeLayer`] and resolve the per-request instances through
//! [`RequestServices`](axum_integration::RequestServices):
//!
//! ```rust
//! use axum::{routing::get, Router};
//! use ferrous_locator::{axum_integration::RequestServices, Locator, LocatorError};
//! use std::sync::Arc;
//!
//! async fn handler(services: RequestServices) -> Result<String, LocatorError> {
//!     let path = services.resolve_scoped_as::<String>("path")?;
//!     Ok(format!("you asked for {path}"))
//! }
//!
//! let mut locator = Locator::new();
//! locator.add_scoped("path", |parts, _| parts.uri.path().to_string());
//! let locator = Arc::new(locator);
//!
//! let app: Router = Router::new()
//!     .route("/*rest", get(handler))
//!     .layer(locator.layer());
//! ```

pub mod axum_integration;
pub mod cancellation;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod interceptor;
pub mod lifetime;
pub mod locator;
pub mod module_system;
pub mod observer;
pub mod prewarm;

mod internal;
mod registration;

pub use cancellation::{CancellationError, CancellationToken, DropGuard};
pub use config::{ConfigError, InterceptorConfig};
pub use descriptors::ServiceDescriptor;
pub use error::{BoxError, LocatorError, LocatorResult};
pub use interceptor::{ScopeLayer, ScopeService};
pub use lifetime::Lifetime;
pub use locator::{Locator, RequestScope, ScopeSource};
pub use module_system::LocatorModule;
pub use observer::{LocatorObserver, TracingObserver};
pub use prewarm::ReadinessReport;
pub use registration::AnyArc;
