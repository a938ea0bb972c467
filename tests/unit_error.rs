/// Unit tests for LocatorError and LocatorResult

use ferrous_locator::{Lifetime, Locator, LocatorError, LocatorResult};
use std::error::Error;

#[test]
fn test_error_display_not_found() {
    let error = LocatorError::NotFound("database".into());
    assert_eq!(error.to_string(), "Service not found: database");
    assert_eq!(error.service_name(), "database");
}

#[test]
fn test_error_display_wrong_access_pattern() {
    let scoped = LocatorError::WrongAccessPattern {
        name: "requestId".into(),
        registered: Lifetime::Scoped,
    };
    assert_eq!(
        scoped.to_string(),
        "Wrong access pattern for requestId: registered as scoped, use resolve_scoped with the request context"
    );

    let singleton = LocatorError::WrongAccessPattern {
        name: "clock".into(),
        registered: Lifetime::Singleton,
    };
    assert_eq!(
        singleton.to_string(),
        "Wrong access pattern for clock: registered as singleton, use resolve instead of resolve_scoped"
    );
}

#[test]
fn test_error_display_type_mismatch() {
    let error = LocatorError::TypeMismatch {
        name: "port".into(),
        expected: "u16",
    };
    assert_eq!(error.to_string(), "Type mismatch for port: expected u16");
}

#[test]
fn test_builder_error_keeps_source() {
    let mut locator = Locator::new();
    locator.try_add_transient("config", |_| "not a number".parse::<u32>());

    let error = locator.resolve("config").unwrap_err();
    assert_eq!(error.service_name(), "config");
    assert!(error.to_string().starts_with("Builder for config failed: "));

    let source = error.source().expect("builder errors carry their source");
    assert_eq!(source.to_string(), "invalid digit found in string");
}

#[test]
fn test_error_is_clone_and_send_sync() {
    fn assert_traits<T: Clone + Send + Sync + 'static>() {}
    assert_traits::<LocatorError>();

    let error = LocatorError::BuilderPanicked {
        name: "svc".into(),
        message: "boom".into(),
    };
    let cloned = error.clone();
    assert_eq!(error.to_string(), cloned.to_string());
    assert_eq!(cloned.to_string(), "Builder for svc panicked: boom");
}

#[test]
fn test_lifetime_display() {
    assert_eq!(Lifetime::Transient.to_string(), "transient");
    assert_eq!(Lifetime::Singleton.to_string(), "singleton");
    assert_eq!(Lifetime::Scoped.to_string(), "scoped");
}

#[test]
fn test_result_alias() {
    fn lookup(found: bool) -> LocatorResult<u8> {
        if found {
            Ok(1)
        } else {
            Err(LocatorError::NotFound("thing".into()))
        }
    }

    assert_eq!(lookup(true).unwrap(), 1);
    assert!(lookup(false).is_err());
}
