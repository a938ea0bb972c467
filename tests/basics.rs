use ferrous_locator::{Lifetime, Locator, LocatorError, LocatorModule, LocatorResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_transient_creates_new_instances() {
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let mut locator = Locator::new();
    locator.add_transient("greeting", move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        format!("instance-{}", *c)
    });

    let a = locator.resolve_as::<String>("greeting").unwrap();
    let b = locator.resolve_as::<String>("greeting").unwrap();

    assert_eq!(*a, "instance-1");
    assert_eq!(*b, "instance-2");
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(*counter.lock().unwrap(), 2);
}

#[test]
fn test_singleton_built_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let mut locator = Locator::new();
    locator.add_singleton("clock", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        1_700_000_000u64
    });

    assert_eq!(builds.load(Ordering::SeqCst), 0, "singletons are lazy");

    let first = locator.resolve("clock").unwrap();
    let second = locator.resolve("clock").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_not_found_error() {
    let locator = Locator::new();

    match locator.resolve("nope") {
        Err(LocatorError::NotFound(name)) => assert_eq!(name, "nope"),
        other => panic!("expected NotFound, got {other:?}"),
    }

    let mut locator = Locator::new();
    locator.add_singleton("db", |_| 1u8);
    assert!(matches!(locator.resolve("nope"), Err(LocatorError::NotFound(_))));
}

#[test]
fn test_replace_semantics() {
    let mut locator = Locator::new();
    locator.add_singleton("port", |_| 1usize);
    locator.add_singleton("port", |_| 2usize);

    assert_eq!(locator.len(), 1);
    assert_eq!(*locator.resolve_as::<usize>("port").unwrap(), 2);
}

#[test]
fn test_replace_across_lifetimes() {
    let mut locator = Locator::new();
    locator.add_singleton("session", |_| 1u32);
    locator.add_scoped("session", |_, _| 2u32);

    assert_eq!(locator.lifetime_of("session"), Some(Lifetime::Scoped));
    assert!(matches!(
        locator.resolve("session"),
        Err(LocatorError::WrongAccessPattern { registered: Lifetime::Scoped, .. })
    ));

    locator.add_transient("session", |_| 3u32);
    assert_eq!(locator.lifetime_of("session"), Some(Lifetime::Transient));
    assert_eq!(*locator.resolve_as::<u32>("session").unwrap(), 3);
}

#[test]
fn test_factory_with_dependencies() {
    struct Config {
        port: u16,
    }

    struct Server {
        config: Arc<Config>,
    }

    let mut locator = Locator::new();
    locator.add_instance("config", Config { port: 8080 });
    locator.try_add_singleton("server", |loc| {
        Ok::<_, LocatorError>(Server {
            config: loc.resolve_as::<Config>("config")?,
        })
    });

    let server = locator.resolve_as::<Server>("server").unwrap();
    let config = locator.resolve_as::<Config>("config").unwrap();
    assert_eq!(server.config.port, 8080);
    assert!(Arc::ptr_eq(&server.config, &config));
}

#[test]
fn test_missing_dependency_surfaces_as_builder_error() {
    let mut locator = Locator::new();
    locator.try_add_transient("repo", |loc| {
        loc.resolve_as::<String>("db").map(|db| format!("repo on {db}"))
    });

    match locator.resolve("repo") {
        Err(LocatorError::Builder { name, source }) => {
            assert_eq!(name, "repo");
            assert_eq!(source.to_string(), "Service not found: db");
        }
        other => panic!("expected Builder error, got {other:?}"),
    }
}

#[test]
fn test_type_mismatch() {
    let mut locator = Locator::new();
    locator.add_transient("answer", |_| 42u32);

    match locator.resolve_as::<String>("answer") {
        Err(LocatorError::TypeMismatch { name, expected }) => {
            assert_eq!(name, "answer");
            assert_eq!(expected, "alloc::string::String");
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
}

#[test]
fn test_panicking_builder_is_recoverable() {
    let mut locator = Locator::new();
    locator.add_singleton::<u32, _>("explosive", |_| panic!("connection refused"));
    locator.add_singleton("stable", |_| 5u32);

    match locator.resolve("explosive") {
        Err(LocatorError::BuilderPanicked { name, message }) => {
            assert_eq!(name, "explosive");
            assert_eq!(message, "connection refused");
        }
        other => panic!("expected BuilderPanicked, got {other:?}"),
    }

    // The locator keeps working after a builder panic.
    assert_eq!(*locator.resolve_as::<u32>("stable").unwrap(), 5);
    assert!(matches!(
        locator.resolve("explosive"),
        Err(LocatorError::BuilderPanicked { .. })
    ));
}

#[test]
fn test_introspection() {
    let mut locator = Locator::new();
    assert!(locator.is_empty());

    locator
        .add_singleton("db", |_| 1u8)
        .add_transient("id", |_| 2u8)
        .add_scoped("user", |_, _| 3u8);

    assert_eq!(locator.len(), 3);
    assert!(locator.contains("user"));
    assert!(!locator.contains("nope"));
    assert_eq!(locator.lifetime_of("nope"), None);

    let before = locator.descriptors();
    assert_eq!(
        before.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
        vec!["db", "id", "user"]
    );
    assert!(before.iter().all(|d| !d.instantiated));

    locator.resolve("db").unwrap();
    let after = locator.descriptors();
    assert!(after[0].instantiated);
    assert!(!after[1].instantiated);
}

#[test]
fn test_prewarm_builds_singletons_only() {
    let builds = Arc::new(AtomicUsize::new(0));
    let singleton_counter = builds.clone();
    let transient_counter = builds.clone();

    let mut locator = Locator::new();
    locator.add_singleton("pool", move |_| {
        singleton_counter.fetch_add(1, Ordering::SeqCst);
        "pool"
    });
    locator.add_transient("request", move |_| {
        transient_counter.fetch_add(100, Ordering::SeqCst);
        "request"
    });

    let report = locator.prewarm_singletons();
    assert!(report.is_ready());
    assert_eq!(report.warmed, vec!["pool".to_string()]);
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    locator.resolve("pool").unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

struct StorageModule;

impl LocatorModule for StorageModule {
    fn register(self, locator: &mut Locator) -> LocatorResult<()> {
        locator.add_singleton("storage.url", |_| String::from("sqlite::memory:"));
        Ok(())
    }
}

#[test]
fn test_modules_register_and_override() {
    let mut locator = Locator::new();
    locator
        .add_module(StorageModule)
        .unwrap()
        .add_module(|loc: &mut Locator| -> LocatorResult<()> {
            loc.add_singleton("storage.url", |_| String::from("postgres://test"));
            Ok(())
        })
        .unwrap();

    assert_eq!(*locator.resolve_as::<String>("storage.url").unwrap(), "postgres://test");
}

#[test]
fn test_module_error_propagates() {
    let mut locator = Locator::new();
    let result = locator.add_module(|_: &mut Locator| -> LocatorResult<()> {
        Err(LocatorError::NotFound("secrets".into()))
    });
    assert!(matches!(result, Err(LocatorError::NotFound(name)) if name == "secrets"));
}
