#![no_main]

use axum::http::Request;
use ferrous_locator::{Lifetime, Locator, LocatorError};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

// Each chunk of the input is (op, name byte): ops 0-2 register a lifetime,
// ops 3-4 resolve through one of the two access paths.
fuzz_target!(|data: &[u8]| {
    let mut locator = Locator::new();
    let mut registered: HashMap<String, Lifetime> = HashMap::new();

    let (ops, probes) = data.split_at(data.len() / 2);
    for chunk in ops.chunks_exact(2) {
        let name = format!("svc{}", chunk[1] % 16);
        let lifetime = match chunk[0] % 3 {
            0 => Lifetime::Transient,
            1 => Lifetime::Singleton,
            _ => Lifetime::Scoped,
        };
        match lifetime {
            Lifetime::Transient => locator.add_transient(name.clone(), |_| 1u8),
            Lifetime::Singleton => locator.add_singleton(name.clone(), |_| 2u8),
            Lifetime::Scoped => locator.add_scoped(name.clone(), |_, _| 3u8),
        };
        registered.insert(name, lifetime);
    }

    assert_eq!(locator.len(), registered.len());

    let (parts, _) = Request::get("/").body(()).unwrap().into_parts();
    let scope = locator.build_scope(&parts).unwrap();

    for chunk in probes.chunks_exact(2) {
        let name = format!("svc{}", chunk[1] % 32);
        let scoped_path = chunk[0] % 2 == 0;
        let result = if scoped_path {
            locator.resolve_scoped_as::<u8, _>(&scope, &name)
        } else {
            locator.resolve_as::<u8>(&name)
        };

        match (registered.get(&name), scoped_path) {
            (None, _) => assert!(matches!(result, Err(LocatorError::NotFound(_)))),
            (Some(Lifetime::Scoped), true) => assert_eq!(*result.unwrap(), 3),
            (Some(Lifetime::Scoped), false) | (Some(_), true) => {
                assert!(matches!(result, Err(LocatorError::WrongAccessPattern { .. })))
            }
            (Some(Lifetime::Transient), false) => assert_eq!(*result.unwrap(), 1),
            (Some(Lifetime::Singleton), false) => assert_eq!(*result.unwrap(), 2),
        }
    }
});
