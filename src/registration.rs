//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use axum::http::request::Parts;
use once_cell::sync::OnceCell;

use crate::error::BoxError;
use crate::lifetime::Lifetime;
use crate::locator::Locator;

/// Type-erased `Arc` handed out by the locator.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Builder shape for transient and singleton services.
pub(crate) type SharedBuilder = Box<dyn Fn(&Locator) -> Result<AnyArc, BoxError> + Send + Sync>;

/// Builder shape for scoped services, which also see the inbound request head.
pub(crate) type ScopedBuilder =
    Box<dyn Fn(&Parts, &Locator) -> Result<AnyArc, BoxError> + Send + Sync>;

/// Lifetime tag together with the builder shape it requires
pub(crate) enum RegistrationKind {
    Transient { builder: SharedBuilder },
    Singleton {
        builder: SharedBuilder,
        cell: OnceCell<AnyArc>,
    },
    /// Singleton registered with its value already built
    Instance { value: AnyArc },
    Scoped { builder: ScopedBuilder },
}

/// Service registration with lifetime and builder
pub(crate) struct Registration {
    pub(crate) kind: RegistrationKind,
    /// Type produced by the builder, for diagnostics
    pub(crate) type_name: &'static str,
}

impl Registration {
    pub(crate) fn transient(builder: SharedBuilder, type_name: &'static str) -> Self {
        Self {
            kind: RegistrationKind::Transient { builder },
            type_name,
        }
    }

    pub(crate) fn singleton(builder: SharedBuilder, type_name: &'static str) -> Self {
        Self {
            kind: RegistrationKind::Singleton {
                builder,
                cell: OnceCell::new(),
            },
            type_name,
        }
    }

    /// Singleton that is already built.
    pub(crate) fn instance(value: AnyArc, type_name: &'static str) -> Self {
        Self {
            kind: RegistrationKind::Instance { value },
            type_name,
        }
    }

    pub(crate) fn scoped(builder: ScopedBuilder, type_name: &'static str) -> Self {
        Self {
            kind: RegistrationKind::Scoped { builder },
            type_name,
        }
    }

    #[inline]
    pub(crate) fn lifetime(&self) -> Lifetime {
        match self.kind {
            RegistrationKind::Transient { .. } => Lifetime::Transient,
            RegistrationKind::Singleton { .. } | RegistrationKind::Instance { .. } => {
                Lifetime::Singleton
            }
            RegistrationKind::Scoped { .. } => Lifetime::Scoped,
        }
    }

    /// True once a singleton has been built. Always false for other lifetimes.
    pub(crate) fn is_instantiated(&self) -> bool {
        match &self.kind {
            RegistrationKind::Singleton { cell, .. } => cell.get().is_some(),
            RegistrationKind::Instance { .. } => true,
            _ => false,
        }
    }
}

/// Name to registration table
///
/// Filled while the locator is still exclusively owned, read-only once shared.
#[derive(Default)]
pub(crate) struct Registry {
    entries: HashMap<String, Registration>,
}

impl Registry {
    /// Inserts a registration, returning the one it replaced (last write wins).
    pub(crate) fn insert(&mut self, name: String, registration: Registration) -> Option<Registration> {
        self.entries.insert(name, registration)
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Registration)> {
        self.entries.iter().map(|(name, reg)| (name.as_str(), reg))
    }

    pub(crate) fn scoped(&self) -> impl Iterator<Item = (&str, &ScopedBuilder)> {
        self.entries.iter().filter_map(|(name, reg)| match &reg.kind {
            RegistrationKind::Scoped { builder } => Some((name.as_str(), builder)),
            _ => None,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
