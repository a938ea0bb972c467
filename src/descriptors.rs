//! Service descriptors for introspection.

use crate::lifetime::Lifetime;
use crate::locator::Locator;

/// Snapshot of one registration, for diagnostics and startup logging.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{Lifetime, Locator};
///
/// let mut locator = Locator::new();
/// locator.add_singleton("db", |_| String::from("postgres://localhost"));
/// locator.add_transient("id", |_| 1u64);
///
/// let descriptors = locator.descriptors();
/// assert_eq!(descriptors[0].name, "db");
/// assert_eq!(descriptors[0].lifetime, Lifetime::Singleton);
/// assert!(!descriptors[0].instantiated);
/// assert_eq!(descriptors[1].type_name, "u64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub lifetime: Lifetime,
    /// Rust type produced by the builder
    pub type_name: &'static str,
    /// Whether a singleton has already been built; always false otherwise
    pub instantiated: bool,
}

impl Locator {
    /// Describes every registration, sorted by name.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<ServiceDescriptor> = self
            .registry
            .iter()
            .map(|(name, reg)| ServiceDescriptor {
                name: name.to_string(),
                lifetime: reg.lifetime(),
                type_name: reg.type_name,
                instantiated: reg.is_instantiated(),
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}
