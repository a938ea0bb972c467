//! Singleton pre-warming for deterministic startup.
//!
//! Singletons are normally built on first use, which puts their cost (and
//! their failures) on the first request that needs them. Pre-warming builds
//! them at startup instead.

use crate::error::LocatorError;
use crate::lifetime::Lifetime;
use crate::locator::Locator;

/// Outcome of [`Locator::prewarm_singletons`].
#[derive(Debug, Default)]
pub struct ReadinessReport {
    /// Singletons that are built and cached
    pub warmed: Vec<String>,
    /// Singletons whose builder failed, with the error
    pub failures: Vec<(String, LocatorError)>,
}

impl ReadinessReport {
    /// True if every singleton was built.
    pub fn is_ready(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Locator {
    /// Builds every registered singleton now.
    ///
    /// Failures are collected rather than returned early, so one bad builder
    /// does not hide the others. Already-built singletons count as warmed.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_locator::Locator;
    ///
    /// let mut locator = Locator::new();
    /// locator.add_singleton("pool", |_| vec![0u8; 16]);
    /// locator.try_add_singleton("broken", |_| Err::<u8, _>("no route to host"));
    ///
    /// let report = locator.prewarm_singletons();
    /// assert!(!report.is_ready());
    /// assert_eq!(report.warmed, vec!["pool".to_string()]);
    /// assert_eq!(report.failures[0].0, "broken");
    /// ```
    pub fn prewarm_singletons(&self) -> ReadinessReport {
        let mut names: Vec<&str> = self
            .registry
            .iter()
            .filter(|(_, reg)| reg.lifetime() == Lifetime::Singleton)
            .map(|(name, _)| name)
            .collect();
        names.sort_unstable();

        let mut report = ReadinessReport::default();
        for name in names {
            match self.resolve(name) {
                Ok(_) => report.warmed.push(name.to_string()),
                Err(error) => report.failures.push((name.to_string(), error)),
            }
        }

        tracing::info!(
            warmed = report.warmed.len(),
            failed = report.failures.len(),
            "singleton pre-warm finished"
        );
        report
    }
}
