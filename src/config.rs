//! [`RunConfig`] controlling which scenarios run and how.

use smart_default::SmartDefault;

use crate::tagexpr::TagExpr;

/// Configuration of a single run, passed into the engine at construction.
///
/// Only gates which scenarios run and whether hooks fire, never the
/// matching or coercion semantics.
#[derive(Clone, Debug, SmartDefault)]
pub struct RunConfig {
    /// Number of scenarios to run concurrently.
    #[default(64)]
    pub concurrency: usize,

    /// Stop launching new scenarios after the first failure.
    ///
    /// Scenarios already running finish; unstarted ones are recorded as
    /// skipped.
    pub fail_fast: bool,

    /// Skip every registered hook at every lifecycle point.
    pub disable_hooks: bool,

    /// Expression selecting scenarios by their effective tag set.
    ///
    /// [`None`] selects every scenario.
    pub tag_filter: Option<TagExpr>,
}

impl RunConfig {
    /// Creates a [`RunConfig`] with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_64_concurrent_scenarios() {
        let config = RunConfig::default();

        assert_eq!(config.concurrency, 64);
        assert!(!config.fail_fast);
        assert!(!config.disable_hooks);
        assert!(config.tag_filter.is_none());
    }
}
