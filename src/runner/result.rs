//! Results of a finished run.
//!
//! The executor produces one [`ScenarioResult`] per selected scenario,
//! carrying the scenario's [`ResolvedStep`]s with their terminal statuses,
//! errors and timings. [`RunResult`] aggregates them together with
//! [`Stats`] counters for scenarios and steps.

use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use chrono::{DateTime, Utc};
use derive_more::with_trait::{Display, Error, FromStr};

use crate::step::{ResolvedStep, StepError, StepStatus};

/// ID of a scenario execution, uniquely identifying it within a process.
#[derive(Clone, Copy, Debug, Display, Eq, FromStr, Hash, PartialEq)]
pub struct ScenarioId(pub u64);

impl ScenarioId {
    /// Creates a new unique [`ScenarioId`].
    #[must_use]
    pub fn new() -> Self {
        /// [`AtomicU64`] ID.
        static ID: AtomicU64 = AtomicU64::new(0);

        Self(ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a [`tracing::Span`] wrapping this scenario's execution.
    #[cfg(feature = "tracing")]
    pub(crate) fn span(self) -> tracing::Span {
        tracing::info_span!("scenario", id = self.0)
    }
}

impl Default for ScenarioId {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal status of a scenario.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ScenarioStatus {
    /// Every step passed.
    #[display("passed")]
    Passed,

    /// World construction, a hook or a step failed.
    #[display("failed")]
    Failed,

    /// Never started, because an earlier scenario failed under fail-fast.
    #[display("skipped")]
    Skipped,
}

/// Reason a scenario terminated unsuccessfully.
#[derive(Clone, Debug, Display, Error)]
pub enum ScenarioError {
    /// World construction returned an error or panicked.
    #[display("failed to construct world: {_0}")]
    World(#[error(not(source))] String),

    /// A step failed.
    ///
    /// The failing step itself is found in the [`ScenarioResult`] step
    /// lists; steps after it are skipped and carry no error.
    #[display("{_0}")]
    Step(StepError),

    /// A scenario-level hook panicked.
    #[display("hook panicked: {_0}")]
    Hook(#[error(not(source))] String),
}

/// Result of executing (or skipping) a single scenario.
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    /// Unique ID of this scenario execution.
    pub id: ScenarioId,

    /// Name of the feature the scenario belongs to.
    pub feature: String,

    /// Name of the enclosing rule, if any.
    pub rule: Option<String>,

    /// Scenario name, with the outline suffix when expanded from one.
    pub scenario: String,

    /// Path of the feature file, if parsed from disk.
    pub path: Option<PathBuf>,

    /// Terminal status.
    pub status: ScenarioStatus,

    /// Failure that terminated the scenario, if any.
    pub error: Option<ScenarioError>,

    /// Feature background steps, in file order.
    pub feature_background: Vec<ResolvedStep>,

    /// Rule background steps, in file order.
    pub rule_background: Vec<ResolvedStep>,

    /// The scenario's own steps, in file order.
    pub steps: Vec<ResolvedStep>,

    /// Wall-clock time the scenario started, if it did.
    pub started_at: Option<DateTime<Utc>>,

    /// Time the whole scenario took, hooks included.
    pub duration: Option<Duration>,
}

impl ScenarioResult {
    /// Iterates all steps in execution order: feature background, then rule
    /// background, then the scenario's own steps.
    pub fn all_steps(&self) -> impl Iterator<Item = &ResolvedStep> {
        self.feature_background
            .iter()
            .chain(&self.rule_background)
            .chain(&self.steps)
    }

    /// Indicates whether this scenario failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == ScenarioStatus::Failed
    }

    /// First failed step of this scenario, if any.
    #[must_use]
    pub fn first_failed_step(&self) -> Option<&ResolvedStep> {
        self.all_steps().find(|s| s.is_failed())
    }
}

/// Counters of passed, failed and skipped items.
///
/// Used for both scenarios and steps in a [`RunResult`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of passed items.
    pub passed: usize,

    /// Number of failed items.
    pub failed: usize,

    /// Number of skipped items.
    pub skipped: usize,
}

impl Stats {
    /// Creates a new [`Stats`] with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { passed: 0, failed: 0, skipped: 0 }
    }

    /// Total of all counters.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Aggregated result of a whole run.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Results of every selected scenario, in resolution order.
    pub scenarios: Vec<ScenarioResult>,

    /// Scenario counters.
    pub scenario_stats: Stats,

    /// Step counters across all scenarios.
    pub step_stats: Stats,

    /// Wall-clock time the run started.
    pub started_at: DateTime<Utc>,

    /// Time the whole run took, hooks included.
    pub duration: Duration,
}

impl RunResult {
    /// Builds a [`RunResult`] out of finished scenarios, tallying counters.
    ///
    /// Scenarios arrive in completion order and are re-sorted into
    /// resolution order by their IDs.
    #[must_use]
    pub fn new(
        mut scenarios: Vec<ScenarioResult>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        scenarios.sort_by_key(|s| s.id.0);

        let mut scenario_stats = Stats::new();
        let mut step_stats = Stats::new();
        for scenario in &scenarios {
            match scenario.status {
                ScenarioStatus::Passed => scenario_stats.passed += 1,
                ScenarioStatus::Failed => scenario_stats.failed += 1,
                ScenarioStatus::Skipped => scenario_stats.skipped += 1,
            }
            for step in scenario.all_steps() {
                match step.status {
                    StepStatus::Passed => step_stats.passed += 1,
                    StepStatus::Failed => step_stats.failed += 1,
                    // Steps never started count as skipped.
                    StepStatus::Pending | StepStatus::Skipped => {
                        step_stats.skipped += 1;
                    }
                }
            }
        }

        Self { scenarios, scenario_stats, step_stats, started_at, duration }
    }

    /// Indicates whether every scenario passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.scenario_stats.failed == 0 && self.scenario_stats.skipped == 0
    }

    /// Results of failed scenarios only.
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.scenarios.iter().filter(|s| s.is_failed())
    }
}

#[cfg(test)]
mod tests {
    use gherkin::StepType;

    use crate::step::DefinitionInfo;

    use super::*;

    fn step(status: StepStatus) -> ResolvedStep {
        let mut step = ResolvedStep::new(
            "Given".into(),
            StepType::Given,
            "a step".into(),
            DefinitionInfo {
                pattern: "^a step$".into(),
                fn_name: "a_step",
                location: None,
            },
            vec![],
            vec![],
            vec![],
        );
        match status {
            StepStatus::Pending => {}
            StepStatus::Passed => {
                step.pass(Utc::now(), Duration::from_millis(1));
            }
            StepStatus::Failed => step.fail(
                StepError::Panic("boom".into()),
                Utc::now(),
                Duration::from_millis(1),
            ),
            StepStatus::Skipped => step.skip(),
        }
        step
    }

    fn scenario(
        name: &str,
        status: ScenarioStatus,
        steps: Vec<ResolvedStep>,
    ) -> ScenarioResult {
        ScenarioResult {
            id: ScenarioId::new(),
            feature: "results".into(),
            rule: None,
            scenario: name.into(),
            path: None,
            status,
            error: None,
            feature_background: vec![],
            rule_background: vec![],
            steps,
            started_at: Some(Utc::now()),
            duration: Some(Duration::from_millis(3)),
        }
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let first = ScenarioId::new();
        let second = ScenarioId::new();
        assert!(second.0 > first.0);
    }

    #[test]
    fn tallies_scenario_and_step_counters() {
        let result = RunResult::new(
            vec![
                scenario(
                    "passing",
                    ScenarioStatus::Passed,
                    vec![step(StepStatus::Passed), step(StepStatus::Passed)],
                ),
                scenario(
                    "failing",
                    ScenarioStatus::Failed,
                    vec![
                        step(StepStatus::Passed),
                        step(StepStatus::Failed),
                        step(StepStatus::Skipped),
                    ],
                ),
            ],
            Utc::now(),
            Duration::from_millis(10),
        );

        assert_eq!(result.scenario_stats.passed, 1);
        assert_eq!(result.scenario_stats.failed, 1);
        assert_eq!(result.scenario_stats.skipped, 0);
        assert_eq!(result.step_stats.passed, 3);
        assert_eq!(result.step_stats.failed, 1);
        assert_eq!(result.step_stats.skipped, 1);
        assert_eq!(result.step_stats.total(), 5);
        assert!(!result.is_success());
    }

    #[test]
    fn sorts_scenarios_back_into_resolution_order() {
        let first = scenario("first", ScenarioStatus::Passed, vec![]);
        let second = scenario("second", ScenarioStatus::Passed, vec![]);

        // Completion order is whatever the concurrency made of it.
        let result = RunResult::new(
            vec![second, first],
            Utc::now(),
            Duration::ZERO,
        );

        assert_eq!(result.scenarios[0].scenario, "first");
        assert_eq!(result.scenarios[1].scenario, "second");
        assert!(result.is_success());
    }

    #[test]
    fn failures_yields_failed_scenarios_only() {
        let result = RunResult::new(
            vec![
                scenario("ok", ScenarioStatus::Passed, vec![]),
                scenario(
                    "broken",
                    ScenarioStatus::Failed,
                    vec![step(StepStatus::Failed)],
                ),
            ],
            Utc::now(),
            Duration::ZERO,
        );

        let failed: Vec<_> =
            result.failures().map(|s| s.scenario.as_str()).collect();
        assert_eq!(failed, ["broken"]);

        let failing = result.scenarios[1]
            .first_failed_step()
            .map(|s| s.text.clone());
        assert_eq!(failing.as_deref(), Some("a step"));
    }

    #[test]
    fn world_error_displays_its_message() {
        let err = ScenarioError::World("db unreachable".into());
        assert_eq!(
            err.to_string(),
            "failed to construct world: db unreachable",
        );
    }
}
