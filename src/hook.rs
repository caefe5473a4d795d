//! Lifecycle [`Hooks`] invoked around runs, scenarios and steps.
//!
//! A [`HookSet`] bundles up to six callbacks with an `order`. Multiple sets
//! may be registered; at every lifecycle point the non-empty slots of all
//! sets run in ascending `order`, stable over registration order for ties.

use futures::future::LocalBoxFuture;

use crate::{runner::ScenarioError, step::StepError};

/// Alias for a [`fn`] executed once before any scenario of a run.
pub type BeforeAllFn = fn() -> LocalBoxFuture<'static, ()>;

/// Alias for a [`fn`] executed once after every scenario of a run has
/// finished, even if earlier phases failed.
pub type AfterAllFn = fn() -> LocalBoxFuture<'static, ()>;

/// Alias for a [`fn`] executed on each [`Scenario`] before running any of
/// its [`Step`]s, including background ones.
///
/// [`Scenario`]: gherkin::Scenario
/// [`Step`]: gherkin::Step
pub type BeforeScenarioFn<World> = for<'a> fn(
    &'a gherkin::Feature,
    Option<&'a gherkin::Rule>,
    &'a gherkin::Scenario,
    &'a mut World,
) -> LocalBoxFuture<'a, ()>;

/// Alias for a [`fn`] executed on each [`Scenario`] after running all its
/// [`Step`]s, receiving the terminal state.
///
/// The [`World`] is [`None`] if its construction failed.
///
/// [`Scenario`]: gherkin::Scenario
/// [`Step`]: gherkin::Step
/// [`World`]: crate::World
pub type AfterScenarioFn<World> = for<'a> fn(
    &'a gherkin::Feature,
    Option<&'a gherkin::Rule>,
    &'a gherkin::Scenario,
    Option<&'a ScenarioError>,
    Option<&'a mut World>,
) -> LocalBoxFuture<'a, ()>;

/// Alias for a [`fn`] executed before each [`Step`] handler.
///
/// [`Step`]: gherkin::Step
pub type BeforeStepFn<World> = for<'a> fn(
    &'a gherkin::Step,
    &'a mut World,
) -> LocalBoxFuture<'a, ()>;

/// Alias for a [`fn`] executed after each [`Step`] handler, receiving its
/// error, if any.
///
/// [`Step`]: gherkin::Step
pub type AfterStepFn<World> = for<'a> fn(
    &'a gherkin::Step,
    Option<&'a StepError>,
    &'a mut World,
) -> LocalBoxFuture<'a, ()>;

/// Set of lifecycle callbacks sharing an `order`.
///
/// Every slot is optional: an empty slot means "no-op at this lifecycle
/// point" and is skipped, not invoked.
pub struct HookSet<World> {
    /// Position of this set among all registered ones, ascending.
    pub order: i32,

    /// Callback run once before any scenario.
    pub before_all: Option<BeforeAllFn>,

    /// Callback run once after all scenarios.
    pub after_all: Option<AfterAllFn>,

    /// Callback run before each scenario.
    pub before_scenario: Option<BeforeScenarioFn<World>>,

    /// Callback run after each scenario.
    pub after_scenario: Option<AfterScenarioFn<World>>,

    /// Callback run before each step.
    pub before_step: Option<BeforeStepFn<World>>,

    /// Callback run after each step.
    pub after_step: Option<AfterStepFn<World>>,
}

impl<World> HookSet<World> {
    /// Creates an empty [`HookSet`] with the given `order`.
    #[must_use]
    pub fn new(order: i32) -> Self {
        Self {
            order,
            before_all: None,
            after_all: None,
            before_scenario: None,
            after_scenario: None,
            before_step: None,
            after_step: None,
        }
    }

    /// Sets the [`BeforeAllFn`] slot.
    #[must_use]
    pub fn before_all(mut self, hook: BeforeAllFn) -> Self {
        self.before_all = Some(hook);
        self
    }

    /// Sets the [`AfterAllFn`] slot.
    #[must_use]
    pub fn after_all(mut self, hook: AfterAllFn) -> Self {
        self.after_all = Some(hook);
        self
    }

    /// Sets the [`BeforeScenarioFn`] slot.
    #[must_use]
    pub fn before_scenario(mut self, hook: BeforeScenarioFn<World>) -> Self {
        self.before_scenario = Some(hook);
        self
    }

    /// Sets the [`AfterScenarioFn`] slot.
    #[must_use]
    pub fn after_scenario(mut self, hook: AfterScenarioFn<World>) -> Self {
        self.after_scenario = Some(hook);
        self
    }

    /// Sets the [`BeforeStepFn`] slot.
    #[must_use]
    pub fn before_step(mut self, hook: BeforeStepFn<World>) -> Self {
        self.before_step = Some(hook);
        self
    }

    /// Sets the [`AfterStepFn`] slot.
    #[must_use]
    pub fn after_step(mut self, hook: AfterStepFn<World>) -> Self {
        self.after_step = Some(hook);
        self
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for HookSet<World> {
    fn clone(&self) -> Self {
        Self {
            order: self.order,
            before_all: self.before_all,
            after_all: self.after_all,
            before_scenario: self.before_scenario,
            after_scenario: self.after_scenario,
            before_step: self.before_step,
            after_step: self.after_step,
        }
    }
}

// Implemented manually to omit redundant `World: Debug` trait bound, imposed
// by `#[derive(Debug)]`.
impl<World> std::fmt::Debug for HookSet<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet")
            .field("order", &self.order)
            .field("before_all", &self.before_all.is_some())
            .field("after_all", &self.after_all.is_some())
            .field("before_scenario", &self.before_scenario.is_some())
            .field("after_scenario", &self.after_scenario.is_some())
            .field("before_step", &self.before_step.is_some())
            .field("after_step", &self.after_step.is_some())
            .finish()
    }
}

/// All registered [`HookSet`]s, kept sorted by ascending `order`.
pub struct Hooks<World> {
    /// Registered sets, sorted stably by `order` on insertion.
    sets: Vec<HookSet<World>>,
}

impl<World> Hooks<World> {
    /// Creates an empty [`Hooks`] collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the given [`HookSet`].
    pub fn add(&mut self, set: HookSet<World>) {
        self.sets.push(set);
        // Stable sort keeps registration order for equal `order`s.
        self.sets.sort_by_key(|s| s.order);
    }

    /// Indicates whether no [`HookSet`]s are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Number of registered [`HookSet`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// [`BeforeAllFn`]s in ascending order.
    pub fn before_all(&self) -> impl Iterator<Item = BeforeAllFn> + '_ {
        self.sets.iter().filter_map(|s| s.before_all)
    }

    /// [`AfterAllFn`]s in ascending order.
    pub fn after_all(&self) -> impl Iterator<Item = AfterAllFn> + '_ {
        self.sets.iter().filter_map(|s| s.after_all)
    }

    /// [`BeforeScenarioFn`]s in ascending order.
    pub fn before_scenario(
        &self,
    ) -> impl Iterator<Item = BeforeScenarioFn<World>> + '_ {
        self.sets.iter().filter_map(|s| s.before_scenario)
    }

    /// [`AfterScenarioFn`]s in ascending order.
    pub fn after_scenario(
        &self,
    ) -> impl Iterator<Item = AfterScenarioFn<World>> + '_ {
        self.sets.iter().filter_map(|s| s.after_scenario)
    }

    /// [`BeforeStepFn`]s in ascending order.
    pub fn before_step(
        &self,
    ) -> impl Iterator<Item = BeforeStepFn<World>> + '_ {
        self.sets.iter().filter_map(|s| s.before_step)
    }

    /// [`AfterStepFn`]s in ascending order.
    pub fn after_step(&self) -> impl Iterator<Item = AfterStepFn<World>> + '_ {
        self.sets.iter().filter_map(|s| s.after_step)
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for Hooks<World> {
    fn clone(&self) -> Self {
        Self { sets: self.sets.clone() }
    }
}

// Implemented manually to omit redundant `World: Debug` trait bound, imposed
// by `#[derive(Debug)]`.
impl<World> std::fmt::Debug for Hooks<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").field("sets", &self.sets).finish()
    }
}

// Implemented manually to omit redundant `World: Default` trait bound,
// imposed by `#[derive(Default)]`.
impl<World> Default for Hooks<World> {
    fn default() -> Self {
        Self { sets: Vec::new() }
    }
}
