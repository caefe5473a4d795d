//! Execution of resolved scenarios.
//!
//! Each scenario gets a freshly constructed [`World`], runs its feature
//! background, rule background and own steps in order, and fails fast
//! within itself: after the first failing step the remaining ones are
//! skipped. Handler and hook panics are caught at the step (or scenario)
//! boundary and recorded as errors, so an executing scenario never unwinds
//! into the run loop.

use std::{any::Any, panic::AssertUnwindSafe, time::Instant};

use chrono::Utc;
use futures::FutureExt as _;
#[cfg(feature = "tracing")]
use tracing::Instrument as _;

use crate::{
    hook::Hooks,
    step::{Context, StepError},
    world::World,
};

use super::{
    resolve::{ScenarioExecution, StepSlot},
    result::{ScenarioError, ScenarioResult, ScenarioStatus},
};

/// Extracts a readable message out of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "opaque panic payload".to_owned()
    }
}

/// Executes a single resolved scenario to completion.
///
/// Never unwinds: worst case the returned [`ScenarioResult`] is failed
/// with every step skipped.
pub(crate) async fn execute_scenario<W: World>(
    execution: ScenarioExecution<W>,
    hooks: &Hooks<W>,
    disable_hooks: bool,
) -> ScenarioResult {
    let started_at = Utc::now();
    let started = Instant::now();

    let ScenarioExecution {
        id,
        feature,
        rule,
        scenario,
        mut feature_background,
        mut rule_background,
        mut steps,
    } = execution;

    let mut error: Option<ScenarioError> = None;

    let mut world = match AssertUnwindSafe(W::new()).catch_unwind().await {
        Ok(Ok(world)) => Some(world),
        Ok(Err(e)) => {
            error = Some(ScenarioError::World(e.to_string()));
            None
        }
        Err(payload) => {
            error = Some(ScenarioError::World(panic_message(payload.as_ref())));
            None
        }
    };

    if !disable_hooks {
        if let Some(world) = world.as_mut() {
            for hook in hooks.before_scenario() {
                let fut = hook(&feature, rule.as_deref(), &scenario, world);
                if let Err(payload) =
                    AssertUnwindSafe(fut).catch_unwind().await
                {
                    error = Some(ScenarioError::Hook(panic_message(
                        payload.as_ref(),
                    )));
                    break;
                }
            }
        }
    }

    let slots = feature_background
        .iter_mut()
        .chain(rule_background.iter_mut())
        .chain(steps.iter_mut());
    match world.as_mut() {
        Some(world) if error.is_none() => {
            for slot in slots {
                if error.is_some() {
                    slot.resolved.skip();
                    continue;
                }
                if let Some(e) =
                    run_step(slot, world, hooks, disable_hooks).await
                {
                    error = Some(ScenarioError::Step(e));
                }
            }
        }
        // World construction or a `BeforeScenario` hook already failed.
        _ => {
            for slot in slots {
                slot.resolved.skip();
            }
        }
    }

    if !disable_hooks {
        for hook in hooks.after_scenario() {
            let fut = hook(
                &feature,
                rule.as_deref(),
                &scenario,
                error.as_ref(),
                world.as_mut(),
            );
            if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                if error.is_none() {
                    error = Some(ScenarioError::Hook(panic_message(
                        payload.as_ref(),
                    )));
                }
                break;
            }
        }
    }

    let status = if error.is_some() {
        ScenarioStatus::Failed
    } else {
        ScenarioStatus::Passed
    };

    ScenarioResult {
        id,
        feature: feature.name.clone(),
        rule: rule.as_ref().map(|r| r.name.clone()),
        scenario: scenario.name.clone(),
        path: feature.path.clone(),
        status,
        error,
        feature_background: feature_background
            .into_iter()
            .map(|s| s.resolved)
            .collect(),
        rule_background: rule_background
            .into_iter()
            .map(|s| s.resolved)
            .collect(),
        steps: steps.into_iter().map(|s| s.resolved).collect(),
        started_at: Some(started_at),
        duration: Some(started.elapsed()),
    }
}

/// Runs a single step with its hooks, recording the outcome on the slot.
///
/// Returns the step's error, if it failed.
async fn run_step<W: World>(
    slot: &mut StepSlot<W>,
    world: &mut W,
    hooks: &Hooks<W>,
    disable_hooks: bool,
) -> Option<StepError> {
    let started_at = Utc::now();
    let started = Instant::now();
    let mut error: Option<StepError> = None;

    if !disable_hooks {
        for hook in hooks.before_step() {
            let fut = hook(&slot.step, world);
            if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                error =
                    Some(StepError::HookPanic(panic_message(payload.as_ref())));
                break;
            }
        }
    }

    // A capture that failed to coerce at resolution time fails the step
    // here, without invoking the handler.
    if error.is_none() {
        error = slot.deferred.take();
    }

    if error.is_none() {
        let context = Context::new(
            slot.step.clone(),
            slot.resolved.captures.clone(),
            slot.resolved.offsets.clone(),
            slot.resolved.args.clone(),
        );
        let fut = (slot.func)(world, context);
        #[cfg(feature = "tracing")]
        let fut = fut.instrument(tracing::info_span!(
            "step",
            text = slot.resolved.text.as_str(),
        ));
        error = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => None,
            Ok(Err(failure)) => Some(StepError::Failed(failure)),
            Err(payload) => {
                Some(StepError::Panic(panic_message(payload.as_ref())))
            }
        };
    }

    if !disable_hooks {
        for hook in hooks.after_step() {
            let fut = hook(&slot.step, error.as_ref(), world);
            if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                // Fails an otherwise passed step, but the earlier error
                // stays if there was one.
                if error.is_none() {
                    error = Some(StepError::HookPanic(panic_message(
                        payload.as_ref(),
                    )));
                }
                break;
            }
        }
    }

    let duration = started.elapsed();
    match &error {
        None => slot.resolved.pass(started_at, duration),
        Some(e) => slot.resolved.fail(e.clone(), started_at, duration),
    }
    error
}

/// Builds the result of a scenario never started because of fail-fast.
pub(crate) fn skip_scenario<W>(
    execution: ScenarioExecution<W>,
) -> ScenarioResult {
    let ScenarioExecution {
        id,
        feature,
        rule,
        scenario,
        mut feature_background,
        mut rule_background,
        mut steps,
    } = execution;

    for slot in feature_background
        .iter_mut()
        .chain(rule_background.iter_mut())
        .chain(steps.iter_mut())
    {
        slot.resolved.skip();
    }

    ScenarioResult {
        id,
        feature: feature.name.clone(),
        rule: rule.as_ref().map(|r| r.name.clone()),
        scenario: scenario.name.clone(),
        path: feature.path.clone(),
        status: ScenarioStatus::Skipped,
        error: None,
        feature_background: feature_background
            .into_iter()
            .map(|s| s.resolved)
            .collect(),
        rule_background: rule_background
            .into_iter()
            .map(|s| s.resolved)
            .collect(),
        steps: steps.into_iter().map(|s| s.resolved).collect(),
        started_at: None,
        duration: None,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use futures::future::LocalBoxFuture;

    use crate::{
        config::RunConfig,
        hook::HookSet,
        param::{CustomTypes, ParamKind, Value},
        runner::resolve::resolve_features,
        step::{Registry, StepResult, StepStatus},
    };

    use super::*;

    #[derive(Debug, Default)]
    struct Basket {
        cucumbers: u64,
    }

    impl World for Basket {
        type Error = Infallible;

        async fn new() -> Result<Self, Self::Error> {
            Ok(Self::default())
        }
    }

    fn put_cucumbers(
        basket: &mut Basket,
        ctx: Context,
    ) -> LocalBoxFuture<'_, StepResult> {
        Box::pin(async move {
            match ctx.arg(0) {
                Some(Value::Int(n)) => {
                    basket.cucumbers += u64::try_from(*n).unwrap_or_default();
                    Ok(())
                }
                _ => Err("expected an integer argument".into()),
            }
        })
    }

    fn basket_holds(
        basket: &mut Basket,
        ctx: Context,
    ) -> LocalBoxFuture<'_, StepResult> {
        Box::pin(async move {
            let expected = match ctx.arg(0) {
                Some(Value::Int(n)) => u64::try_from(*n).unwrap_or_default(),
                _ => return Err("expected an integer argument".into()),
            };
            if basket.cucumbers == expected {
                Ok(())
            } else {
                Err(format!(
                    "basket holds {}, not {expected}",
                    basket.cucumbers,
                )
                .into())
            }
        })
    }

    fn explode(_: &mut Basket, _: Context) -> LocalBoxFuture<'_, StepResult> {
        Box::pin(async { panic!("kaboom") })
    }

    fn registry() -> Registry<Basket> {
        let mut registry = Registry::new();
        registry
            .register(
                r"^I put (\d+) cucumbers in$",
                vec![ParamKind::Int],
                "put_cucumbers",
                None,
                put_cucumbers,
            )
            .unwrap();
        registry
            .register(
                r"^the basket holds (\d+) cucumbers$",
                vec![ParamKind::Int],
                "basket_holds",
                None,
                basket_holds,
            )
            .unwrap();
        registry
            .register(
                r"^the scales break$",
                vec![],
                "explode",
                None,
                explode,
            )
            .unwrap();
        registry
            .register(
                r"^I wait (\S+) seconds$",
                vec![ParamKind::Int],
                "wait_seconds",
                None,
                put_cucumbers,
            )
            .unwrap();
        registry
    }

    fn execution(src: &str) -> ScenarioExecution<Basket> {
        let feature =
            gherkin::Feature::parse(src, gherkin::GherkinEnv::default())
                .expect("valid feature");
        resolve_features(
            &[feature],
            &registry(),
            &CustomTypes::new(),
            &RunConfig::new(),
        )
        .expect("resolvable scenario")
        .pop()
        .expect("one scenario")
    }

    fn statuses(steps: &[crate::step::ResolvedStep]) -> Vec<StepStatus> {
        steps.iter().map(|s| s.status).collect()
    }

    #[tokio::test]
    async fn passes_steps_and_shares_world_between_them() {
        // language=Gherkin
        let execution = execution(
            r"
Feature: Market
  Scenario: Filling up
    When I put 4 cucumbers in
    And I put 2 cucumbers in
    Then the basket holds 6 cucumbers
",
        );

        let result =
            execute_scenario(execution, &Hooks::new(), false).await;

        assert_eq!(result.status, ScenarioStatus::Passed);
        assert!(result.error.is_none());
        assert_eq!(
            statuses(&result.steps),
            [StepStatus::Passed, StepStatus::Passed, StepStatus::Passed],
        );
        assert!(result.steps.iter().all(|s| s.duration.is_some()));
        assert!(result.duration.is_some());
    }

    #[tokio::test]
    async fn failing_step_skips_the_rest() {
        // language=Gherkin
        let execution = execution(
            r"
Feature: Market
  Scenario: Wrong count
    When I put 4 cucumbers in
    Then the basket holds 9 cucumbers
    And I put 1 cucumbers in
",
        );

        let result =
            execute_scenario(execution, &Hooks::new(), false).await;

        assert_eq!(result.status, ScenarioStatus::Failed);
        assert_eq!(
            statuses(&result.steps),
            [StepStatus::Passed, StepStatus::Failed, StepStatus::Skipped],
        );
        assert!(matches!(
            result.error,
            Some(ScenarioError::Step(StepError::Failed(_))),
        ));
        // Skipped steps carry neither error nor timing.
        assert!(result.steps[2].error.is_none());
        assert!(result.steps[2].duration.is_none());
    }

    #[tokio::test]
    async fn panicking_handler_is_caught_and_reported() {
        // language=Gherkin
        let execution = execution(
            r"
Feature: Market
  Scenario: Weighing
    When the scales break
    Then the basket holds 0 cucumbers
",
        );

        let result =
            execute_scenario(execution, &Hooks::new(), false).await;

        assert_eq!(result.status, ScenarioStatus::Failed);
        assert_eq!(
            statuses(&result.steps),
            [StepStatus::Failed, StepStatus::Skipped],
        );
        match &result.steps[0].error {
            Some(StepError::Panic(message)) => {
                assert_eq!(message, "kaboom");
            }
            other => panic!("expected Panic, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn background_failure_cascades_into_scenario_steps() {
        // language=Gherkin
        let execution = execution(
            r"
Feature: Market
  Background:
    Given the scales break

  Scenario: Filling up
    When I put 4 cucumbers in
",
        );

        let result =
            execute_scenario(execution, &Hooks::new(), false).await;

        assert_eq!(result.status, ScenarioStatus::Failed);
        assert_eq!(
            statuses(&result.feature_background),
            [StepStatus::Failed],
        );
        assert_eq!(statuses(&result.steps), [StepStatus::Skipped]);
    }

    #[tokio::test]
    async fn deferred_coercion_failure_fails_its_step() {
        // language=Gherkin
        let execution = execution(
            r"
Feature: Market
  Scenario: Impatience
    When I put 4 cucumbers in
    And I wait several seconds
",
        );

        let result =
            execute_scenario(execution, &Hooks::new(), false).await;

        assert_eq!(result.status, ScenarioStatus::Failed);
        assert_eq!(
            statuses(&result.steps),
            [StepStatus::Passed, StepStatus::Failed],
        );
        assert!(matches!(
            result.steps[1].error,
            Some(StepError::Coerce(_)),
        ));
    }

    mod worlds {
        use super::*;

        #[derive(Debug)]
        struct Flaky;

        impl World for Flaky {
            type Error = String;

            async fn new() -> Result<Self, Self::Error> {
                Err("no database".into())
            }
        }

        fn flaky_noop(
            _: &mut Flaky,
            _: Context,
        ) -> LocalBoxFuture<'_, StepResult> {
            Box::pin(async { Ok(()) })
        }

        static AFTER_SAW_FAILURE: AtomicUsize = AtomicUsize::new(0);

        fn flaky_after<'a>(
            _: &'a gherkin::Feature,
            _: Option<&'a gherkin::Rule>,
            _: &'a gherkin::Scenario,
            error: Option<&'a ScenarioError>,
            world: Option<&'a mut Flaky>,
        ) -> LocalBoxFuture<'a, ()> {
            Box::pin(async move {
                if error.is_some() && world.is_none() {
                    AFTER_SAW_FAILURE.fetch_add(1, Ordering::SeqCst);
                }
            })
        }

        #[tokio::test]
        async fn world_failure_skips_steps_but_still_notifies() {
            let mut registry = Registry::<Flaky>::new();
            registry
                .register(r"^anything$", vec![], "noop", None, flaky_noop)
                .unwrap();

            // language=Gherkin
            let feature = gherkin::Feature::parse(
                r"
Feature: Market
  Scenario: Opening
    Given anything
",
                gherkin::GherkinEnv::default(),
            )
            .unwrap();
            let execution = resolve_features(
                &[feature],
                &registry,
                &CustomTypes::new(),
                &RunConfig::new(),
            )
            .unwrap()
            .pop()
            .unwrap();

            let mut hooks = Hooks::new();
            hooks.add(HookSet::new(0).after_scenario(flaky_after));

            let result = execute_scenario(execution, &hooks, false).await;

            assert_eq!(result.status, ScenarioStatus::Failed);
            match &result.error {
                Some(ScenarioError::World(message)) => {
                    assert!(message.contains("no database"));
                }
                other => panic!("expected World, got: {other:?}"),
            }
            assert_eq!(statuses(&result.steps), [StepStatus::Skipped]);
            assert_eq!(AFTER_SAW_FAILURE.load(Ordering::SeqCst), 1);
        }
    }

    mod hook_panics {
        use super::*;

        fn exploding_before<'a>(
            _: &'a gherkin::Feature,
            _: Option<&'a gherkin::Rule>,
            _: &'a gherkin::Scenario,
            _: &'a mut Basket,
        ) -> LocalBoxFuture<'a, ()> {
            Box::pin(async { panic!("hook blew up") })
        }

        fn exploding_after_step<'a>(
            _: &'a gherkin::Step,
            _: Option<&'a StepError>,
            _: &'a mut Basket,
        ) -> LocalBoxFuture<'a, ()> {
            Box::pin(async { panic!("scales tampered") })
        }

        #[tokio::test]
        async fn before_scenario_panic_fails_without_running_steps() {
            // language=Gherkin
            let execution = execution(
                r"
Feature: Market
  Scenario: Filling up
    When I put 4 cucumbers in
",
            );

            let mut hooks = Hooks::new();
            hooks.add(HookSet::new(0).before_scenario(exploding_before));

            let result = execute_scenario(execution, &hooks, false).await;

            assert_eq!(result.status, ScenarioStatus::Failed);
            match &result.error {
                Some(ScenarioError::Hook(message)) => {
                    assert!(message.contains("hook blew up"));
                }
                other => panic!("expected Hook, got: {other:?}"),
            }
            assert_eq!(statuses(&result.steps), [StepStatus::Skipped]);
        }

        #[tokio::test]
        async fn after_step_panic_fails_a_passed_step() {
            // language=Gherkin
            let execution = execution(
                r"
Feature: Market
  Scenario: Filling up
    When I put 4 cucumbers in
    Then the basket holds 4 cucumbers
",
            );

            let mut hooks = Hooks::new();
            hooks.add(HookSet::new(0).after_step(exploding_after_step));

            let result = execute_scenario(execution, &hooks, false).await;

            assert_eq!(result.status, ScenarioStatus::Failed);
            assert_eq!(
                statuses(&result.steps),
                [StepStatus::Failed, StepStatus::Skipped],
            );
            assert!(matches!(
                result.steps[0].error,
                Some(StepError::HookPanic(_)),
            ));
        }
    }

    mod disabled_hooks {
        use super::*;

        static PROBES: AtomicUsize = AtomicUsize::new(0);

        fn probe_before<'a>(
            _: &'a gherkin::Feature,
            _: Option<&'a gherkin::Rule>,
            _: &'a gherkin::Scenario,
            _: &'a mut Basket,
        ) -> LocalBoxFuture<'a, ()> {
            Box::pin(async {
                PROBES.fetch_add(1, Ordering::SeqCst);
            })
        }

        fn probe_step<'a>(
            _: &'a gherkin::Step,
            _: &'a mut Basket,
        ) -> LocalBoxFuture<'a, ()> {
            Box::pin(async {
                PROBES.fetch_add(1, Ordering::SeqCst);
            })
        }

        #[tokio::test]
        async fn disabling_hooks_skips_every_lifecycle_point() {
            // language=Gherkin
            let execution = execution(
                r"
Feature: Market
  Scenario: Filling up
    When I put 4 cucumbers in
",
            );

            let mut hooks = Hooks::new();
            hooks.add(
                HookSet::new(0)
                    .before_scenario(probe_before)
                    .before_step(probe_step),
            );

            let result = execute_scenario(execution, &hooks, true).await;

            assert_eq!(result.status, ScenarioStatus::Passed);
            assert_eq!(PROBES.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn skipped_scenario_reports_inert_steps() {
        // language=Gherkin
        let execution = execution(
            r"
Feature: Market
  Scenario: Never run
    When I put 4 cucumbers in
",
        );

        let result = skip_scenario(execution);

        assert_eq!(result.status, ScenarioStatus::Skipped);
        assert!(result.error.is_none());
        assert!(result.started_at.is_none());
        assert_eq!(result.scenario, "Never run");
        assert_eq!(statuses(&result.steps), [StepStatus::Skipped]);
    }
}
