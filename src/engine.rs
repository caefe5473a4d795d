// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Engine`] executor.

use std::path::Path;

use crate::{
    config::RunConfig,
    error::Error,
    hook::{HookSet, Hooks},
    param::{CustomType, CustomTypes, ParamKind},
    runner::{self, RunResult},
    step::{Location, Registry, StepFn},
    world::World,
};

/// Top-level executor tying step definitions, custom parameter types,
/// lifecycle hooks and a [`RunConfig`] together.
///
/// Use [`Engine::new()`] to get an empty executor, register step
/// definitions with [`Engine::given()`], [`Engine::when()`] and
/// [`Engine::then()`] (typically from generated glue code), then execute
/// already parsed [`gherkin::Feature`]s with [`Engine::run()`], or discover
/// and parse `.feature` files with [`Engine::run_files()`].
///
/// Registration never fails at the call site: the first invalid
/// registration is remembered and returned by [`Engine::run()`] before any
/// scenario executes.
pub struct Engine<W> {
    /// Step definitions matched against step texts.
    registry: Registry<W>,

    /// User-defined parameter types for declared coercions.
    custom_types: CustomTypes,

    /// Lifecycle callbacks around runs, scenarios and steps.
    hooks: Hooks<W>,

    /// Controls of which scenarios run and how.
    config: RunConfig,

    /// First registration error, reported by [`Engine::run()`].
    defect: Option<Error>,
}

impl<W> Engine<W> {
    /// Creates an empty [`Engine`] executor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a [Given] step definition.
    ///
    /// `param_kinds` declares how each capture group of the `pattern`
    /// coerces, while an empty list coerces every capture as a plain
    /// string. `fn_name` and `location` only feed diagnostics.
    ///
    /// Matching is keyword-agnostic: `Given`, `When`, `Then`, `And` and
    /// `But` steps all match against the same definitions, so the chosen
    /// method only documents intent.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[must_use]
    pub fn given(
        self,
        pattern: &str,
        param_kinds: Vec<ParamKind>,
        fn_name: &'static str,
        location: Option<Location>,
        func: StepFn<W>,
    ) -> Self {
        self.register(pattern, param_kinds, fn_name, location, func)
    }

    /// Registers a [When] step definition.
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[must_use]
    pub fn when(
        self,
        pattern: &str,
        param_kinds: Vec<ParamKind>,
        fn_name: &'static str,
        location: Option<Location>,
        func: StepFn<W>,
    ) -> Self {
        self.register(pattern, param_kinds, fn_name, location, func)
    }

    /// Registers a [Then] step definition.
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[must_use]
    pub fn then(
        self,
        pattern: &str,
        param_kinds: Vec<ParamKind>,
        fn_name: &'static str,
        location: Option<Location>,
        func: StepFn<W>,
    ) -> Self {
        self.register(pattern, param_kinds, fn_name, location, func)
    }

    /// Registers a custom parameter type for declared coercions.
    ///
    /// A name collision with an already registered type, or an empty value
    /// table, is reported by [`Engine::run()`].
    #[must_use]
    pub fn custom_type(mut self, ty: CustomType) -> Self {
        if let Err(e) = self.custom_types.register(ty) {
            _ = self.defect.get_or_insert(e.into());
        }
        self
    }

    /// Registers a [`HookSet`] of lifecycle callbacks.
    ///
    /// Multiple sets may be registered; at every lifecycle point the
    /// non-empty slots of all sets run in ascending [`HookSet::order`].
    #[must_use]
    pub fn hooks(mut self, set: HookSet<W>) -> Self {
        self.hooks.add(set);
        self
    }

    /// Replaces the [`RunConfig`].
    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Step definitions registered so far.
    #[must_use]
    pub fn registry(&self) -> &Registry<W> {
        &self.registry
    }

    /// Custom parameter types registered so far.
    #[must_use]
    pub fn custom_types(&self) -> &CustomTypes {
        &self.custom_types
    }

    /// The current [`RunConfig`].
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn register(
        mut self,
        pattern: &str,
        param_kinds: Vec<ParamKind>,
        fn_name: &'static str,
        location: Option<Location>,
        func: StepFn<W>,
    ) -> Self {
        let res = self
            .registry
            .register(pattern, param_kinds, fn_name, location, func);
        if let Err(e) = res {
            // Only the first defect is kept.
            _ = self.defect.get_or_insert(e.into());
        }
        self
    }
}

impl<W: World> Engine<W> {
    /// Executes the given [`gherkin::Feature`]s to completion.
    ///
    /// Outline scenarios are expanded, every step of every selected
    /// scenario is resolved against the registered definitions, and the
    /// resolved scenarios execute concurrently up to
    /// [`RunConfig::concurrency`].
    ///
    /// # Errors
    ///
    /// The first invalid registration remembered by [`Engine::given()`] and
    /// friends, or any configuration error detected during expansion and
    /// resolution. No scenario executes in that case.
    pub async fn run(
        mut self,
        features: Vec<gherkin::Feature>,
    ) -> Result<RunResult, Error> {
        if let Some(defect) = self.defect.take() {
            return Err(defect);
        }
        runner::run(
            features,
            &self.registry,
            &self.custom_types,
            &self.hooks,
            &self.config,
        )
        .await
    }

    /// Discovers, parses and executes `.feature` files under `input`.
    ///
    /// A directory is walked recursively for files with a case-insensitive
    /// `.feature` extension and the parsed [`gherkin::Feature`]s are run in
    /// deterministic path order. A single file is parsed as is.
    ///
    /// # Errors
    ///
    /// In addition to the [`Engine::run()`] errors: if `input` cannot be
    /// canonicalized, the walk fails to build, or a discovered file fails
    /// to parse.
    pub async fn run_files(
        self,
        input: impl AsRef<Path>,
    ) -> Result<RunResult, Error> {
        let path = input.as_ref().canonicalize()?;

        let mut features = if path.is_file() {
            let env = gherkin::GherkinEnv::default();
            gherkin::Feature::parse_path(path, env).map(|f| vec![f])?
        } else {
            let walker = globwalk::GlobWalkerBuilder::new(path, "*.feature")
                .case_insensitive(true)
                .build()?;
            walker
                .filter_map(Result::ok)
                .map(|entry| {
                    let env = gherkin::GherkinEnv::default();
                    gherkin::Feature::parse_path(entry.path(), env)
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        features.sort_by(|a, b| a.path.cmp(&b.path));

        self.run(features).await
    }
}

// Implemented manually to omit redundant `World: Default` trait bound,
// imposed by `#[derive(Default)]`.
impl<W> Default for Engine<W> {
    fn default() -> Self {
        Self {
            registry: Registry::new(),
            custom_types: CustomTypes::new(),
            hooks: Hooks::new(),
            config: RunConfig::default(),
            defect: None,
        }
    }
}

// Implemented manually to omit redundant `World: Debug` trait bound, imposed
// by `#[derive(Debug)]`.
impl<W> std::fmt::Debug for Engine<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("custom_types", &self.custom_types)
            .field("hooks", &self.hooks)
            .field("config", &self.config)
            .field("defect", &self.defect)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::future::LocalBoxFuture;

    use crate::{
        param::{CustomTypeError, UnderlyingKind, Value},
        step::{Context, RegistryError, StepResult},
    };

    use super::*;

    #[derive(Debug, Default)]
    struct Basket {
        cucumbers: u64,
    }

    impl World for Basket {
        type Error = Infallible;

        async fn new() -> std::result::Result<Self, Self::Error> {
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

    fn parse(src: &str) -> gherkin::Feature {
        gherkin::Feature::parse(src, gherkin::GherkinEnv::default()).unwrap()
    }

    #[tokio::test]
    async fn runs_registered_steps_against_parsed_features() {
        // language=Gherkin
        let src = r"
Feature: Basket arithmetic
  Scenario: Filling
    Given I put 2 cucumbers in
    And I put 3 cucumbers in
    Then the basket holds 5 cucumbers
";

        let result = Engine::<Basket>::new()
            .given(
                r"^I put (\d+) cucumbers in$",
                vec![ParamKind::Int],
                "put_cucumbers",
                None,
                put_cucumbers,
            )
            .then(
                r"^the basket holds (\d+) cucumbers$",
                vec![ParamKind::Int],
                "basket_holds",
                None,
                basket_holds,
            )
            .run(vec![parse(src)])
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.scenario_stats.passed, 1);
        assert_eq!(result.step_stats.passed, 3);
    }

    #[tokio::test]
    async fn empty_run_is_successful() {
        let result = Engine::<Basket>::new().run(vec![]).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.scenario_stats.total(), 0);
    }

    #[tokio::test]
    async fn invalid_pattern_is_reported_at_run() {
        let err = Engine::<Basket>::new()
            .given(r"broken(", vec![], "put_cucumbers", None, put_cucumbers)
            .run(vec![])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Pattern(RegistryError::InvalidPattern { .. }),
        ));
    }

    #[tokio::test]
    async fn duplicate_pattern_across_keywords_reports_both_handlers() {
        let err = Engine::<Basket>::new()
            .given(
                r"^I put (\d+) cucumbers in$",
                vec![ParamKind::Int],
                "put_cucumbers",
                None,
                put_cucumbers,
            )
            .when(
                r"^I put (\d+) cucumbers in$",
                vec![ParamKind::Int],
                "basket_holds",
                None,
                basket_holds,
            )
            .run(vec![])
            .await
            .unwrap_err();

        let rendered = err.to_string();
        assert!(rendered.contains("put_cucumbers"));
        assert!(rendered.contains("basket_holds"));
    }

    #[tokio::test]
    async fn only_the_first_defect_is_reported() {
        let err = Engine::<Basket>::new()
            .given(r"broken(", vec![], "put_cucumbers", None, put_cucumbers)
            .given(r"^twice$", vec![], "put_cucumbers", None, put_cucumbers)
            .given(r"^twice$", vec![], "basket_holds", None, basket_holds)
            .run(vec![])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Pattern(RegistryError::InvalidPattern { .. }),
        ));
    }

    #[tokio::test]
    async fn custom_type_collision_is_reported_at_run() {
        let err = Engine::<Basket>::new()
            .custom_type(CustomType::new(
                "switch",
                UnderlyingKind::Word,
                [("on", "on"), ("off", "off")],
            ))
            .custom_type(CustomType::new(
                "Switch",
                UnderlyingKind::Word,
                [("up", "on")],
            ))
            .run(vec![])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::CustomType(CustomTypeError::DuplicateType { ref name })
                if name == "switch",
        ));
    }

    #[test]
    fn accessors_expose_the_registered_state() {
        let engine = Engine::<Basket>::new()
            .given(
                r"^I put (\d+) cucumbers in$",
                vec![ParamKind::Int],
                "put_cucumbers",
                None,
                put_cucumbers,
            )
            .custom_type(CustomType::new(
                "switch",
                UnderlyingKind::Word,
                [("on", "on")],
            ))
            .with_config(RunConfig {
                concurrency: 7,
                ..RunConfig::default()
            });

        assert_eq!(engine.registry().len(), 1);
        assert_eq!(engine.custom_types().len(), 1);
        assert_eq!(engine.config().concurrency, 7);
    }
}
