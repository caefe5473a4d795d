//! Resolution of parsed scenarios against the step registry.
//!
//! Resolution runs after outline expansion and before anything executes:
//! every selected scenario has each of its steps (feature background, rule
//! background, then its own) matched against the [`Registry`] and its
//! captures coerced into typed [`Value`]s. An unresolved or ambiguously
//! matched step aborts the whole run, so a misconfigured suite never
//! half-executes.
//!
//! [`Value`]: crate::param::Value

use std::sync::Arc;

use crate::{
    config::RunConfig,
    error::{Error, UnresolvedStep},
    param::{coerce, CoerceError, CustomTypes, ParamKind},
    step::{DefinitionInfo, Registry, ResolvedStep, StepError, StepFn},
    tagexpr::TagExpr,
};

use super::result::ScenarioId;

/// A step bound to its matched handler, ready to execute.
#[derive(Debug)]
pub(crate) struct StepSlot<World> {
    /// The parsed step, handed to hooks and the handler's context.
    pub(crate) step: gherkin::Step,

    /// Resolution record, mutated in place by the executor.
    pub(crate) resolved: ResolvedStep,

    /// Handler to invoke.
    pub(crate) func: StepFn<World>,

    /// Coercion failure deferred to execution time.
    ///
    /// The match itself succeeded, so a malformed capture fails only the
    /// owning scenario once it runs, not the whole run.
    pub(crate) deferred: Option<StepError>,
}

/// Everything needed to execute one scenario.
#[derive(Debug)]
pub(crate) struct ScenarioExecution<World> {
    /// Unique ID of this scenario execution.
    pub(crate) id: ScenarioId,

    /// Feature the scenario belongs to.
    pub(crate) feature: Arc<gherkin::Feature>,

    /// Enclosing rule, if any.
    pub(crate) rule: Option<Arc<gherkin::Rule>>,

    /// The scenario itself, with outline placeholders already substituted.
    pub(crate) scenario: Arc<gherkin::Scenario>,

    /// Resolved feature background steps.
    pub(crate) feature_background: Vec<StepSlot<World>>,

    /// Resolved rule background steps.
    pub(crate) rule_background: Vec<StepSlot<World>>,

    /// The scenario's own resolved steps.
    pub(crate) steps: Vec<StepSlot<World>>,
}

/// Resolves every selected scenario of the given features.
///
/// Selection evaluates the configured tag filter against each scenario's
/// effective tags. Backgrounds of selected scenarios are always resolved,
/// filtering applies to scenarios only.
pub(crate) fn resolve_features<W>(
    features: &[gherkin::Feature],
    registry: &Registry<W>,
    custom_types: &CustomTypes,
    config: &RunConfig,
) -> Result<Vec<ScenarioExecution<W>>, Error> {
    let filter = config.tag_filter.as_ref();
    let mut executions = vec![];

    for feature in features {
        let feature = Arc::new(feature.clone());
        for scenario in &feature.scenarios {
            if !selected(filter, &feature, None, scenario) {
                continue;
            }
            executions.push(resolve_scenario(
                &feature,
                None,
                scenario,
                registry,
                custom_types,
            )?);
        }
        for rule in &feature.rules {
            let rule = Arc::new(rule.clone());
            for scenario in &rule.scenarios {
                if !selected(filter, &feature, Some(&rule), scenario) {
                    continue;
                }
                executions.push(resolve_scenario(
                    &feature,
                    Some(&rule),
                    scenario,
                    registry,
                    custom_types,
                )?);
            }
        }
    }

    Ok(executions)
}

/// Evaluates a tag filter against a scenario's effective tags.
///
/// Effective tags are the scenario's own tags joined with those of its
/// enclosing rule and feature. [`gherkin`] stores tags without the leading
/// `@`, while filter expressions name tags with it, so the prefix is
/// restored here before matching.
fn selected(
    filter: Option<&TagExpr>,
    feature: &gherkin::Feature,
    rule: Option<&Arc<gherkin::Rule>>,
    scenario: &gherkin::Scenario,
) -> bool {
    let Some(expr) = filter else {
        return true;
    };

    let effective: Vec<_> = scenario
        .tags
        .iter()
        .chain(rule.iter().flat_map(|r| &r.tags))
        .chain(&feature.tags)
        .map(|tag| {
            if tag.starts_with('@') {
                tag.clone()
            } else {
                format!("@{tag}")
            }
        })
        .collect();

    expr.eval(&effective)
}

/// Resolves all steps of a single scenario.
fn resolve_scenario<W>(
    feature: &Arc<gherkin::Feature>,
    rule: Option<&Arc<gherkin::Rule>>,
    scenario: &gherkin::Scenario,
    registry: &Registry<W>,
    custom_types: &CustomTypes,
) -> Result<ScenarioExecution<W>, Error> {
    let resolve = |step: &gherkin::Step| {
        resolve_step(step, feature, scenario, registry, custom_types)
    };

    let feature_background = feature
        .background
        .as_ref()
        .map(|bg| bg.steps.iter())
        .into_iter()
        .flatten()
        .map(resolve)
        .collect::<Result<Vec<_>, _>>()?;
    let rule_background = rule
        .and_then(|r| r.background.as_ref())
        .map(|bg| bg.steps.iter())
        .into_iter()
        .flatten()
        .map(resolve)
        .collect::<Result<Vec<_>, _>>()?;
    let steps = scenario
        .steps
        .iter()
        .map(resolve)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ScenarioExecution {
        id: ScenarioId::new(),
        feature: Arc::clone(feature),
        rule: rule.map(Arc::clone),
        scenario: Arc::new(scenario.clone()),
        feature_background,
        rule_background,
        steps,
    })
}

/// Matches a single step against the registry and coerces its captures.
fn resolve_step<W>(
    step: &gherkin::Step,
    feature: &gherkin::Feature,
    scenario: &gherkin::Scenario,
    registry: &Registry<W>,
    custom_types: &CustomTypes,
) -> Result<StepSlot<W>, Error> {
    let matched = registry
        .find(&step.value)
        .map_err(|source| Error::Ambiguous {
            text: step.value.clone(),
            source,
        })?
        .ok_or_else(|| {
            Error::Unresolved(UnresolvedStep {
                text: step.value.clone(),
                feature: feature.name.clone(),
                scenario: scenario.name.clone(),
                path: feature.path.clone(),
            })
        })?;

    let definition = DefinitionInfo {
        pattern: matched.pattern.to_string(),
        fn_name: matched.def.fn_name,
        location: matched.def.location,
    };

    // Captures without a declared kind coerce as verbatim strings.
    let mut args = Vec::with_capacity(matched.captures.len());
    let mut deferred = None;
    for (i, (_, text)) in matched.captures.iter().enumerate() {
        let kind = matched.def.param_kinds.get(i).unwrap_or(&ParamKind::Word);
        match coerce(kind, text, custom_types) {
            Ok(value) => args.push(value),
            Err(CoerceError::UnknownCustomType { name }) => {
                // A step referencing an unregistered type is a suite
                // misconfiguration, not a data problem of one scenario.
                return Err(Error::UnknownCustomType {
                    name,
                    text: step.value.clone(),
                });
            }
            Err(err) => {
                deferred = Some(StepError::Coerce(err));
                break;
            }
        }
    }

    Ok(StepSlot {
        step: step.clone(),
        resolved: ResolvedStep::new(
            step.keyword.clone(),
            step.ty,
            step.value.clone(),
            definition,
            args,
            matched.captures,
            matched.offsets,
        ),
        func: matched.def.func,
        deferred,
    })
}
