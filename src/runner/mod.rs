// Copyright (c) 2018-2023  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Scenario runner.
//!
//! A run goes through four phases: outline expansion, tag filtering,
//! resolution and execution. The first three happen strictly before any
//! scenario executes, so a configuration problem (an unresolved step, an
//! ambiguous match, an unknown custom type) aborts the run with an error
//! while nothing has run yet. Execution then drives the resolved scenarios
//! concurrently, each with its own fresh [`World`].

use std::{
    panic::{self, AssertUnwindSafe},
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use chrono::Utc;
use futures::{channel::mpsc, stream, FutureExt as _, StreamExt as _};
#[cfg(feature = "tracing")]
use tracing::Instrument as _;

use crate::{
    config::RunConfig,
    error::Error,
    hook::Hooks,
    outline::Ext as _,
    param::CustomTypes,
    step::Registry,
    world::World,
};

mod executor;
mod resolve;
pub mod result;

#[doc(inline)]
pub use self::result::{
    RunResult, ScenarioError, ScenarioId, ScenarioResult, ScenarioStatus,
    Stats,
};

/// Runs every selected scenario of the given features.
///
/// # Errors
///
/// If outline expansion or resolution fails. Failures of the scenarios
/// themselves never error the run, they are reported in the returned
/// [`RunResult`].
pub(crate) async fn run<W: World>(
    features: Vec<gherkin::Feature>,
    registry: &Registry<W>,
    custom_types: &CustomTypes,
    hooks: &Hooks<W>,
    config: &RunConfig,
) -> Result<RunResult, Error> {
    let started_at = Utc::now();
    let started = Instant::now();

    let features = features
        .into_iter()
        .map(gherkin::Feature::expand_examples)
        .collect::<Result<Vec<_>, _>>()?;

    let executions =
        resolve::resolve_features(&features, registry, custom_types, config)?;

    // Those panic hook shenanigans are done to avoid console messages like
    // "thread 'main' panicked at ..."
    //
    // 1. We obtain the current panic hook and replace it with an empty one.
    // 2. We run scenarios, which can panic. In that case the panic payload
    //    is caught and recorded on the failed step or scenario.
    // 3. We restore the original panic hook, because suppressing all panics
    //    doesn't sound like a very good idea.
    let panic_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));

    let mut before_all_panicked = false;
    if !config.disable_hooks {
        for hook in hooks.before_all() {
            if AssertUnwindSafe(hook()).catch_unwind().await.is_err() {
                before_all_panicked = true;
                break;
            }
        }
    }

    let (sender, mut receiver) = mpsc::unbounded();
    if before_all_panicked {
        // No scenario starts, but every one is still reported.
        for execution in executions {
            _ = sender.unbounded_send(executor::skip_scenario(execution));
        }
    } else {
        let failed = AtomicBool::new(false);
        let failed = &failed;
        stream::iter(executions)
            .for_each_concurrent(config.concurrency, |execution| {
                let sender = sender.clone();
                async move {
                    let result = if config.fail_fast
                        && failed.load(Ordering::SeqCst)
                    {
                        executor::skip_scenario(execution)
                    } else {
                        #[cfg(feature = "tracing")]
                        let span = execution.id.span();
                        let fut = executor::execute_scenario(
                            execution,
                            hooks,
                            config.disable_hooks,
                        );
                        #[cfg(feature = "tracing")]
                        let fut = fut.instrument(span);
                        fut.await
                    };
                    if result.is_failed() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    _ = sender.unbounded_send(result);
                }
            })
            .await;
    }
    drop(sender);

    if !config.disable_hooks {
        for hook in hooks.after_all() {
            // Nothing left to fail, but an `AfterAll` panic still must not
            // unwind past the run.
            _ = AssertUnwindSafe(hook()).catch_unwind().await;
        }
    }

    panic::set_hook(panic_hook);

    let mut scenarios = vec![];
    while let Ok(Some(result)) = receiver.try_next() {
        scenarios.push(result);
    }

    Ok(RunResult::new(scenarios, started_at, started.elapsed()))
}
