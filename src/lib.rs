// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Keyword-agnostic, async-first execution engine for [Gherkin] features.
//!
//! Step texts of parsed [`gherkin::Feature`]s are matched against
//! regex-defined step definitions, their captures are coerced into typed
//! [`Value`]s, and every scenario executes against a fresh [`World`]
//! instance, concurrently up to a configured limit.
//!
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference

pub extern crate gherkin;
pub extern crate globwalk;

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod hook;
pub mod outline;
pub mod param;
pub mod runner;
pub mod step;
pub mod tagexpr;
pub mod world;

pub use gherkin::{Feature, Rule, Scenario, Step};

#[doc(inline)]
pub use self::{
    cli::Cli,
    config::RunConfig,
    engine::Engine,
    error::{Error, Result},
    hook::{HookSet, Hooks},
    param::{CustomType, ParamKind, Value},
    runner::{
        RunResult, ScenarioError, ScenarioId, ScenarioResult, ScenarioStatus,
        Stats,
    },
    step::{
        Context, Location, ResolvedStep, StepError, StepFailure, StepFn,
        StepResult, StepStatus,
    },
    tagexpr::TagExpr,
    world::World,
};
