// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definitions: the [`Registry`] storing handler [`Fn`]s keyed by their
//! [`Regex`] patterns, and the machinery for matching and resolving
//! [`gherkin::Step`]s against it.
//!
//! - [`context`]: execution context handed to a matched handler
//! - [`error`]: registration and matching failures
//! - [`location`]: source location of a step definition
//! - [`regex`]: hashable [`Regex`] wrapper used as the registry key
//! - [`registry`]: pattern table, duplicate detection and lookup
//! - [`resolved`]: outcome of binding a step to its definition
//!
//! [`Regex`]: regex::Regex

pub mod context;
pub mod error;
pub mod location;
pub mod regex;
pub mod registry;
pub mod resolved;

#[doc(inline)]
pub use self::{
    context::{CaptureName, CaptureOffsets, Context},
    error::{AmbiguousMatchError, RegistryError},
    location::Location,
    regex::HashableRegex,
    registry::{Match, Registry, StepDef, StepFailure, StepFn, StepResult},
    resolved::{DefinitionInfo, ResolvedStep, StepError, StepStatus},
};
