// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Error`] aborting a whole run.
//!
//! Everything here is a configuration error: detected before or at the
//! start of a run, with no partial execution. Per-step failures live in
//! [`StepError`](crate::step::StepError) instead and never surface here.

use std::{io, path::PathBuf};

use derive_more::derive::{Display, Error, From};

use crate::{
    outline::ExpandExamplesError,
    param::CustomTypeError,
    step::{AmbiguousMatchError, RegistryError},
    tagexpr::InvalidTagExpression,
};

/// Error aborting a whole run before any scenario executes.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Invalid or colliding step definition.
    #[display("invalid step definition: {_0}")]
    Pattern(RegistryError),

    /// Malformed tag expression.
    #[display("{_0}")]
    TagExpr(InvalidTagExpression),

    /// Step matching no registered pattern.
    #[display("{_0}")]
    Unresolved(UnresolvedStep),

    /// Step matching more than one registered pattern.
    #[display("step `{text}` matches multiple patterns. {source}")]
    #[from(ignore)]
    Ambiguous {
        /// The ambiguous step text.
        text: String,

        /// The matches it triggered.
        source: AmbiguousMatchError,
    },

    /// Invalid custom type registration.
    #[display("invalid custom type: {_0}")]
    CustomType(CustomTypeError),

    /// Declared parameter kind referencing an unregistered custom type.
    #[display("step `{text}` references unknown custom type `{name}`")]
    #[from(ignore)]
    UnknownCustomType {
        /// Name of the unresolved type.
        name: String,

        /// The step text whose definition declared it.
        text: String,
    },

    /// Scenario Outline expansion failure.
    #[display("{_0}")]
    Expand(ExpandExamplesError),

    /// Feature file parsing failure.
    #[display("failed to parse feature file: {_0}")]
    Parse(gherkin::ParseFileError),

    /// Malformed feature discovery glob.
    #[display("failed to build features glob: {_0}")]
    Glob(globwalk::GlobError),

    /// I/O failure during feature discovery.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),
}

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Step of the resolution pass matching no registered pattern.
///
/// Intentionally fail-fast at the whole-run granularity: an unmatched step
/// indicates a configuration defect, not a transient scenario condition.
#[derive(Clone, Debug, Display, Error)]
#[display(
    "no step definition matches `{text}` (scenario `{scenario}`, feature \
     `{feature}`{})",
    path.as_deref().map(|p| format!(" at {}", p.display())).unwrap_or_default(),
)]
pub struct UnresolvedStep {
    /// The unmatched step text.
    pub text: String,

    /// Name of the feature containing the step.
    pub feature: String,

    /// Name of the scenario containing the step.
    pub scenario: String,

    /// Path to the `.feature` file, if known.
    pub path: Option<PathBuf>,
}
