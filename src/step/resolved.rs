//! A step bound to its matched definition, ready to execute.
//!
//! [`ResolvedStep`]s are produced by the pre-execution resolution pass and
//! mutated in place by the executor of their owning scenario only. They are
//! what result consumers see after the run, including capture byte offsets
//! for parameter highlighting.

use std::time::Duration;

use chrono::{DateTime, Utc};
use derive_more::with_trait::{Display, Error, From};

use crate::param::{CoerceError, Value};

use super::{
    context::{CaptureName, CaptureOffsets},
    location::Location,
    registry::StepFailure,
};

/// Identity of the matched step definition, for diagnostics and reports.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("`{pattern}` ({fn_name})")]
pub struct DefinitionInfo {
    /// Pattern source the definition was registered under.
    pub pattern: String,

    /// Name of the handler `fn`.
    pub fn_name: &'static str,

    /// Source location of the handler, if reported.
    pub location: Option<Location>,
}

/// Execution status of a [`ResolvedStep`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum StepStatus {
    /// Resolved but not executed yet.
    #[display("pending")]
    Pending,

    /// Handler ran to completion.
    #[display("passed")]
    Passed,

    /// Handler, hook or coercion failed.
    #[display("failed")]
    Failed,

    /// Not executed because an earlier step failed.
    ///
    /// Skipped steps carry no error.
    #[display("skipped")]
    Skipped,
}

/// Failure recorded on a [`ResolvedStep`].
#[derive(Clone, Debug, Display, Error, From)]
pub enum StepError {
    /// A captured argument failed to coerce into its declared kind.
    #[display("{_0}")]
    Coerce(CoerceError),

    /// Handler returned a failure.
    #[display("{_0}")]
    Failed(StepFailure),

    /// Handler panicked; the payload is kept as the error message.
    #[display("step panicked: {_0}")]
    #[from(ignore)]
    Panic(#[error(not(source))] String),

    /// A before/after hook of this step panicked.
    #[display("hook panicked: {_0}")]
    #[from(ignore)]
    HookPanic(#[error(not(source))] String),
}

/// A scenario step bound to its matched definition and coerced arguments.
#[derive(Clone, Debug)]
pub struct ResolvedStep {
    /// Keyword as written in the feature file (`Given`, `And`, ...).
    pub keyword: String,

    /// Step type after `And`/`But` inheritance.
    pub ty: gherkin::StepType,

    /// The step text that was matched.
    pub text: String,

    /// The definition the text matched.
    pub definition: DefinitionInfo,

    /// Capture values coerced per the declared parameter kinds.
    pub args: Vec<Value>,

    /// Raw capture group texts, whole match excluded.
    pub captures: Vec<(CaptureName, String)>,

    /// Byte offsets of [`ResolvedStep::captures`] inside
    /// [`ResolvedStep::text`].
    pub offsets: Vec<CaptureOffsets>,

    /// Current execution status.
    pub status: StepStatus,

    /// Failure recorded by the executor, if any.
    pub error: Option<StepError>,

    /// Wall-clock time the step started executing.
    pub started_at: Option<DateTime<Utc>>,

    /// Time the handler (and its hooks) took.
    pub duration: Option<Duration>,
}

impl ResolvedStep {
    /// Creates a pending [`ResolvedStep`] out of its match parts.
    #[must_use]
    pub fn new(
        keyword: String,
        ty: gherkin::StepType,
        text: String,
        definition: DefinitionInfo,
        args: Vec<Value>,
        captures: Vec<(CaptureName, String)>,
        offsets: Vec<CaptureOffsets>,
    ) -> Self {
        Self {
            keyword,
            ty,
            text,
            definition,
            args,
            captures,
            offsets,
            status: StepStatus::Pending,
            error: None,
            started_at: None,
            duration: None,
        }
    }

    /// Marks this step passed.
    pub fn pass(&mut self, started_at: DateTime<Utc>, duration: Duration) {
        self.status = StepStatus::Passed;
        self.started_at = Some(started_at);
        self.duration = Some(duration);
    }

    /// Marks this step failed with the given error.
    pub fn fail(
        &mut self,
        error: StepError,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) {
        self.status = StepStatus::Failed;
        self.error = Some(error);
        self.started_at = Some(started_at);
        self.duration = Some(duration);
    }

    /// Marks this step skipped.
    ///
    /// Clears no fields: a skipped step was never started, so it carries
    /// neither error nor timing.
    pub fn skip(&mut self) {
        self.status = StepStatus::Skipped;
    }

    /// Indicates whether this step failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}
