//! Execution context handed to a step function.
//!
//! Carries the matched [`gherkin::Step`], the raw capture groups with their
//! byte offsets inside the step text, and the capture values already coerced
//! into typed [`Value`]s.

use crate::param::Value;

/// Name of a capturing group inside a pattern.
pub type CaptureName = Option<String>;

/// Byte-offset pair of a capture group inside the step text.
///
/// [`None`] for groups that didn't participate in the match. Offsets are
/// passed through to result consumers for parameter highlighting.
pub type CaptureOffsets = Option<(usize, usize)>;

/// Context of a single step function invocation.
#[derive(Clone, Debug)]
pub struct Context {
    /// The step matched to the invoked function.
    pub step: gherkin::Step,

    /// Capture groups of the pattern match, in group order, the implicit
    /// whole-match group excluded.
    pub matches: Vec<(CaptureName, String)>,

    /// Byte offsets of [`Context::matches`] inside [`gherkin::Step::value`].
    pub offsets: Vec<CaptureOffsets>,

    /// Capture values coerced per the declared parameter kinds.
    ///
    /// Same length and order as [`Context::matches`].
    pub args: Vec<Value>,
}

impl Context {
    /// Creates a new [`Context`].
    #[must_use]
    pub fn new(
        step: gherkin::Step,
        matches: Vec<(CaptureName, String)>,
        offsets: Vec<CaptureOffsets>,
        args: Vec<Value>,
    ) -> Self {
        Self { step, matches, offsets, args }
    }

    /// Returns the coerced value of the `index`-th capture group.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Returns the raw text of the `index`-th capture group.
    #[must_use]
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.matches.get(index).map(|(_, value)| value.as_str())
    }

    /// Returns the raw text of a named capture group, if present.
    #[must_use]
    pub fn named_capture(&self, name: &str) -> Option<&str> {
        self.matches
            .iter()
            .find(|(n, _)| n.as_deref() == Some(name))
            .map(|(_, value)| value.as_str())
    }
}
