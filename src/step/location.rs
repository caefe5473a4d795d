//! Source location of a registered step function.
//!
//! Registration tooling fills this in so that duplicate-pattern and
//! ambiguous-match diagnostics can point at the offending definitions.

use derive_more::with_trait::{Debug, Display};

/// Location of a step `fn`, as reported by the registering caller.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file where the step `fn` is defined.
    pub path: &'static str,

    /// Line of the file where the step `fn` is defined.
    pub line: u32,

    /// Column of the file where the step `fn` is defined.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`] out of a path, line and column.
    #[must_use]
    pub const fn new(path: &'static str, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }
}
