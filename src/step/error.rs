//! Errors reported by the step registry.
//!
//! Registration failures ([`RegistryError`]) and ambiguous matches
//! ([`AmbiguousMatchError`]) are configuration defects: the run is aborted
//! rather than the step marked failed.

use std::fmt;

use derive_more::with_trait::Error;
use itertools::Itertools as _;

use super::{location::Location, regex::HashableRegex};

/// Error of registering a step pattern into a
/// [`Registry`](super::Registry).
#[derive(Clone, Debug, Error)]
pub enum RegistryError {
    /// Pattern source failed to compile as a regex.
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,

        /// Underlying compilation error.
        source: regex::Error,
    },

    /// Byte-identical pattern source registered twice.
    ///
    /// Both function names are kept so the diagnostic can point at the two
    /// colliding definitions.
    DuplicatePattern {
        /// The pattern registered twice.
        pattern: String,

        /// Function owning the earlier registration.
        existing_fn: &'static str,

        /// Source location of the earlier registration, if known.
        existing_loc: Option<Location>,

        /// Function attempting the later registration.
        duplicate_fn: &'static str,

        /// Source location of the later registration, if known.
        duplicate_loc: Option<Location>,
    },

    /// Declared parameter kinds disagree with the pattern's capture groups.
    ParamCountMismatch {
        /// The pattern being registered.
        pattern: String,

        /// Number of declared parameter kinds.
        declared: usize,

        /// Number of capture groups in the pattern.
        captures: usize,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, source } => {
                write!(f, "step pattern `{pattern}` is not a valid regex: {source}")
            }
            Self::DuplicatePattern {
                pattern,
                existing_fn,
                existing_loc,
                duplicate_fn,
                duplicate_loc,
            } => {
                write!(
                    f,
                    "step pattern `{pattern}` registered twice: first by \
                     `{existing_fn}`",
                )?;
                if let Some(loc) = existing_loc {
                    write!(f, " at {loc}")?;
                }
                write!(f, ", again by `{duplicate_fn}`")?;
                if let Some(loc) = duplicate_loc {
                    write!(f, " at {loc}")?;
                }
                Ok(())
            }
            Self::ParamCountMismatch { pattern, declared, captures } => {
                write!(
                    f,
                    "step pattern `{pattern}` declares {declared} parameter \
                     kind(s) but captures {captures} group(s)",
                )
            }
        }
    }
}

/// Error of a [`gherkin::Step`] text matching multiple registered patterns.
///
/// Ambiguity is a configuration defect and is never resolved by
/// registration order.
#[derive(Clone, Debug, Error)]
pub struct AmbiguousMatchError {
    /// Patterns the step text matches, sorted by pattern source.
    #[error(not(source))]
    pub possible_matches: Vec<(HashableRegex, &'static str, Option<Location>)>,
}

impl AmbiguousMatchError {
    /// Creates a new [`AmbiguousMatchError`], sorting the matches by
    /// pattern source for deterministic output.
    #[must_use]
    pub fn new(
        matches: Vec<(HashableRegex, &'static str, Option<Location>)>,
    ) -> Self {
        Self {
            possible_matches: matches
                .into_iter()
                .sorted_by(|(l, ..), (r, ..)| l.cmp(r))
                .collect(),
        }
    }
}

impl fmt::Display for AmbiguousMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Possible matches:")?;
        for (pattern, fn_name, loc) in &self.possible_matches {
            write!(f, "\n{pattern} (`{fn_name}`")?;
            if let Some(loc) = loc {
                write!(f, " --> {loc}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
