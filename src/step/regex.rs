//! [`HashableRegex`] wrapper keying step patterns by their source text.
//!
//! [`Eq`], [`Ord`] and [`Hash`] all compare the pattern string, so two
//! separately compiled [`Regex`]es with identical source are the same key.
//! This is what makes byte-identical duplicate patterns detectable at
//! registration time.

use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use derive_more::with_trait::{Debug, Deref, Display};
use regex::Regex;

/// [`Regex`] wrapper implementing [`Eq`], [`Ord`] and [`Hash`] over the
/// pattern source text.
#[derive(Clone, Debug, Deref, Display)]
pub struct HashableRegex(Regex);

impl HashableRegex {
    /// Wraps the given compiled [`Regex`].
    #[must_use]
    pub fn new(regex: Regex) -> Self {
        Self(regex)
    }

    /// Returns the pattern source this regex was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unwraps the inner [`Regex`].
    #[must_use]
    pub fn into_inner(self) -> Regex {
        self.0
    }
}

impl From<Regex> for HashableRegex {
    fn from(re: Regex) -> Self {
        Self(re)
    }
}

impl Hash for HashableRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state);
    }
}

impl PartialEq for HashableRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for HashableRegex {}

impl PartialOrd for HashableRegex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HashableRegex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_str().cmp(other.0.as_str())
    }
}
