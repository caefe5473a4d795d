//! Step pattern registration and matching.
//!
//! [`Registry`] stores pattern/handler bindings and matches free step text
//! to exactly one of them. Registration is a one-time phase: after it ends
//! the table is read-only and may be shared across concurrently executing
//! scenarios.

use derive_more::with_trait::{Display, Error};
use futures::future::LocalBoxFuture;
use linked_hash_map::LinkedHashMap;
use regex::Regex;

use crate::param::ParamKind;

use super::{
    context::{CaptureName, CaptureOffsets, Context},
    error::{AmbiguousMatchError, RegistryError},
    location::Location,
    regex::HashableRegex,
};

/// Alias for a step function invoked with a mutable `World` and the
/// invocation [`Context`], resolving to a [`StepResult`].
pub type StepFn<World> =
    for<'a> fn(&'a mut World, Context) -> LocalBoxFuture<'a, StepResult>;

/// Outcome of a step function.
pub type StepResult = Result<(), StepFailure>;

/// Failure returned by a step function's business logic.
#[derive(Clone, Debug, Display, Error)]
#[display("{message}")]
pub struct StepFailure {
    /// Human-readable failure description.
    #[error(not(source))]
    pub message: String,
}

impl From<String> for StepFailure {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for StepFailure {
    fn from(message: &str) -> Self {
        Self { message: message.into() }
    }
}

/// A registered pattern/handler binding.
///
/// Created at registration and immutable afterwards.
pub struct StepDef<World> {
    /// Handler to invoke on a match.
    pub func: StepFn<World>,

    /// Name of the handler `fn`, for diagnostics.
    pub fn_name: &'static str,

    /// Source location of the handler, if reported.
    pub location: Option<Location>,

    /// Declared parameter kinds, one per capture group.
    ///
    /// Empty means every capture coerces as a plain string.
    pub param_kinds: Vec<ParamKind>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for StepDef<World> {
    fn clone(&self) -> Self {
        Self {
            func: self.func,
            fn_name: self.fn_name,
            location: self.location,
            param_kinds: self.param_kinds.clone(),
        }
    }
}

impl<World> std::fmt::Debug for StepDef<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDef")
            .field("func", &format_args!("{:p}", self.func as *const ()))
            .field("fn_name", &self.fn_name)
            .field("location", &self.location)
            .field("param_kinds", &self.param_kinds)
            .finish()
    }
}

/// Successful match of step text against exactly one registered pattern.
#[derive(Debug)]
pub struct Match<'reg, World> {
    /// The matched definition.
    pub def: &'reg StepDef<World>,

    /// Pattern the definition was registered under.
    pub pattern: &'reg HashableRegex,

    /// Capture group texts, in group order, whole match excluded.
    pub captures: Vec<(CaptureName, String)>,

    /// Byte offsets of [`Match::captures`] inside the step text.
    pub offsets: Vec<CaptureOffsets>,
}

/// Registry of step pattern/handler bindings.
///
/// Patterns are stored in registration order. Every step text has to match
/// exactly one pattern: zero matches leave the step unresolved and more
/// than one is an [`AmbiguousMatchError`].
pub struct Registry<World> {
    defs: LinkedHashMap<HashableRegex, StepDef<World>>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed
// by `#[derive(Clone)]`.
impl<World> Clone for Registry<World> {
    fn clone(&self) -> Self {
        Self { defs: self.defs.clone() }
    }
}

// Implemented manually to omit redundant `World: Default` trait bound,
// imposed by `#[derive(Default)]`.
impl<World> Default for Registry<World> {
    fn default() -> Self {
        Self { defs: LinkedHashMap::new() }
    }
}

impl<World> std::fmt::Debug for Registry<World> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "defs",
                &self
                    .defs
                    .iter()
                    .map(|(re, def)| (re.as_str(), def.fn_name))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<World> Registry<World> {
    /// Creates a new empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Indicates whether no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Registers a `pattern`/`func` binding.
    ///
    /// `param_kinds` declares how each capture group coerces; an empty list
    /// coerces every capture as a plain string.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidPattern`] if `pattern` doesn't compile;
    /// - [`RegistryError::DuplicatePattern`] if a byte-identical pattern is
    ///   already registered, naming both handlers;
    /// - [`RegistryError::ParamCountMismatch`] if a non-empty `param_kinds`
    ///   disagrees with the pattern's capture group count.
    pub fn register(
        &mut self,
        pattern: &str,
        param_kinds: Vec<ParamKind>,
        fn_name: &'static str,
        location: Option<Location>,
        func: StepFn<World>,
    ) -> Result<(), RegistryError> {
        let regex = Regex::new(pattern).map_err(|source| {
            RegistryError::InvalidPattern { pattern: pattern.into(), source }
        })?;

        let captures = regex.captures_len() - 1;
        if !param_kinds.is_empty() && param_kinds.len() != captures {
            return Err(RegistryError::ParamCountMismatch {
                pattern: pattern.into(),
                declared: param_kinds.len(),
                captures,
            });
        }

        let key = HashableRegex::new(regex);
        if let Some(existing) = self.defs.get(&key) {
            return Err(RegistryError::DuplicatePattern {
                pattern: pattern.into(),
                existing_fn: existing.fn_name,
                existing_loc: existing.location,
                duplicate_fn: fn_name,
                duplicate_loc: location,
            });
        }

        _ = self.defs.insert(
            key,
            StepDef { func, fn_name, location, param_kinds },
        );
        Ok(())
    }

    /// Matches the given step text against the registered patterns.
    ///
    /// Returns [`None`] when nothing matches. Capture texts and byte
    /// offsets are reported per capture group, whole match excluded, with
    /// [`None`] offsets for groups not participating in the match.
    ///
    /// # Errors
    ///
    /// If `text` matches multiple registered patterns.
    pub fn find(
        &self,
        text: &str,
    ) -> Result<Option<Match<'_, World>>, AmbiguousMatchError> {
        let mut matched = self
            .defs
            .iter()
            .filter_map(|(re, def)| {
                let mut locs = re.capture_locations();
                re.captures_read(&mut locs, text).map(|_| (re, def, locs))
            })
            .collect::<Vec<_>>();

        let (re, def, locs) = match matched.len() {
            0 => return Ok(None),
            // Instead of `.unwrap()` to avoid documenting `# Panics`.
            1 => matched.pop().unwrap_or_else(|| unreachable!()),
            _ => {
                return Err(AmbiguousMatchError::new(
                    matched
                        .into_iter()
                        .map(|(re, def, _)| {
                            (re.clone(), def.fn_name, def.location)
                        })
                        .collect(),
                ));
            }
        };

        let offsets = (1..locs.len()).map(|i| locs.get(i)).collect::<Vec<_>>();
        // All indices are obtained from the source string, so slicing cannot
        // split a UTF-8 sequence.
        let captures = re
            .capture_names()
            .skip(1)
            .zip(&offsets)
            .map(|(name, span)| {
                (
                    name.map(str::to_owned),
                    span.map_or("", |(s, e)| &text[s..e]).to_owned(),
                )
            })
            .collect();

        Ok(Some(Match { def, pattern: re, captures, offsets }))
    }

    /// Iterates over the registered patterns in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &HashableRegex> {
        self.defs.keys()
    }
}
