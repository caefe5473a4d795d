//! User-defined enum-like parameter types.
//!
//! A [`CustomType`] maps both the symbolic names and the literal values of
//! an enumeration onto canonical value strings, case-insensitively. The
//! canonical value is then coerced into the type's underlying primitive.

use std::collections::HashMap;

use derive_more::with_trait::{Display, Error};

/// Primitive a custom type's canonical values coerce into.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum UnderlyingKind {
    /// Canonical values are signed integers.
    #[display("int")]
    Int,

    /// Canonical values are floats.
    #[display("float")]
    Float,

    /// Canonical values stay strings.
    #[display("word")]
    Word,
}

/// A user-defined enum-like parameter type.
///
/// Created once during registration and read-only during execution.
#[derive(Clone, Debug)]
pub struct CustomType {
    /// Lowercased type name, as referenced from declared parameter kinds.
    name: String,

    /// Primitive the canonical values coerce into.
    underlying: UnderlyingKind,

    /// Lowercased symbolic-name-or-value -> canonical value.
    table: HashMap<String, String>,
}

impl CustomType {
    /// Creates a new [`CustomType`] out of `(symbolic name, canonical
    /// value)` pairs.
    ///
    /// Both the lowercased symbolic name and the lowercased canonical value
    /// itself are inserted as lookup keys, so `"high"` and `"3"` both
    /// resolve to `"3"`.
    #[must_use]
    pub fn new<N, V>(
        name: impl Into<String>,
        underlying: UnderlyingKind,
        values: impl IntoIterator<Item = (N, V)>,
    ) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        let mut table = HashMap::new();
        for (symbolic, canonical) in values {
            let canonical = canonical.into();
            _ = table.insert(symbolic.into().to_lowercase(), canonical.clone());
            _ = table.insert(canonical.to_lowercase(), canonical);
        }
        Self { name: name.into().to_lowercase(), underlying, table }
    }

    /// Lowercased name of this type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primitive the canonical values coerce into.
    #[must_use]
    pub fn underlying(&self) -> UnderlyingKind {
        self.underlying
    }

    /// Resolves an input to its canonical value, case-insensitively.
    #[must_use]
    pub fn resolve(&self, input: &str) -> Option<&str> {
        self.table.get(&input.to_lowercase()).map(String::as_str)
    }

    /// Indicates whether this type has no values at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Error of registering a [`CustomType`] into [`CustomTypes`].
#[derive(Clone, Debug, Display, Error)]
pub enum CustomTypeError {
    /// A type with the same name is already registered.
    #[display("custom type `{name}` registered twice")]
    DuplicateType {
        /// The colliding type name.
        #[error(not(source))]
        name: String,
    },

    /// The type's value table is empty, so no input could ever resolve.
    #[display("custom type `{name}` has an empty value table")]
    EmptyValueTable {
        /// The offending type name.
        #[error(not(source))]
        name: String,
    },
}

/// Registry of [`CustomType`]s, keyed by lowercased name.
///
/// Populated during the registration phase; read-only and shareable across
/// scenarios afterwards.
#[derive(Clone, Debug, Default)]
pub struct CustomTypes {
    types: HashMap<String, CustomType>,
}

impl CustomTypes {
    /// Creates a new empty [`CustomTypes`] registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a [`CustomType`].
    ///
    /// # Errors
    ///
    /// - [`CustomTypeError::EmptyValueTable`] if the type has no values;
    /// - [`CustomTypeError::DuplicateType`] if its name is already taken.
    pub fn register(&mut self, ty: CustomType) -> Result<(), CustomTypeError> {
        if ty.is_empty() {
            return Err(CustomTypeError::EmptyValueTable {
                name: ty.name.clone(),
            });
        }
        if self.types.contains_key(&ty.name) {
            return Err(CustomTypeError::DuplicateType {
                name: ty.name.clone(),
            });
        }
        _ = self.types.insert(ty.name.clone(), ty);
        Ok(())
    }

    /// Looks a type up by its name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CustomType> {
        self.types.get(&name.to_lowercase())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Indicates whether no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
