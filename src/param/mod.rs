//! Typed step parameters: declared kinds, coercion and custom enum types.
//!
//! A step definition declares a [`ParamKind`] per capture group. During
//! resolution each captured text is coerced into a [`Value`] by
//! [`coerce()`], consulting the registered [`CustomTypes`] for
//! [`ParamKind::Custom`] kinds.

pub mod coerce;
pub mod custom;
pub mod kind;
pub mod value;

mod format;
mod temporal;

#[doc(inline)]
pub use self::{
    coerce::{coerce, CoerceError},
    custom::{CustomType, CustomTypeError, CustomTypes, UnderlyingKind},
    kind::ParamKind,
    value::{SemVer, Timestamp, Value, Zone},
};
