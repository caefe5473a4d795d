//! Typed values produced by argument coercion.
//!
//! Every capture group of a matched step resolves to one [`Value`] per its
//! declared [`ParamKind`]. Handlers receive these through the invocation
//! [`Context`].
//!
//! [`ParamKind`]: super::ParamKind
//! [`Context`]: crate::step::Context

use std::{fmt, net::IpAddr, path::PathBuf};

use chrono::NaiveDateTime;
use derive_more::with_trait::Display;

use crate::step::HashableRegex;

/// Timezone handle attached to temporal values.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Zone {
    /// Coordinated universal time (`Z` or `UTC`).
    #[display("UTC")]
    Utc,

    /// Fixed numeric offset, e.g. `+02:00`.
    #[display("{_0}")]
    Fixed(chrono::FixedOffset),

    /// IANA `Region/City` zone.
    #[display("{_0}")]
    Named(chrono_tz::Tz),
}

/// A zone-less point in time with an optionally attached [`Zone`].
///
/// Dates normalize to midnight and bare times attach to the reference date
/// `1970-01-01`, so every temporal kind shares this representation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timestamp {
    /// The local date and time as written.
    pub naive: NaiveDateTime,

    /// Zone the value was annotated with, if any.
    pub zone: Option<Zone>,
}

impl Timestamp {
    /// Creates a new [`Timestamp`].
    #[must_use]
    pub const fn new(naive: NaiveDateTime, zone: Option<Zone>) -> Self {
        Self { naive, zone }
    }

    /// Indicates whether a zone was attached.
    #[must_use]
    pub const fn is_zoned(&self) -> bool {
        self.zone.is_some()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.naive.format("%Y-%m-%dT%H:%M:%S%.f"))?;
        if let Some(zone) = &self.zone {
            write!(f, " {zone}")?;
        }
        Ok(())
    }
}

/// Parsed semantic version.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SemVer {
    /// Major component.
    pub major: u64,

    /// Minor component.
    pub minor: u64,

    /// Patch component.
    pub patch: u64,

    /// Pre-release identifiers, without the leading `-`.
    pub pre: Option<String>,

    /// Build metadata, without the leading `+`.
    pub build: Option<String>,
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

/// A coerced step argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Signed integer.
    Int(i64),

    /// Float.
    Float(f64),

    /// Boolean.
    Bool(bool),

    /// Plain text (`word`, `string` and word-backed custom kinds).
    Str(String),

    /// Comma-separated values, split.
    List(Vec<String>),

    /// UUID.
    Uuid(uuid::Uuid),

    /// IPv4 or IPv6 address.
    Ip(IpAddr),

    /// Raw bytes (`hex` and `base64` kinds).
    Bytes(Vec<u8>),

    /// Parsed JSON document.
    Json(serde_json::Value),

    /// Filesystem path.
    Path(PathBuf),

    /// Arbitrary-precision integer.
    BigInt(num_bigint::BigInt),

    /// Semantic version.
    SemVer(SemVer),

    /// Email address, validated.
    Email(String),

    /// Phone number, validated, separators kept as written.
    Phone(String),

    /// Parsed URL.
    Url(url::Url),

    /// Percentage, stored as written (`12.5%` keeps `12.5`).
    Percent(f64),

    /// Compiled regular expression literal.
    Regex(HashableRegex),

    /// Temporal value (`date`, `time`, `datetime` kinds).
    Timestamp(Timestamp),

    /// Timezone handle.
    Zone(Zone),

    /// Signed duration.
    Duration(chrono::Duration),
}

impl Value {
    /// Returns the integer, if this is an [`Value::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number as a float, widening [`Value::Int`].
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) | Self::Percent(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text of string-backed variants.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Email(s) | Self::Phone(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the split values, if this is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the raw bytes, if this is a [`Value::Bytes`].
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the timestamp, if this is a [`Value::Timestamp`].
    #[must_use]
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Returns the duration, if this is a [`Value::Duration`].
    #[must_use]
    pub fn as_duration(&self) -> Option<chrono::Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns a percentage as a fraction: `12.5%` becomes `0.125`.
    #[must_use]
    pub fn as_fraction(&self) -> Option<f64> {
        match self {
            Self::Percent(p) => Some(p / 100.0),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) | Self::Email(v) | Self::Phone(v) => {
                write!(f, "{v}")
            }
            Self::List(items) => write!(f, "{}", items.join(",")),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Ip(v) => write!(f, "{v}"),
            Self::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Json(v) => write!(f, "{v}"),
            Self::Path(v) => write!(f, "{}", v.display()),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::SemVer(v) => write!(f, "{v}"),
            Self::Url(v) => write!(f, "{v}"),
            Self::Percent(v) => write!(f, "{v}%"),
            Self::Regex(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{v}"),
            Self::Zone(v) => write!(f, "{v}"),
            Self::Duration(v) => write!(f, "{v}"),
        }
    }
}
