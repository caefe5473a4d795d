//! Declared parameter kinds of step capture groups.
//!
//! Registration tooling declares one [`ParamKind`] per capture group.
//! Anything that isn't a built-in kind name is a [`ParamKind::Custom`]
//! reference into the [`CustomTypes`] registry, validated once the
//! resolution pass first needs it.
//!
//! [`CustomTypes`]: super::CustomTypes

use std::{convert::Infallible, str::FromStr};

use derive_more::with_trait::Display;

/// Kind of a declared step parameter, driving how its captured text is
/// coerced into a [`Value`].
///
/// [`Value`]: super::Value
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub enum ParamKind {
    /// Signed integer literal.
    #[display("int")]
    Int,

    /// Floating-point literal.
    #[display("float")]
    Float,

    /// Single word, passed through verbatim.
    #[display("word")]
    Word,

    /// Free text; one pair of surrounding matching quotes is stripped.
    #[display("string")]
    Str,

    /// Boolean synonym sets (`true`/`yes`/`on`/`enabled`/`1`/`t` and their
    /// negative counterparts), case-insensitive.
    #[display("bool")]
    Bool,

    /// Calendar date, normalized to midnight.
    #[display("date")]
    Date,

    /// Wall-clock time, attached to a fixed reference date.
    #[display("time")]
    Time,

    /// Combined date and time.
    #[display("datetime")]
    DateTime,

    /// Timezone handle: `Z`, `UTC`, a numeric offset or an IANA name.
    #[display("timezone")]
    Timezone,

    /// Signed compound duration, e.g. `1h30m`.
    #[display("duration")]
    Duration,

    /// UUID in hyphenated or simple form.
    #[display("uuid")]
    Uuid,

    /// IPv4 or IPv6 address.
    #[display("ip")]
    Ip,

    /// Hex byte string, optional `0x` prefix, even digit count.
    #[display("hex")]
    Hex,

    /// Semantic version.
    #[display("semver")]
    SemVer,

    /// Base64 (standard alphabet) payload.
    #[display("base64")]
    Base64,

    /// Absolute or relative URL.
    #[display("url")]
    Url,

    /// Email address.
    #[display("email")]
    Email,

    /// Single-line comma-separated values, double-quote aware.
    #[display("csv")]
    Csv,

    /// Arbitrary JSON document.
    #[display("json")]
    Json,

    /// Filesystem path.
    #[display("path")]
    Path,

    /// Phone number in international or local notation.
    #[display("phone")]
    Phone,

    /// Percentage, with or without the `%` sign.
    #[display("percent")]
    Percent,

    /// Arbitrary-precision integer.
    #[display("bigint")]
    BigInt,

    /// Regular expression literal, compiled at coercion time.
    #[display("regex")]
    Regex,

    /// User-defined enum-like type, resolved through the custom type
    /// registry by its lowercased name.
    #[display("{_0}")]
    Custom(String),
}

impl FromStr for ParamKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "int" | "integer" => Self::Int,
            "float" | "double" => Self::Float,
            "word" => Self::Word,
            "string" | "str" => Self::Str,
            "bool" | "boolean" => Self::Bool,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" | "timestamp" => Self::DateTime,
            "timezone" | "tz" => Self::Timezone,
            "duration" => Self::Duration,
            "uuid" => Self::Uuid,
            "ip" | "ipaddr" => Self::Ip,
            "hex" => Self::Hex,
            "semver" | "version" => Self::SemVer,
            "base64" => Self::Base64,
            "url" | "uri" => Self::Url,
            "email" => Self::Email,
            "csv" => Self::Csv,
            "json" => Self::Json,
            "path" => Self::Path,
            "phone" => Self::Phone,
            "percent" | "percentage" => Self::Percent,
            "bigint" => Self::BigInt,
            "regex" | "regexp" => Self::Regex,
            other => Self::Custom(other.to_owned()),
        })
    }
}
