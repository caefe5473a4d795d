//! Coercion of captured step text into typed [`Value`]s.
//!
//! Every failure names the declared parameter kind and the offending text.
//! Coercion failures are user-facing step failures, never run-fatal, with
//! one exception: a declared kind referencing an unregistered custom type
//! is a configuration defect and aborts the run during resolution.

use std::{net::IpAddr, path::PathBuf, str::FromStr as _};

use base64::Engine as _;
use derive_more::with_trait::{Display, Error};
use regex::Regex;

use crate::step::HashableRegex;

use super::{
    custom::{CustomTypes, UnderlyingKind},
    format, temporal,
    value::Value,
    ParamKind,
};

/// Error of coercing captured text into a declared parameter kind.
#[derive(Clone, Debug, Display, Error)]
pub enum CoerceError {
    /// Token is in neither boolean synonym set.
    #[display("invalid boolean literal `{value}`")]
    InvalidBooleanLiteral {
        /// The offending text.
        #[error(not(source))]
        value: String,
    },

    /// Input resolves to no entry of the custom type's value table.
    #[display("invalid value `{value}` for custom type `{ty}`")]
    InvalidEnumValue {
        /// The custom type looked up.
        ty: String,

        /// The offending text.
        value: String,
    },

    /// Input failed the kind's format grammar.
    #[display("invalid {kind} literal `{value}`")]
    InvalidFormat {
        /// The declared kind.
        kind: ParamKind,

        /// The offending text.
        value: String,
    },

    /// Declared kind references a custom type nobody registered.
    ///
    /// This is a configuration defect, promoted to a run-aborting error by
    /// the resolution pass.
    #[display("unknown custom type `{name}`")]
    UnknownCustomType {
        /// The unresolved type name.
        #[error(not(source))]
        name: String,
    },
}

/// Boolean synonym sets, case-insensitive.
fn bool_literal(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "enabled" | "1" | "t" => Some(true),
        "false" | "no" | "off" | "disabled" | "0" | "f" => Some(false),
        _ => None,
    }
}

/// Strips one pair of surrounding matching quotes, if present.
fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first, last) == (b'"', b'"') || (first, last) == (b'\'', b'\'') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Coerces `text` into a [`Value`] per the declared `kind`.
///
/// # Errors
///
/// See [`CoerceError`] for the failure taxonomy.
pub fn coerce(
    kind: &ParamKind,
    text: &str,
    custom_types: &CustomTypes,
) -> Result<Value, CoerceError> {
    let invalid = || CoerceError::InvalidFormat {
        kind: kind.clone(),
        value: text.to_owned(),
    };

    match kind {
        ParamKind::Int => {
            text.trim().parse().map(Value::Int).map_err(|_| invalid())
        }
        ParamKind::Float => {
            text.trim().parse().map(Value::Float).map_err(|_| invalid())
        }
        ParamKind::Bool => bool_literal(text).map(Value::Bool).ok_or_else(|| {
            CoerceError::InvalidBooleanLiteral { value: text.to_owned() }
        }),
        ParamKind::Word => Ok(Value::Str(text.to_owned())),
        ParamKind::Str => Ok(Value::Str(unquote(text).to_owned())),
        ParamKind::Date => {
            temporal::parse_date(text).map(Value::Timestamp).ok_or_else(invalid)
        }
        ParamKind::Time => {
            temporal::parse_time(text).map(Value::Timestamp).ok_or_else(invalid)
        }
        ParamKind::DateTime => temporal::parse_datetime(text)
            .map(Value::Timestamp)
            .ok_or_else(invalid),
        ParamKind::Timezone => {
            temporal::parse_zone(text).map(Value::Zone).ok_or_else(invalid)
        }
        ParamKind::Duration => temporal::parse_duration(text)
            .map(Value::Duration)
            .ok_or_else(invalid),
        ParamKind::Uuid => uuid::Uuid::parse_str(text.trim())
            .map(Value::Uuid)
            .map_err(|_| invalid()),
        ParamKind::Ip => text
            .trim()
            .parse::<IpAddr>()
            .map(Value::Ip)
            .map_err(|_| invalid()),
        ParamKind::Hex => {
            format::parse_hex(text.trim()).map(Value::Bytes).ok_or_else(invalid)
        }
        ParamKind::SemVer => format::parse_semver(text.trim())
            .map(Value::SemVer)
            .ok_or_else(invalid),
        ParamKind::Base64 => {
            let trimmed = text.trim();
            base64::engine::general_purpose::STANDARD
                .decode(trimmed)
                .or_else(|_| {
                    base64::engine::general_purpose::STANDARD_NO_PAD
                        .decode(trimmed)
                })
                .map(Value::Bytes)
                .map_err(|_| invalid())
        }
        ParamKind::Url => url::Url::parse(text.trim())
            .map(Value::Url)
            .map_err(|_| invalid()),
        ParamKind::Email => {
            let trimmed = text.trim();
            format::is_email(trimmed)
                .then(|| Value::Email(trimmed.to_owned()))
                .ok_or_else(invalid)
        }
        ParamKind::Csv => {
            format::split_csv(text).map(Value::List).ok_or_else(invalid)
        }
        ParamKind::Json => serde_json::from_str(text)
            .map(Value::Json)
            .map_err(|_| invalid()),
        ParamKind::Path => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(invalid())
            } else {
                Ok(Value::Path(PathBuf::from(trimmed)))
            }
        }
        ParamKind::Phone => {
            let trimmed = text.trim();
            format::is_phone(trimmed)
                .then(|| Value::Phone(trimmed.to_owned()))
                .ok_or_else(invalid)
        }
        ParamKind::Percent => {
            let trimmed = text.trim();
            let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
            number.parse().map(Value::Percent).map_err(|_| invalid())
        }
        ParamKind::BigInt => num_bigint::BigInt::from_str(text.trim())
            .map(Value::BigInt)
            .map_err(|_| invalid()),
        ParamKind::Regex => Regex::new(text)
            .map(|re| Value::Regex(HashableRegex::new(re)))
            .map_err(|_| invalid()),
        ParamKind::Custom(name) => {
            let ty = custom_types.get(name).ok_or_else(|| {
                CoerceError::UnknownCustomType { name: name.clone() }
            })?;
            let canonical = ty.resolve(text).ok_or_else(|| {
                CoerceError::InvalidEnumValue {
                    ty: name.clone(),
                    value: text.to_owned(),
                }
            })?;
            match ty.underlying() {
                UnderlyingKind::Int => {
                    canonical.parse().map(Value::Int).map_err(|_| {
                        CoerceError::InvalidFormat {
                            kind: kind.clone(),
                            value: canonical.to_owned(),
                        }
                    })
                }
                UnderlyingKind::Float => {
                    canonical.parse().map(Value::Float).map_err(|_| {
                        CoerceError::InvalidFormat {
                            kind: kind.clone(),
                            value: canonical.to_owned(),
                        }
                    })
                }
                UnderlyingKind::Word => Ok(Value::Str(canonical.to_owned())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::param::custom::CustomType;

    use super::*;

    fn no_customs() -> CustomTypes {
        CustomTypes::new()
    }

    #[test]
    fn integers_accept_leading_sign() {
        let customs = no_customs();
        assert_eq!(
            coerce(&ParamKind::Int, "-42", &customs).unwrap(),
            Value::Int(-42),
        );
        assert!(coerce(&ParamKind::Int, "4.2", &customs).is_err());
    }

    #[test]
    fn boolean_synonym_sets_any_case() {
        let customs = no_customs();
        for truthy in ["true", "YES", "On", "Enabled", "1", "T"] {
            assert_eq!(
                coerce(&ParamKind::Bool, truthy, &customs).unwrap(),
                Value::Bool(true),
                "{truthy}",
            );
        }
        for falsy in ["false", "no", "OFF", "disabled", "0", "f"] {
            assert_eq!(
                coerce(&ParamKind::Bool, falsy, &customs).unwrap(),
                Value::Bool(false),
                "{falsy}",
            );
        }
        assert!(matches!(
            coerce(&ParamKind::Bool, "maybe", &customs),
            Err(CoerceError::InvalidBooleanLiteral { .. }),
        ));
    }

    #[test]
    fn string_strips_one_quote_pair_word_does_not() {
        let customs = no_customs();
        assert_eq!(
            coerce(&ParamKind::Str, r#""hello there""#, &customs).unwrap(),
            Value::Str("hello there".into()),
        );
        assert_eq!(
            coerce(&ParamKind::Str, "'single'", &customs).unwrap(),
            Value::Str("single".into()),
        );
        assert_eq!(
            coerce(&ParamKind::Str, r#""mismatched'"#, &customs).unwrap(),
            Value::Str(r#""mismatched'"#.into()),
        );
        assert_eq!(
            coerce(&ParamKind::Word, r#""kept""#, &customs).unwrap(),
            Value::Str(r#""kept""#.into()),
        );
    }

    #[test]
    fn custom_enum_round_trips_to_canonical_value() {
        let mut customs = CustomTypes::new();
        customs
            .register(CustomType::new(
                "severity",
                UnderlyingKind::Int,
                [("low", "1"), ("medium", "2"), ("high", "3")],
            ))
            .unwrap();
        let kind = ParamKind::Custom("severity".into());

        for input in ["low", "LOW", "1"] {
            assert_eq!(
                coerce(&kind, input, &customs).unwrap(),
                Value::Int(1),
                "{input}",
            );
        }
        assert!(matches!(
            coerce(&kind, "extreme", &customs),
            Err(CoerceError::InvalidEnumValue { .. }),
        ));
    }

    #[test]
    fn unknown_custom_type_names_the_missing_type() {
        let err =
            coerce(&ParamKind::Custom("ghost".into()), "x", &no_customs())
                .unwrap_err();
        assert!(matches!(
            err,
            CoerceError::UnknownCustomType { ref name } if name == "ghost",
        ));
    }

    #[test]
    fn structured_kinds_parse_through_their_crates() {
        let customs = no_customs();
        assert!(matches!(
            coerce(
                &ParamKind::Uuid,
                "550e8400-e29b-41d4-a716-446655440000",
                &customs,
            )
            .unwrap(),
            Value::Uuid(_),
        ));
        assert_eq!(
            coerce(&ParamKind::Ip, "::1", &customs).unwrap(),
            Value::Ip("::1".parse().unwrap()),
        );
        assert!(matches!(
            coerce(&ParamKind::Url, "https://example.com/x?y=1", &customs)
                .unwrap(),
            Value::Url(_),
        ));
        assert_eq!(
            coerce(&ParamKind::Json, r#"{"n": [1, 2]}"#, &customs).unwrap(),
            Value::Json(serde_json::json!({"n": [1, 2]})),
        );
        let huge = "-170141183460469231731687303715884105728";
        assert_eq!(
            coerce(&ParamKind::BigInt, huge, &customs).unwrap().to_string(),
            huge,
        );
    }

    #[test]
    fn base64_accepts_padded_and_unpadded() {
        let customs = no_customs();
        assert_eq!(
            coerce(&ParamKind::Base64, "aGk=", &customs).unwrap(),
            Value::Bytes(b"hi".to_vec()),
        );
        assert_eq!(
            coerce(&ParamKind::Base64, "aGk", &customs).unwrap(),
            Value::Bytes(b"hi".to_vec()),
        );
        assert!(coerce(&ParamKind::Base64, "!!!", &customs).is_err());
    }

    #[test]
    fn percent_allows_optional_sign_and_suffix() {
        let customs = no_customs();
        assert_eq!(
            coerce(&ParamKind::Percent, "12.5%", &customs).unwrap(),
            Value::Percent(12.5),
        );
        assert_eq!(
            coerce(&ParamKind::Percent, "-3", &customs).unwrap(),
            Value::Percent(-3.0),
        );
        assert!(coerce(&ParamKind::Percent, "many%", &customs).is_err());
    }

    #[test]
    fn regex_literals_compile() {
        let customs = no_customs();
        let value = coerce(&ParamKind::Regex, r"^\d{4}$", &customs).unwrap();
        match value {
            Value::Regex(re) => assert!(re.is_match("2024")),
            other => panic!("unexpected value: {other:?}"),
        }
        assert!(coerce(&ParamKind::Regex, "broken(", &customs).is_err());
    }

    #[test]
    fn failures_name_kind_and_text() {
        let err = coerce(&ParamKind::SemVer, "v1", &no_customs()).unwrap_err();
        let shown = err.to_string();
        assert!(shown.contains("semver"));
        assert!(shown.contains("v1"));
    }
}
