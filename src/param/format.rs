//! Validators and sub-parsers for structured text parameter kinds.
//!
//! Kinds with a crate-provided parser (`uuid`, `ip`, `url`, `json`, ...)
//! coerce directly in [`coerce`]; this module hosts the grammar-checked
//! ones.
//!
//! [`coerce`]: super::coerce

use lazy_regex::{regex_captures, regex_is_match};

use super::value::SemVer;

/// Parses a semantic version per the published `semver.org` grammar.
pub(crate) fn parse_semver(text: &str) -> Option<SemVer> {
    let (_, major, minor, patch, pre, build) = regex_captures!(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
        text,
    )?;
    Some(SemVer {
        major: major.parse().ok()?,
        minor: minor.parse().ok()?,
        patch: patch.parse().ok()?,
        pre: (!pre.is_empty()).then(|| pre.to_owned()),
        build: (!build.is_empty()).then(|| build.to_owned()),
    })
}

/// Pragmatic email shape check: local part, `@`, dotted domain.
pub(crate) fn is_email(text: &str) -> bool {
    regex_is_match!(
        r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
        text,
    )
}

/// Phone number check: optional `+`, 7 to 15 digits, common separators.
pub(crate) fn is_phone(text: &str) -> bool {
    if !regex_is_match!(r"^\+?[0-9][0-9 ().-]*$", text.trim()) {
        return false;
    }
    let digits = text.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

/// Decodes a hex byte string: optional `0x` prefix, even digit count.
pub(crate) fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty()
        || digits.len() % 2 != 0
        || !digits.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}

/// Splits a single line of comma-separated values.
///
/// Double-quoted fields keep their commas; `""` inside a quoted field is a
/// literal quote. Whitespace around unquoted fields is trimmed. Returns
/// [`None`] on an unterminated quote.
pub(crate) fn split_csv(text: &str) -> Option<Vec<String>> {
    fn finish(field: String, was_quoted: bool) -> String {
        if was_quoted { field } else { field.trim().to_owned() }
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut was_quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    _ = chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if !was_quoted && current.trim().is_empty() => {
                in_quotes = true;
                was_quoted = true;
                current.clear();
            }
            ',' if !in_quotes => {
                fields.push(finish(std::mem::take(&mut current), was_quoted));
                was_quoted = false;
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(finish(current, was_quoted));

    Some(fields)
}
