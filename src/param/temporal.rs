//! Permissive parsing of temporal parameter kinds.
//!
//! The grammar deliberately accepts what people write in feature files:
//! ISO dates next to `7/3/2024` (day first), written month names, 12- and
//! 24-hour clocks, and an optional trailing timezone token (`Z`, `UTC`, a
//! numeric offset or an IANA name). Dates normalize to midnight; bare times
//! attach to the reference date 1970-01-01.

use std::str::FromStr as _;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use lazy_regex::regex_captures;

use super::value::{Timestamp, Zone};

/// Reference date bare `time` values attach to.
fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Parses a standalone timezone token.
pub(crate) fn parse_zone(text: &str) -> Option<Zone> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
        return Some(Zone::Utc);
    }
    if let Some((_, sign, hours, minutes)) =
        regex_captures!(r"^([+-])(\d{1,2}):?(\d{2})?$", text)
    {
        let hours: i32 = hours.parse().ok()?;
        let minutes: i32 =
            if minutes.is_empty() { 0 } else { minutes.parse().ok()? };
        let mut secs = hours * 3600 + minutes * 60;
        if sign == "-" {
            secs = -secs;
        }
        return FixedOffset::east_opt(secs).map(Zone::Fixed);
    }
    Tz::from_str(text).ok().map(Zone::Named)
}

/// Splits an optional trailing timezone token off `text`.
///
/// A whitespace-separated trailing token is tried against the full zone
/// grammar; `Z`/`UTC`/numeric offsets additionally attach without a space
/// (`16:30Z`), but only to values that contain a clock part, so numeric
/// dates like `1-2-2024` are never mistaken for offsets.
fn split_zone(text: &str) -> (String, Option<Zone>) {
    let text = text.trim();
    if let Some((core, token)) = text.rsplit_once(char::is_whitespace) {
        if let Some(zone) = parse_zone(token) {
            return (core.trim().to_owned(), Some(zone));
        }
    }
    if text.contains(':') {
        if let Some((whole, _)) =
            regex_captures!(r"(?i)(z|utc|[+-]\d{2}:?\d{2})$", text)
        {
            let core = &text[..text.len() - whole.len()];
            if let Some(zone) = parse_zone(whole) {
                return (core.trim().to_owned(), Some(zone));
            }
        }
    }
    (text.to_owned(), None)
}

/// Resolves a written month name, full or three-letter (plus `sept`).
fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july",
        "august", "september", "october", "november", "december",
    ];
    let lowered = name.to_ascii_lowercase();
    if lowered == "sept" {
        return Some(9);
    }
    MONTHS.iter().position(|m| {
        *m == lowered || (lowered.len() == 3 && m.starts_with(&lowered))
    })
    .map(|i| i as u32 + 1)
}

/// Widens two-digit years: `00..=69` land in the 2000s.
fn full_year(year: i32) -> i32 {
    if year < 100 {
        if year < 70 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

/// Parses the date portion: ISO, day/month/year numerics, or written
/// month names in either `7 March 2024` or `March 7, 2024` order.
fn parse_date_part(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Some((_, y, m, d)) =
        regex_captures!(r"^(\d{4})-(\d{1,2})-(\d{1,2})$", text)
    {
        return NaiveDate::from_ymd_opt(
            y.parse().ok()?,
            m.parse().ok()?,
            d.parse().ok()?,
        );
    }

    if let Some((_, d, m, y)) =
        regex_captures!(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{2,4})$", text)
    {
        return NaiveDate::from_ymd_opt(
            full_year(y.parse().ok()?),
            m.parse().ok()?,
            d.parse().ok()?,
        );
    }

    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    if let [first, second, year] = tokens.as_slice() {
        let year = full_year(year.parse().ok()?);
        if let Some(month) = month_number(second) {
            return NaiveDate::from_ymd_opt(year, month, first.parse().ok()?);
        }
        if let Some(month) = month_number(first) {
            return NaiveDate::from_ymd_opt(year, month, second.parse().ok()?);
        }
    }
    None
}

/// Parses the clock portion: 24-hour or 12-hour with `AM`/`PM`, optional
/// seconds and a fractional part.
fn parse_time_part(text: &str) -> Option<NaiveTime> {
    let text = text.trim();

    let (hour, minute, second, fraction, meridiem) = if let Some(
        (_, h, m, s, frac, mer),
    ) =
        regex_captures!(
            r"(?i)^(\d{1,2}):(\d{2})(?::(\d{2})(?:[.,](\d{1,9}))?)?\s*(am|pm)?$",
            text,
        )
    {
        (h, m, s, frac, mer)
    } else if let Some((_, h, mer)) =
        regex_captures!(r"(?i)^(\d{1,2})\s*(am|pm)$", text)
    {
        (h, "0", "", "", mer)
    } else {
        return None;
    };

    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    let second: u32 = if second.is_empty() { 0 } else { second.parse().ok()? };
    let nanos: u32 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{fraction:0<9}");
        padded.get(..9)?.parse().ok()?
    };

    if !meridiem.is_empty() {
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = meridiem.eq_ignore_ascii_case("pm");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
    }

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

/// Parses a `date` value, normalized to midnight.
pub(crate) fn parse_date(text: &str) -> Option<Timestamp> {
    let (core, zone) = split_zone(text);
    let date = parse_date_part(&core)?;
    Some(Timestamp::new(date.and_time(NaiveTime::MIN), zone))
}

/// Parses a `time` value, attached to the reference date.
pub(crate) fn parse_time(text: &str) -> Option<Timestamp> {
    let (core, zone) = split_zone(text);
    let time = parse_time_part(&core)?;
    Some(Timestamp::new(reference_date().and_time(time), zone))
}

/// Parses a `datetime` value: date and clock separated by `T` or spaces.
pub(crate) fn parse_datetime(text: &str) -> Option<Timestamp> {
    let (core, zone) = split_zone(text);

    // Not an early return: a `t` inside a written month name (`Oct`) must
    // fall through to whitespace splitting.
    if let Some((date, time)) = core.split_once(['T', 't']) {
        if let (Some(date), Some(time)) =
            (parse_date_part(date), parse_time_part(time))
        {
            return Some(Timestamp::new(join(date, time), zone));
        }
    }

    let tokens: Vec<&str> = core.split_whitespace().collect();
    for split in (1..tokens.len()).rev() {
        let (date, time) =
            (tokens[..split].join(" "), tokens[split..].join(" "));
        if let (Some(date), Some(time)) =
            (parse_date_part(&date), parse_time_part(&time))
        {
            return Some(Timestamp::new(join(date, time), zone));
        }
    }
    None
}

fn join(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

/// Parses a signed compound duration, e.g. `1h30m` or `-750ms`.
///
/// Unit suffixes come from [`humantime`]; `µs`/`μs` normalize to `us`
/// beforehand since [`humantime`] only knows the ASCII spelling.
pub(crate) fn parse_duration(text: &str) -> Option<chrono::Duration> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let normalized = rest.replace(['µ', 'μ'], "u");
    let parsed = humantime::parse_duration(&normalized).ok()?;
    let duration = chrono::Duration::from_std(parsed).ok()?;
    Some(if negative { -duration } else { duration })
}
