//! Date parsing for feed timestamps.
//!
//! Feeds carry dates in RFC 822/2822 (`pubDate`, `lastBuildDate`) or in
//! ISO 8601 / W3C-DTF (`dc:date`, `atom:updated`). [`parse_date`] tries, in
//! order: RFC 2822, a lenient RFC 822 reading (named zones, two-digit years,
//! missing seconds), RFC 3339, then ISO 8601 with optional fractional seconds
//! and reduced precision.

use std::sync::LazyLock;

use regex::Regex;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{FeedError, Result};

static RFC822: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:[a-z]{3,9},?\s+)?(\d{1,2})\s+([a-z]{3,9})\.?\s+(\d{2,4})\s+(\d{1,2}):(\d{2})(?::(\d{2}))?\s*([+-]\d{2}:?\d{2}|[a-z]{1,5})?$",
    )
    .unwrap()
});

static ISO8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{4})(?:-(\d{2})(?:-(\d{2})(?:[t ](\d{2}):(\d{2})(?::(\d{2})(?:[.,](\d{1,9})\d*)?)?\s*(z|[+-]\d{2}(?::?\d{2})?)?)?)?)?$",
    )
    .unwrap()
});

/// Parses a feed date, returning `None` for anything unrecognised.
pub fn parse_date(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    OffsetDateTime::parse(value, &Rfc2822)
        .ok()
        .or_else(|| parse_rfc822(value))
        .or_else(|| OffsetDateTime::parse(value, &Rfc3339).ok())
        .or_else(|| parse_iso8601(value))
}

/// Parses a feed date, failing with [`FeedError::InvalidDate`].
pub fn parse_date_strict(value: &str) -> Result<OffsetDateTime> {
    parse_date(value).ok_or_else(|| FeedError::InvalidDate(value.trim().to_string()))
}

/// Lenient RFC 822 reading as found in RSS `pubDate` values.
pub fn parse_rfc822(value: &str) -> Option<OffsetDateTime> {
    let caps = RFC822.captures(value.trim())?;

    let day: u8 = caps[1].parse().ok()?;
    let month = month_from_name(&caps[2])?;
    let year = match caps[3].len() {
        2 => {
            let short: i32 = caps[3].parse().ok()?;
            if short < 50 { 2000 + short } else { 1900 + short }
        }
        4 => caps[3].parse().ok()?,
        _ => return None,
    };
    let hour: u8 = caps[4].parse().ok()?;
    let minute: u8 = caps[5].parse().ok()?;
    let second: u8 = caps.get(6).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let offset = match caps.get(7) {
        Some(zone) => zone_offset(zone.as_str())?,
        None => UtcOffset::UTC,
    };

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

/// ISO 8601 / W3C-DTF reading, from a bare year down to fractional seconds.
pub fn parse_iso8601(value: &str) -> Option<OffsetDateTime> {
    let caps = ISO8601.captures(value.trim())?;

    let number = |index: usize, default: u32| -> Option<u32> {
        caps.get(index).map_or(Some(default), |m| m.as_str().parse().ok())
    };

    let year: i32 = caps[1].parse().ok()?;
    let month = Month::try_from(u8::try_from(number(2, 1)?).ok()?).ok()?;
    let day = u8::try_from(number(3, 1)?).ok()?;
    let hour = u8::try_from(number(4, 0)?).ok()?;
    let minute = u8::try_from(number(5, 0)?).ok()?;
    let second = u8::try_from(number(6, 0)?).ok()?;
    let nanos = match caps.get(7) {
        Some(fraction) => {
            let digits = fraction.as_str();
            let scale = 10u32.pow(9 - digits.len() as u32);
            digits.parse::<u32>().ok()? * scale
        }
        None => 0,
    };
    let offset = match caps.get(8) {
        Some(zone) => zone_offset(zone.as_str())?,
        None => UtcOffset::UTC,
    };

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms_nano(hour, minute, second, nanos).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

fn month_from_name(name: &str) -> Option<Month> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => Month::January,
        "feb" => Month::February,
        "mar" => Month::March,
        "apr" => Month::April,
        "may" => Month::May,
        "jun" => Month::June,
        "jul" => Month::July,
        "aug" => Month::August,
        "sep" => Month::September,
        "oct" => Month::October,
        "nov" => Month::November,
        "dec" => Month::December,
        _ => return None,
    };
    Some(month)
}

/// Numeric (`+0200`, `-05:00`, `+02`) or named (`GMT`, `EST`, `Z`) zones.
fn zone_offset(zone: &str) -> Option<UtcOffset> {
    if let Some(sign) = zone.chars().next().filter(|c| *c == '+' || *c == '-') {
        let digits: String = zone[1..].chars().filter(char::is_ascii_digit).collect();
        let hours: i8 = digits.get(..2)?.parse().ok()?;
        let minutes: i8 = match digits.get(2..4) {
            Some(m) => m.parse().ok()?,
            None => 0,
        };
        let (hours, minutes) = if sign == '-' { (-hours, -minutes) } else { (hours, minutes) };
        return UtcOffset::from_hms(hours, minutes, 0).ok();
    }

    let hours = match zone.to_ascii_uppercase().as_str() {
        "Z" | "UT" | "UTC" | "GMT" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => return None,
    };
    UtcOffset::from_hms(hours, 0, 0).ok()
}
