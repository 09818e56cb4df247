//! Field parsing helpers for the extract and cohort files.
//!
//! Every function here is total: bad input degrades to `None` with a
//! warning in the log, never a panic or an error. The extracts arrive
//! with decades of accumulated formatting drift and a single malformed
//! cell must not take the run down.

use chrono::NaiveDate;
use log::warn;

/// Date formats seen across the extract generations, tried in order
///
/// The two-digit slash form must come before the four-digit one: `%Y`
/// accepts a two-digit year, while `%y` fails cleanly on a four-digit
/// one and falls through.
pub const DATE_FORMATS: [&str; 6] = [
    "%d/%m/%y", "%d/%m/%Y", "%d-%m-%Y", "%d%b%Y", "%d-%b-%y", "%Y-%m-%d",
];

/// Parse a date cell against the known format list
///
/// # Returns
/// The parsed date, or `None` (with a warning) when no format matches
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    warn!("unparseable date {trimmed:?}");
    None
}

/// Parse an integer cell, tolerating the `1234.0` float renderings that
/// spreadsheet round trips leave behind
#[must_use]
pub fn parse_int(raw: &str) -> Option<i64> {
    let mut trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(stripped) = trimmed.strip_suffix(".0") {
        trimmed = stripped;
    }

    match trimmed.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("unparseable integer {trimmed:?}");
            None
        }
    }
}

/// Normalise a sex cell to the standard code set 0/1/2/9
///
/// Word forms are accepted alongside the numeric codes; anything else
/// is dropped with a warning.
#[must_use]
pub fn parse_sex(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let code = match trimmed.to_ascii_uppercase().as_str() {
        "1" | "M" | "MALE" => "1",
        "2" | "F" | "FEMALE" => "2",
        "0" | "NOT KNOWN" => "0",
        "9" | "NOT SPECIFIED" => "9",
        other => {
            warn!("unrecognised sex code {other:?}");
            return None;
        }
    };

    Some(code.to_string())
}

/// Normalise a postcode: uppercase, single space between the outward
/// and inward parts
///
/// The inward part of a UK postcode is always the last three
/// characters. Values outside five to eight characters are kept as-is
/// (uppercased) with a warning, since truncating would lose data.
#[must_use]
pub fn format_postcode(raw: &str) -> Option<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.is_empty() {
        return None;
    }

    if !(5..=8).contains(&compact.len()) {
        warn!("postcode {compact:?} has unexpected length {}", compact.len());
        return Some(compact);
    }

    let (outward, inward) = compact.split_at(compact.len() - 3);
    Some(format!("{outward} {inward}"))
}

/// Parse a yes/no flag cell
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.to_ascii_uppercase().as_str() {
        "1" | "Y" | "YES" | "TRUE" => Some(true),
        "0" | "N" | "NO" | "FALSE" => Some(false),
        other => {
            warn!("unrecognised flag value {other:?}");
            None
        }
    }
}

/// Normalise a person name for comparison: uppercase, hyphens treated
/// as separators, everything but letters and spaces stripped, runs of
/// spaces collapsed
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let upper = raw.to_uppercase();
    let cleaned: String = upper
        .chars()
        .map(|c| if c == '-' { ' ' } else { c })
        .filter(|c| c.is_alphabetic() || *c == ' ')
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Postcode form used as a join key: uppercase with all spaces removed
#[must_use]
pub fn postcode_key(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.is_empty() { None } else { Some(compact) }
}
