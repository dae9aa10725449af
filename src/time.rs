use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use crate::constants::Constants;

/// Local formats accepted from the time picker, tried in order.
const LOCAL_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a raw timestamp into a UTC instant.
///
/// RFC 3339 strings keep their own offset. Picker-style local strings
/// (`YYYY-MM-DD HH:MM`) are interpreted in `tz`; local times that are skipped
/// or repeated by a DST transition are rejected rather than guessed.
pub fn parse_instant(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = LOCAL_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;

    let local = tz.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// Serialize an instant the way the backend's `fromisoformat` accepts it.
pub fn to_wire(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Format an instant as `YYYY-MM-DD HH:MM` in the display timezone
pub fn format_display(instant: DateTime<Utc>, tz: Tz) -> String {
    tz.from_utc_datetime(&instant.naive_utc())
        .format(Constants::DISPLAY_DATETIME_FORMAT)
        .to_string()
}

/// Compact card format, e.g. `Jan 05 14:30`
pub fn format_short(instant: DateTime<Utc>, tz: Tz) -> String {
    tz.from_utc_datetime(&instant.naive_utc())
        .format(Constants::SHORT_DATETIME_FORMAT)
        .to_string()
}

/// Parse a timezone name such as `Asia/Kolkata`.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// Human readable offset label for the display timezone
pub fn offset_label(tz: Tz, at: DateTime<Utc>) -> String {
    let local = tz.from_utc_datetime(&at.naive_utc());
    format!("{} (UTC{})", tz.name(), local.format("%:z"))
}
