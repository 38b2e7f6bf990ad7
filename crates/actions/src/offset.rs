//! Signed duration offsets (`-1h`, `-30m`, `+2d`) used by action-plan steps
//! to derive a new absolute time from one carried in a prior step's result
//! (§4.9: "apply any offset expressions against a resolved absolute time in
//! the referenced result"). Parsed and validated up front — a malformed
//! expression fails the plan at creation time rather than mid-execution.

use chrono::{DateTime, Duration, Utc};
use vc_domain::error::{Error, Result};

/// Parse `[+-]<integer><unit>` where unit is one of `s`, `m`, `h`, `d`.
/// The sign is required so offsets read unambiguously in a params blob.
pub fn parse_offset(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1i64, &raw[1..]),
        Some(b'-') => (-1i64, &raw[1..]),
        _ => return Err(Error::ActionNotAllowed(format!("offset '{raw}' must start with + or -"))),
    };
    if rest.is_empty() {
        return Err(Error::ActionNotAllowed(format!("offset '{raw}' has no magnitude")));
    }
    let (digits, unit) = rest.split_at(rest.len() - 1);
    let magnitude: i64 = digits
        .parse()
        .map_err(|_| Error::ActionNotAllowed(format!("offset '{raw}' has a non-numeric magnitude")))?;

    let duration = match unit {
        "s" => Duration::seconds(magnitude),
        "m" => Duration::minutes(magnitude),
        "h" => Duration::hours(magnitude),
        "d" => Duration::days(magnitude),
        other => return Err(Error::ActionNotAllowed(format!("offset '{raw}' has unknown unit '{other}'"))),
    };
    Ok(duration * sign as i32)
}

pub fn apply_offset(base: DateTime<Utc>, raw: &str) -> Result<DateTime<Utc>> {
    Ok(base + parse_offset(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_negative_hours() {
        let d = parse_offset("-1h").unwrap();
        assert_eq!(d, Duration::hours(-1));
    }

    #[test]
    fn parses_positive_days() {
        let d = parse_offset("+2d").unwrap();
        assert_eq!(d, Duration::days(2));
    }

    #[test]
    fn rejects_missing_sign() {
        assert!(parse_offset("30m").is_err());
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(parse_offset("-5w").is_err());
    }

    #[test]
    fn rejects_non_numeric_magnitude() {
        assert!(parse_offset("-xh").is_err());
    }

    #[test]
    fn apply_offset_shifts_base_time() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let shifted = apply_offset(base, "-30m").unwrap();
        assert_eq!(shifted, base - Duration::minutes(30));
    }
}
