//! Duration parsing for config timings like "3s", "50ms", "2m".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

/// Parse a duration string like "50ms", "3s", "2m", "1h".
///
/// Supported units:
/// - `ms` - milliseconds
/// - `s` - seconds
/// - `m` - minutes
/// - `h` - hours
///
/// The input is case-insensitive and whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use chatscribe::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("50ms").unwrap(), Duration::from_millis(50));
/// assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
/// assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    // "ms" has to be checked before "m" and "s".
    let (num, millis_per_unit) = if let Some(num) = s.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1_000)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60 * 1_000)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, 60 * 60 * 1_000)
    } else {
        anyhow::bail!("Duration must end with ms, s, m, or h");
    };

    let num: u64 = num
        .trim()
        .parse()
        .with_context(|| format!("Invalid number in duration: {s:?}"))?;
    let millis = num
        .checked_mul(millis_per_unit)
        .context("Duration is too large")?;

    Ok(Duration::from_millis(millis))
}

/// Format a duration using the largest unit that divides it evenly.
///
/// ```
/// use chatscribe::duration::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(180)), "3m");
/// assert_eq!(format_duration(Duration::from_secs(3)), "3s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
/// ```
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();

    const MILLIS_PER_HOUR: u128 = 60 * 60 * 1_000;
    const MILLIS_PER_MINUTE: u128 = 60 * 1_000;
    const MILLIS_PER_SECOND: u128 = 1_000;

    if millis >= MILLIS_PER_HOUR && millis % MILLIS_PER_HOUR == 0 {
        format!("{}h", millis / MILLIS_PER_HOUR)
    } else if millis >= MILLIS_PER_MINUTE && millis % MILLIS_PER_MINUTE == 0 {
        format!("{}m", millis / MILLIS_PER_MINUTE)
    } else if millis >= MILLIS_PER_SECOND && millis % MILLIS_PER_SECOND == 0 {
        format!("{}s", millis / MILLIS_PER_SECOND)
    } else {
        format!("{millis}ms")
    }
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}

/// Serde serializer producing the same strings `deserialize_duration` accepts.
pub fn serialize_duration<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("50ms").unwrap(), Duration::from_millis(50));
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(30 * 60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(60 * 60));
    }

    #[test]
    fn test_parse_case_and_whitespace() {
        assert_eq!(parse_duration(" 3S ").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("500MS").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_zero() {
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("3").is_err());
        assert!(parse_duration("3d").is_err());
        assert!(parse_duration("abcs").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_overflow() {
        assert!(parse_duration("18446744073709551615h").is_err());
    }

    #[test]
    fn test_format_roundtrip() {
        for input in ["50ms", "3s", "2m", "1h", "1500ms"] {
            let parsed = parse_duration(input).unwrap();
            assert_eq!(format_duration(parsed), input);
        }
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_duration(Duration::ZERO), "0ms");
    }
}
