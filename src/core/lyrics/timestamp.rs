//! LRC timestamp tokens (`MM:SS.cc` or `SS.cc`) to and from seconds.

use crate::error::{LyriqError, Result};

/// Parse a timestamp token into fractional seconds.
///
/// Accepts `MM:SS.cc` and bare `SS.cc`. Anything non-numeric is rejected.
pub fn parse(token: &str) -> Result<f64> {
    let invalid = || LyriqError::InvalidTimestamp {
        token: token.to_string(),
    };

    let seconds = match token.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: f64 = minutes.trim().parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
            minutes * 60.0 + seconds
        }
        None => token.trim().parse().map_err(|_| invalid())?,
    };

    if !seconds.is_finite() {
        return Err(invalid());
    }
    Ok(seconds)
}

/// Format seconds as `MM:SS.cc`, rounding to the nearest centisecond.
pub fn format(seconds: f64) -> String {
    let centis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 100.0).round() as u64
    } else {
        0
    };
    let minutes = centis / 6000;
    let secs = (centis % 6000) / 100;
    let frac = centis % 100;
    format!("{:02}:{:02}.{:02}", minutes, secs, frac)
}

/// `M:SS` display form for track lengths and playback positions.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes_and_seconds() {
        assert_eq!(parse("01:30.50").unwrap(), 90.5);
        assert_eq!(parse("00:00.00").unwrap(), 0.0);
        assert_eq!(parse("10:05.25").unwrap(), 605.25);
    }

    #[test]
    fn test_parse_seconds_only() {
        assert_eq!(parse("05.00").unwrap(), 5.0);
        assert_eq!(parse("10.00").unwrap(), 10.0);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(parse("ar:Artist").is_err());
        assert!(parse("xx.00").is_err());
        assert!(parse("").is_err());
        assert!(matches!(
            parse("1:2:3"),
            Err(LyriqError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_format_pads_fields() {
        assert_eq!(format(0.0), "00:00.00");
        assert_eq!(format(5.5), "00:05.50");
        assert_eq!(format(90.25), "01:30.25");
        assert_eq!(format(605.0), "10:05.00");
    }

    #[test]
    fn test_format_carries_rounding() {
        assert_eq!(format(59.999), "01:00.00");
        assert_eq!(format(-3.0), "00:00.00");
    }

    #[test]
    fn test_format_then_parse() {
        for value in [0.0, 1.23, 61.5, 3599.99] {
            let text = format(value);
            assert!((parse(&text).unwrap() - value).abs() < 0.005, "{}", text);
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(200.0), "3:20");
        assert_eq!(format_duration(59.9), "0:59");
        assert_eq!(format_duration(0.0), "0:00");
    }
}
