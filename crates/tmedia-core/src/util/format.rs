// crates/tmedia-core/src/util/format.rs
//
// Duration formatting/parsing. Three accepted syntaxes, no whitespace:
// `H:MM:SS`, `M:SS`, or a plain integer number of seconds.

use crate::error::{Result, TmediaError};

pub fn is_h_mm_ss_duration(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    parts.len() == 3
        && parts[0].chars().all(|c| c.is_ascii_digit())
        && !parts[0].is_empty()
        && parts[1].len() == 2
        && parts[1].chars().all(|c| c.is_ascii_digit())
        && parts[2].len() == 2
        && parts[2].chars().all(|c| c.is_ascii_digit())
}

pub fn is_m_ss_duration(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    parts.len() == 2
        && parts[0].chars().all(|c| c.is_ascii_digit())
        && !parts[0].is_empty()
        && parts[1].len() == 2
        && parts[1].chars().all(|c| c.is_ascii_digit())
}

pub fn is_plain_seconds_duration(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Parses `H:MM:SS`, `M:SS`, or plain integer seconds into a second count.
pub fn parse_duration(s: &str) -> Result<f64> {
    if is_h_mm_ss_duration(s) {
        let parts: Vec<&str> = s.split(':').collect();
        let h: f64 = parts[0].parse().unwrap();
        let m: f64 = parts[1].parse().unwrap();
        let sec: f64 = parts[2].parse().unwrap();
        return Ok(h * 3600.0 + m * 60.0 + sec);
    }
    if is_m_ss_duration(s) {
        let parts: Vec<&str> = s.split(':').collect();
        let m: f64 = parts[0].parse().unwrap();
        let sec: f64 = parts[1].parse().unwrap();
        return Ok(m * 60.0 + sec);
    }
    if is_plain_seconds_duration(s) {
        return Ok(s.parse().unwrap());
    }
    Err(TmediaError::InvalidArgument(format!("not a valid duration: '{s}'")))
}

/// `HH:MM:SS` when `seconds >= 3600`, otherwise `MM:SS`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if seconds >= 3600.0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_under_an_hour_as_mm_ss() {
        assert_eq!(format_duration(125.0), "02:05");
    }

    #[test]
    fn formats_an_hour_or_more_as_hh_mm_ss() {
        assert_eq!(format_duration(3661.0), "01:01:01");
    }

    #[test]
    fn parses_all_three_syntaxes() {
        assert_eq!(parse_duration("90").unwrap(), 90.0);
        assert_eq!(parse_duration("1:30").unwrap(), 90.0);
        assert_eq!(parse_duration("1:01:30").unwrap(), 3690.0);
    }

    #[test]
    fn rejects_whitespace_and_garbage() {
        assert!(parse_duration("1: 30").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("").is_err());
    }
}
