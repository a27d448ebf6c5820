use crate::domain::model::JobCount;
use crate::utils::error::{Result, ScrapeError};
use regex::Regex;
use std::sync::OnceLock;

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9]+(?:[,.][0-9]{3}\b)*").expect("digit-run pattern is valid")
    })
}

/// Parses the first digit run in `text` as a job count.
///
/// A run may carry `,` or `.` thousands groups (`"1,204"` is 1204). A group
/// must be exactly three digits, so `"1,2345"` stops at 1. Only the
/// first run counts: `"page 2 of 300"` yields 2, so text with a leading
/// non-count numeral is misread. Text with no digit at all is an error, never
/// zero.
pub fn parse_count(text: &str) -> Result<JobCount> {
    let run = digit_run()
        .find(text)
        .ok_or_else(|| ScrapeError::CountParseError {
            text: text.to_string(),
        })?;

    let digits: String = run.as_str().chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<JobCount>()
        .map_err(|_| ScrapeError::CountParseError {
            text: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_decorated_counts() {
        assert_eq!(parse_count("42").unwrap(), 42);
        assert_eq!(parse_count("Jobs: 42").unwrap(), 42);
        assert_eq!(parse_count("  (58) open roles ").unwrap(), 58);
        assert_eq!(parse_count("007").unwrap(), 7);
    }

    #[test]
    fn test_thousands_groups_stay_in_one_run() {
        assert_eq!(parse_count("1,204").unwrap(), 1204);
        assert_eq!(parse_count("1,234 jobs").unwrap(), 1234);
        assert_eq!(parse_count("2.500.000").unwrap(), 2_500_000);
        // not a thousands group
        assert_eq!(parse_count("1.5k").unwrap(), 1);
        assert_eq!(parse_count("12,34").unwrap(), 12);
        assert_eq!(parse_count("1,2345").unwrap(), 1);
        assert_eq!(parse_count("1,234,5678 jobs").unwrap(), 1234);
    }

    #[test]
    fn test_only_first_digit_run_is_used() {
        assert_eq!(parse_count("page 2 of 300").unwrap(), 2);
        assert_eq!(parse_count("3 - 58 jobs").unwrap(), 3);
    }

    #[test]
    fn test_no_digits_is_a_failure_not_zero() {
        for text in ["", "   ", "jobs", "n/a", "—", "٣"] {
            let err = parse_count(text).unwrap_err();
            assert!(matches!(err, ScrapeError::CountParseError { .. }), "{:?}", text);
        }
    }

    #[test]
    fn test_overflowing_run_is_a_failure() {
        assert!(parse_count("99999999999999999999 jobs").is_err());
    }
}
