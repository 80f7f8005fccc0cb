//! Best-effort detection of the match percentage in free-form ATS output.
//!
//! The ATS result stays opaque text in the API; this is used for logging only.

use std::sync::OnceLock;

use regex::Regex;

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\d-])(\d{1,3})(?:\.\d+)?\s*%").expect("valid percent regex")
    })
}

fn out_of_hundred_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\d-])(\d{1,3})(?:\.\d+)?\s*/\s*100\b").expect("valid out-of-100 regex")
    })
}

/// Finds the match percentage the model reported, if any.
///
/// Lines mentioning "match" are preferred; values above 100 are ignored.
/// A number must not continue a longer number or close a range, so "1000%"
/// and an echoed "(0-100%)" are both skipped.
pub fn detect_match_percentage(ats_result: &str) -> Option<u8> {
    let match_lines = ats_result
        .lines()
        .filter(|line| line.to_ascii_lowercase().contains("match"));
    for line in match_lines {
        if let Some(value) = first_in_range(percent_re(), line) {
            return Some(value);
        }
    }

    first_in_range(percent_re(), ats_result)
        .or_else(|| first_in_range(out_of_hundred_re(), ats_result))
}

fn first_in_range(re: &Regex, haystack: &str) -> Option<u8> {
    re.captures_iter(haystack)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u8>().ok())
        .find(|value| *value <= 100)
}
