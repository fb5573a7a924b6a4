//! Numeric-aware ordering of dotted version strings.
//!
//! Every version check in the store goes through [`compare_versions`].
//! A plain lexical compare puts `"1.10.0"` before `"1.9.0"`; here each
//! dot-separated run of digits compares as an integer.

use std::cmp::Ordering;

/// One dot-separated piece of a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Number(&'a str),
    Text(&'a str),
    /// Padding for the shorter of two versions.
    Missing,
}

impl<'a> Token<'a> {
    fn parse(raw: &'a str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Token::Number(raw)
        } else {
            Token::Text(raw)
        }
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    // Without leading zeros the longer digit run is the larger number.
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_text(a: &str, b: &str) -> Ordering {
    let a = a.chars().flat_map(char::to_lowercase);
    let b = b.chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

fn compare_tokens(a: Token<'_>, b: Token<'_>) -> Ordering {
    match (a, b) {
        (Token::Number(x), Token::Number(y)) => compare_numbers(x, y),
        (Token::Text(x), Token::Text(y)) => compare_text(x, y),
        // Digits collate before letters, so raw text order keeps numbers first.
        (Token::Number(x), Token::Text(y)) | (Token::Text(x), Token::Number(y)) => {
            compare_text(x, y)
        },
        (Token::Missing, Token::Missing) => Ordering::Equal,
        (Token::Missing, Token::Number(y)) => compare_numbers("", y),
        (Token::Number(x), Token::Missing) => compare_numbers(x, ""),
        (Token::Missing, Token::Text(y)) => compare_text("", y),
        (Token::Text(x), Token::Missing) => compare_text(x, ""),
    }
}

/// Compare two version strings.
///
/// Tokens made only of ASCII digits compare numerically, anything else
/// compares case-insensitively as text, and a number sorts before text.
/// The shorter version is padded with empty tokens, so `"1.0"` equals
/// `"1.0.0"`. Malformed input never fails: a string without dots is a
/// single token.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.').map(Token::parse);
    let mut right = b.split('.').map(Token::parse);
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(x), None) => compare_tokens(x, Token::Missing),
            (None, Some(y)) => compare_tokens(Token::Missing, y),
            (Some(x), Some(y)) => compare_tokens(x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Whether `candidate` is strictly newer than `current`.
///
/// An undefined current version (`None`) is older than every version.
pub fn is_newer(candidate: &str, current: Option<&str>) -> bool {
    current.is_none_or(|current| compare_versions(candidate, current) == Ordering::Greater)
}

/// Trim whitespace and a single leading `v` (`"v1.2.4"` -> `"1.2.4"`).
pub fn normalize_version(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_runs_compare_as_integers() {
        assert_eq!(compare_versions("1.9.0", "1.10.0"), Ordering::Less);
        assert_eq!(compare_versions("1.0.10", "1.0.2"), Ordering::Greater);
        assert_eq!(compare_versions("1.1.1", "1.0.14"), Ordering::Greater);
        assert_eq!(compare_versions("2", "10"), Ordering::Less);
    }

    #[test]
    fn equal_versions() {
        assert_eq!(compare_versions("1.2.4", "1.2.4"), Ordering::Equal);
        assert_eq!(compare_versions("01.002", "1.2"), Ordering::Equal);
        assert_eq!(compare_versions("", ""), Ordering::Equal);
    }

    #[test]
    fn shorter_version_is_zero_padded() {
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.1", "1.0.9"), Ordering::Greater);
    }

    #[test]
    fn text_tokens_are_case_insensitive() {
        assert_eq!(compare_versions("1.0.RC", "1.0.rc"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.alpha", "1.0.Beta"), Ordering::Less);
    }

    #[test]
    fn numbers_sort_before_text() {
        assert_eq!(compare_versions("1.0.5", "1.0.beta"), Ordering::Less);
        assert_eq!(compare_versions("1.x", "1.2"), Ordering::Greater);
    }

    #[test]
    fn malformed_input_degrades_to_text() {
        assert_eq!(compare_versions("abc", "abd"), Ordering::Less);
        assert_eq!(compare_versions("", "0"), Ordering::Less);
        assert_eq!(compare_versions("undefined", "1.0.0"), Ordering::Greater);
    }

    #[test]
    fn long_digit_runs_do_not_overflow() {
        assert_eq!(
            compare_versions("1.99999999999999999999999", "1.100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn is_newer_treats_undefined_as_oldest() {
        assert!(is_newer("0", None));
        assert!(is_newer("1.0.10", Some("1.0.2")));
        assert!(!is_newer("1.0.2", Some("1.0.10")));
        assert!(!is_newer("1.1.1", Some("1.1.1")));
    }

    #[test]
    fn normalize_strips_leading_v() {
        assert_eq!(normalize_version("v1.2.4"), "1.2.4");
        assert_eq!(normalize_version(" V2.0 "), "2.0");
        assert_eq!(normalize_version("1.2.4"), "1.2.4");
        assert_eq!(normalize_version("vv1"), "v1");
    }
}
