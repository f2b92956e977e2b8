//! Answer equivalence for math-style and multiple-choice answers.
//!
//! Two answers are equal when their normalized forms match, or when both
//! parse as numbers that agree within a relative tolerance. Normalization
//! lowercases, so letter choices match regardless of case.

use crate::error::GradeError;
use once_cell::sync::Lazy;
use regex::Regex;

const RELATIVE_TOLERANCE: f64 = 1e-9;

static TEXT_WRAPPER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:text|textbf|textrm|mathrm|mbox)\{([^{}]*)\}").expect("text wrapper regex should be valid")
});

static FRAC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?)\\frac\{([^{}]+)\}\{([^{}]+)\}$").expect("frac regex should be valid")
});

static THOUSANDS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{1,3}(?:,\d{3})+(?:\.\d+)?$").expect("thousands regex should be valid")
});

static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("number regex should be valid")
});

fn check_braces(s: &str) -> Result<(), GradeError> {
    let mut depth: i64 = 0;
    for c in s.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(GradeError::UnbalancedBraces(s.to_string()));
                }
            }
            _ => {}
        }
    }
    if depth == 0 { Ok(()) } else { Err(GradeError::UnbalancedBraces(s.to_string())) }
}

/// Normalize an answer string for comparison.
///
/// Strips LaTeX decoration (`$`, `\left`, `\text{}`, degree and percent
/// signs), drops short `x =` prefixes, spaces and a trailing period,
/// removes thousands separators and lowercases the result.
pub fn normalize_answer(answer: &str) -> Result<String, GradeError> {
    check_braces(answer)?;

    let mut s = answer.trim().replace(['\n', '\r'], "");
    for (from, to) in [
        ("\\!", ""),
        ("\\dfrac", "\\frac"),
        ("\\tfrac", "\\frac"),
        ("\\left", ""),
        ("\\right", ""),
        ("^{\\circ}", ""),
        ("^\\circ", ""),
        ("\\$", ""),
        ("$", ""),
        ("\\%", ""),
        ("%", ""),
    ] {
        s = s.replace(from, to);
    }

    // Nested wrappers unwrap from the inside out.
    loop {
        let next = TEXT_WRAPPER_REGEX.replace_all(&s, "$1").into_owned();
        if next == s {
            break;
        }
        s = next;
    }

    if let Some((lhs, rhs)) = s.split_once('=') {
        if lhs.trim().chars().count() <= 2 && !rhs.contains('=') {
            s = rhs.to_string();
        }
    }

    s.retain(|c| !c.is_whitespace());
    while s.ends_with('.') {
        s.pop();
    }
    if s.starts_with('.') {
        s.insert(0, '0');
    }
    if THOUSANDS_REGEX.is_match(&s) {
        s.retain(|c| c != ',');
    }

    Ok(s.to_lowercase())
}

/// Parse a normalized answer as a number: decimal, `a/b`, or `\frac{a}{b}`.
fn parse_number(s: &str) -> Option<f64> {
    let plain = |t: &str| NUMBER_REGEX.is_match(t).then(|| t.parse::<f64>().ok()).flatten();

    if let Some(v) = plain(s) {
        return Some(v);
    }
    if let Some(caps) = FRAC_REGEX.captures(s) {
        let (num, den) = (plain(&caps[2])?, plain(&caps[3])?);
        let sign = if caps[1].is_empty() { 1.0 } else { -1.0 };
        return (den != 0.0).then(|| sign * num / den);
    }
    if let Some((num, den)) = s.split_once('/') {
        let (num, den) = (plain(num)?, plain(den)?);
        return (den != 0.0).then(|| num / den);
    }
    None
}

/// Relative comparison; zero only equals zero.
fn numbers_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs())
}

/// Whether `given` is an acceptable answer for `ground_truth`.
pub fn grade_answer(given: &str, ground_truth: &str) -> Result<bool, GradeError> {
    if ground_truth.trim().is_empty() {
        return Err(GradeError::EmptyGroundTruth);
    }

    let truth = normalize_answer(ground_truth)?;
    let given = normalize_answer(given)?;
    if given.is_empty() {
        return Ok(false);
    }
    if given == truth {
        return Ok(true);
    }

    Ok(match (parse_number(&given), parse_number(&truth)) {
        (Some(a), Some(b)) => numbers_equal(a, b),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_equality() {
        assert_eq!(grade_answer("42", "42"), Ok(true));
        assert_eq!(grade_answer("B", "B"), Ok(true));
        assert_eq!(grade_answer("dog", "bird"), Ok(false));
    }

    #[test]
    fn test_letter_case_is_ignored() {
        assert_eq!(grade_answer("b", "B"), Ok(true));
        assert_eq!(grade_answer("\\text{(c)}", "(C)"), Ok(true));
        assert_eq!(grade_answer("Dog", "dog"), Ok(true));
        assert_eq!(grade_answer("a", "B"), Ok(false));
    }

    #[test]
    fn test_small_numbers_use_relative_tolerance() {
        assert_eq!(grade_answer("0.0000001", "0"), Ok(false));
        assert_eq!(grade_answer("0", "0.0000001"), Ok(false));
        assert_eq!(grade_answer("0.3333333", "1/3"), Ok(false));
        assert_eq!(grade_answer("0.0", "0"), Ok(true));
        assert_eq!(grade_answer("1e-7", "0.0000001"), Ok(true));
        assert_eq!(grade_answer("2/6", "1/3"), Ok(true));
    }

    #[test]
    fn test_numeric_equivalence() {
        assert_eq!(grade_answer("0.5", "\\frac{1}{2}"), Ok(true));
        assert_eq!(grade_answer("1/4", "0.25"), Ok(true));
        assert_eq!(grade_answer("-\\dfrac{3}{4}", "-0.75"), Ok(true));
        assert_eq!(grade_answer("1,000", "1000"), Ok(true));
        assert_eq!(grade_answer("3.0", "3"), Ok(true));
        assert_eq!(grade_answer("3.1", "3"), Ok(false));
    }

    #[test]
    fn test_latex_decoration_is_ignored() {
        assert_eq!(grade_answer("$12$", "12"), Ok(true));
        assert_eq!(grade_answer("90^\\circ", "90"), Ok(true));
        assert_eq!(grade_answer("\\text{(C)}", "(C)"), Ok(true));
        assert_eq!(grade_answer("x = 7", "7"), Ok(true));
        assert_eq!(grade_answer("50\\%", "50"), Ok(true));
    }

    #[test]
    fn test_errors() {
        assert_eq!(grade_answer("1", "  "), Err(GradeError::EmptyGroundTruth));
        assert!(matches!(grade_answer("\\frac{1}{2", "0.5"), Err(GradeError::UnbalancedBraces(_))));
    }

    #[test]
    fn test_empty_given_is_wrong_not_error() {
        assert_eq!(grade_answer("", "A"), Ok(false));
    }

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer(" \\left( 1, 2 \\right) ").unwrap(), "(1,2)");
        assert_eq!(normalize_answer(".5").unwrap(), "0.5");
        assert_eq!(normalize_answer("done.").unwrap(), "done");
        assert_eq!(normalize_answer("\\textbf{B}").unwrap(), "b");
    }
}
