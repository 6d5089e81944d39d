//! Checker semantics (§4.E, invariant I-5).

use oj_schemas::CheckerType;

pub fn check(checker: CheckerType, eps: f64, actual: &str, expected: &str) -> bool {
    match checker {
        CheckerType::Exact => check_exact(actual, expected),
        CheckerType::Eps => check_eps(actual, expected, eps),
    }
}

fn check_exact(actual: &str, expected: &str) -> bool {
    trim_trailing(actual) == trim_trailing(expected)
}

fn trim_trailing(s: &str) -> &str {
    s.trim_end_matches(['\r', '\n', ' '])
}

fn check_eps(actual: &str, expected: &str, eps: f64) -> bool {
    let a: Vec<&str> = actual.split_whitespace().collect();
    let b: Vec<&str> = expected.split_whitespace().collect();
    if a.len() != b.len() {
        return false;
    }
    for (x, y) in a.iter().zip(b.iter()) {
        let (Ok(xf), Ok(yf)) = (x.parse::<f64>(), y.parse::<f64>()) else {
            return false;
        };
        if !xf.is_finite() || !yf.is_finite() {
            return false;
        }
        if (xf - yf).abs() > eps {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_ignores_trailing_whitespace_and_newlines() {
        assert!(check_exact("42\n", "42"));
        assert!(check_exact("42 \r\n", "42"));
        assert!(!check_exact("42", "4 2"));
    }

    #[test]
    fn exact_does_not_ignore_interior_whitespace() {
        assert!(!check_exact("4 2", "42"));
    }

    #[test]
    fn eps_accepts_within_tolerance() {
        assert!(check_eps("1.0001 2.0", "1.0 2.0", 1e-3));
    }

    #[test]
    fn eps_rejects_outside_tolerance() {
        assert!(!check_eps("1.1", "1.0", 1e-3));
    }

    #[test]
    fn eps_rejects_mismatched_token_counts() {
        assert!(!check_eps("1.0 2.0", "1.0", 1e-3));
    }

    #[test]
    fn eps_rejects_non_numeric_tokens() {
        assert!(!check_eps("banana", "1.0", 1e-3));
    }
}
