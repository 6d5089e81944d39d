use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerType {
    Exact,
    Eps,
}

impl CheckerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckerType::Exact => "exact",
            CheckerType::Eps => "eps",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "exact" => CheckerType::Exact,
            "eps" => CheckerType::Eps,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub statement: String,
    pub time_limit_ms: i64,
    pub memory_limit_kb: i64,
    pub is_public: bool,
    pub checker_type: CheckerType,
    /// Non-zero iff `checker_type == Eps`.
    pub checker_eps: f64,
}

impl Problem {
    /// Invariant from §3: `checker_eps > 0` iff `checker_type = eps`.
    pub fn checker_config_is_valid(&self) -> bool {
        match self.checker_type {
            CheckerType::Eps => self.checker_eps > 0.0,
            CheckerType::Exact => self.checker_eps == 0.0,
        }
    }

    pub fn memory_limit_mb(&self) -> i64 {
        self.memory_limit_kb / 1024
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub problem_id: Uuid,
    /// Display name used in [`crate::SubmissionJudgeDetail::testcase_name`].
    pub name: String,
    pub input_text: String,
    pub expected_output_text: String,
    pub is_sample: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_problem() -> Problem {
        Problem {
            id: Uuid::nil(),
            slug: "a-plus-b".to_string(),
            title: "A+B".to_string(),
            statement: String::new(),
            time_limit_ms: 1000,
            memory_limit_kb: 262144,
            is_public: true,
            checker_type: CheckerType::Exact,
            checker_eps: 0.0,
        }
    }

    #[test]
    fn exact_checker_requires_zero_eps() {
        let p = base_problem();
        assert!(p.checker_config_is_valid());
    }

    #[test]
    fn eps_checker_requires_positive_eps() {
        let mut p = base_problem();
        p.checker_type = CheckerType::Eps;
        p.checker_eps = 0.0;
        assert!(!p.checker_config_is_valid());
        p.checker_eps = 1e-6;
        assert!(p.checker_config_is_valid());
    }
}
