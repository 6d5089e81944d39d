use serde::{Deserialize, Serialize};

/// Final per-submission (or per-testcase) judgment.
///
/// A closed sum type by design: every caller that needs to branch on a
/// verdict matches exhaustively rather than comparing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Accepted — output matched under the problem's checker.
    #[serde(rename = "AC")]
    Accepted,
    /// Wrong answer.
    #[serde(rename = "WA")]
    WrongAnswer,
    /// Time limit exceeded.
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
    /// Memory limit exceeded.
    #[serde(rename = "MLE")]
    MemoryLimitExceeded,
    /// Output limit exceeded.
    #[serde(rename = "OLE")]
    OutputLimitExceeded,
    /// Runtime error (non-zero exit, signal, or uncategorized sandbox status).
    #[serde(rename = "RE")]
    RuntimeError,
    /// Compile error.
    #[serde(rename = "CE")]
    CompileError,
    /// System error — the judge itself failed, not the submitted program.
    #[serde(rename = "SE")]
    SystemError,
}

impl Verdict {
    /// The short code used in the DB column and the wire protocol.
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Accepted => "AC",
            Verdict::WrongAnswer => "WA",
            Verdict::TimeLimitExceeded => "TLE",
            Verdict::MemoryLimitExceeded => "MLE",
            Verdict::OutputLimitExceeded => "OLE",
            Verdict::RuntimeError => "RE",
            Verdict::CompileError => "CE",
            Verdict::SystemError => "SE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "AC" => Verdict::Accepted,
            "WA" => Verdict::WrongAnswer,
            "TLE" => Verdict::TimeLimitExceeded,
            "MLE" => Verdict::MemoryLimitExceeded,
            "OLE" => Verdict::OutputLimitExceeded,
            "RE" => Verdict::RuntimeError,
            "CE" => Verdict::CompileError,
            "SE" => Verdict::SystemError,
            _ => return None,
        })
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrips_through_from_code() {
        let all = [
            Verdict::Accepted,
            Verdict::WrongAnswer,
            Verdict::TimeLimitExceeded,
            Verdict::MemoryLimitExceeded,
            Verdict::OutputLimitExceeded,
            Verdict::RuntimeError,
            Verdict::CompileError,
            Verdict::SystemError,
        ];
        for v in all {
            assert_eq!(Verdict::from_code(v.code()), Some(v));
        }
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(Verdict::from_code("XX"), None);
    }
}
