//! Canned `Problem`/`TestCase` fixtures for the §8 end-to-end scenarios
//! (S1-S6). Every scenario test in the workspace builds its problem row
//! from one of these rather than hand-rolling UUIDs and limits inline.

use oj_schemas::{CheckerType, Problem, TestCase};
use uuid::Uuid;

/// S1/S2/S5: A+B, one case, exact checker, 2s / 256MB.
pub fn a_plus_b_problem() -> Problem {
    Problem {
        id: Uuid::new_v4(),
        slug: "a-plus-b".to_string(),
        title: "A+B".to_string(),
        statement: "Read two integers, print their sum.".to_string(),
        time_limit_ms: 2000,
        memory_limit_kb: 256 * 1024,
        is_public: true,
        checker_type: CheckerType::Exact,
        checker_eps: 0.0,
    }
}

pub fn a_plus_b_testcase(problem_id: Uuid) -> TestCase {
    TestCase {
        id: Uuid::new_v4(),
        problem_id,
        name: "1".to_string(),
        input_text: "1 41\n".to_string(),
        expected_output_text: "42\n".to_string(),
        is_sample: true,
    }
}

/// S4: same shape as A+B but a tight 1s time limit, for a tle-inducing
/// infinite loop submission.
pub fn tight_time_limit_problem() -> Problem {
    Problem {
        time_limit_ms: 1000,
        ..a_plus_b_problem()
    }
}

/// Minimal C `scanf/printf` A+B solution (S1, S5).
pub const AC_SOURCE_C: &str = "#include <stdio.h>\nint main(){int a,b;scanf(\"%d %d\",&a,&b);printf(\"%d\\n\",a+b);return 0;}\n";

/// Same shape, wrong output (S2).
pub const WA_SOURCE_C: &str = "#include <stdio.h>\nint main(){int a,b;scanf(\"%d %d\",&a,&b);printf(\"%d\\n\",41);return 0;}\n";

/// Missing closing brace (S3).
pub const CE_SOURCE_CPP: &str = "int main(){ return 0";

/// Busy-loops forever (S4).
pub const TLE_SOURCE_C: &str = "int main(){while(1){}}\n";
