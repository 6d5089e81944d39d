use oj_schemas::{CheckerType, Problem, TestCase};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProblemStore {
    pool: PgPool,
}

impl ProblemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_detail(&self, problem_id: Uuid) -> anyhow::Result<Option<Problem>> {
        let row = sqlx::query(
            r#"
            select id, slug, title, statement, time_limit_ms, memory_limit_kb,
                   is_public, checker_type, checker_eps
            from problems
            where id = $1
            "#,
        )
        .bind(problem_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let checker_type: String = row.try_get("checker_type")?;

        Ok(Some(Problem {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            title: row.try_get("title")?,
            statement: row.try_get("statement")?,
            time_limit_ms: row.try_get("time_limit_ms")?,
            memory_limit_kb: row.try_get("memory_limit_kb")?,
            is_public: row.try_get("is_public")?,
            checker_type: CheckerType::from_str(&checker_type)
                .ok_or_else(|| anyhow::anyhow!("unknown checker_type: {checker_type}"))?,
            checker_eps: row.try_get("checker_eps")?,
        }))
    }

    /// Ordered by insertion (`seq`). Samples are a subset filtered by
    /// `is_sample` at the call site, not a separate query.
    pub async fn list_testcases(&self, problem_id: Uuid) -> anyhow::Result<Vec<TestCase>> {
        let rows = sqlx::query(
            r#"
            select id, problem_id, name, input_text, expected_output_text, is_sample
            from testcases
            where problem_id = $1
            order by seq asc
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TestCase {
                    id: row.try_get("id")?,
                    problem_id: row.try_get("problem_id")?,
                    name: row.try_get("name")?,
                    input_text: row.try_get("input_text")?,
                    expected_output_text: row.try_get("expected_output_text")?,
                    is_sample: row.try_get("is_sample")?,
                })
            })
            .collect()
    }

    /// Intake helper used by tests to seed a problem + testcases.
    pub async fn insert_problem(&self, problem: &Problem) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            insert into problems
                (id, slug, title, statement, time_limit_ms, memory_limit_kb, is_public, checker_type, checker_eps)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(problem.id)
        .bind(&problem.slug)
        .bind(&problem.title)
        .bind(&problem.statement)
        .bind(problem.time_limit_ms)
        .bind(problem.memory_limit_kb)
        .bind(problem.is_public)
        .bind(problem.checker_type.as_str())
        .bind(problem.checker_eps)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_testcase(&self, testcase: &TestCase, seq: i64) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            insert into testcases (id, problem_id, seq, name, input_text, expected_output_text, is_sample)
            values ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(testcase.id)
        .bind(testcase.problem_id)
        .bind(seq)
        .bind(&testcase.name)
        .bind(&testcase.input_text)
        .bind(&testcase.expected_output_text)
        .bind(testcase.is_sample)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
