use chrono::Utc;
use oj_schemas::{
    Submission, SubmissionJudgeDetail, SubmissionResult, SubmissionStatus, Verdict,
};
use sqlx::{PgPool, Row};

/// Returned by [`SubmissionStore::acquire_pending`] when the row is not in
/// `pending` status — signals duplicate queue delivery to the caller, which
/// must ack and drop rather than treat it as a failure.
#[derive(Debug)]
pub enum AcquireError {
    NotPending,
    Db(sqlx::Error),
}

impl std::fmt::Display for AcquireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquireError::NotPending => write!(f, "submission is not pending"),
            AcquireError::Db(e) => write!(f, "db error: {e}"),
        }
    }
}

impl std::error::Error for AcquireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AcquireError::NotPending => None,
            AcquireError::Db(e) => Some(e),
        }
    }
}

impl From<sqlx::Error> for AcquireError {
    fn from(e: sqlx::Error) -> Self {
        AcquireError::Db(e)
    }
}

#[derive(Clone)]
pub struct SubmissionStore {
    pool: PgPool,
}

impl SubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// §4.B: row-lock the submission, verify `status = pending`, transition
    /// to `running`, commit — all inside one serializable-enough
    /// transaction via `SELECT ... FOR UPDATE`. No other path may write
    /// `status = 'running'`.
    pub async fn acquire_pending(&self, submission_id: i64) -> Result<Submission, AcquireError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            select submission_id, user_id, problem_id, language, source_path,
                   status, retry_count, created_at, updated_at
            from submissions
            where submission_id = $1
            for update
            "#,
        )
        .bind(submission_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(AcquireError::NotPending);
        };

        let status: String = row.try_get("status")?;
        if status != "pending" {
            return Err(AcquireError::NotPending);
        }

        let now = Utc::now();
        sqlx::query(
            "update submissions set status = 'running', updated_at = $2 where submission_id = $1",
        )
        .bind(submission_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Submission {
            submission_id: row.try_get("submission_id")?,
            user_id: row.try_get("user_id")?,
            problem_id: row.try_get("problem_id")?,
            language: row.try_get("language")?,
            source_path: row.try_get("source_path")?,
            status: SubmissionStatus::Running,
            retry_count: row.try_get("retry_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: now,
        })
    }

    /// §4.B: update status, upsert the 1:1 result row, replace the
    /// per-case detail rows — one transaction.
    pub async fn save_result(
        &self,
        result: &SubmissionResult,
        final_status: SubmissionStatus,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("update submissions set status = $2, updated_at = now() where submission_id = $1")
            .bind(result.submission_id)
            .bind(final_status.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            insert into submission_results
                (submission_id, verdict, time_ms, memory_kb, stdout_path, stderr_path, exit_code, error_message)
            values ($1, $2, $3, $4, $5, $6, $7, $8)
            on conflict (submission_id) do update set
                verdict = excluded.verdict,
                time_ms = excluded.time_ms,
                memory_kb = excluded.memory_kb,
                stdout_path = excluded.stdout_path,
                stderr_path = excluded.stderr_path,
                exit_code = excluded.exit_code,
                error_message = excluded.error_message
            "#,
        )
        .bind(result.submission_id)
        .bind(result.verdict.code())
        .bind(result.time_ms)
        .bind(result.memory_kb)
        .bind(&result.stdout_path)
        .bind(&result.stderr_path)
        .bind(result.exit_code)
        .bind(&result.error_message)
        .execute(&mut *tx)
        .await?;

        sqlx::query("delete from submission_judge_details where submission_id = $1")
            .bind(result.submission_id)
            .execute(&mut *tx)
            .await?;

        for (seq, detail) in result.details.iter().enumerate() {
            sqlx::query(
                r#"
                insert into submission_judge_details
                    (submission_id, seq, testcase_name, status, time_ms, memory_kb)
                values ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(result.submission_id)
            .bind(seq as i32)
            .bind(&detail.testcase_name)
            .bind(detail.status.code())
            .bind(detail.time_ms)
            .bind(detail.memory_kb)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Atomic increment; returns the new count.
    pub async fn increment_retry(&self, submission_id: i64) -> anyhow::Result<i32> {
        let row = sqlx::query(
            "update submissions set retry_count = retry_count + 1, updated_at = now() \
             where submission_id = $1 returning retry_count",
        )
        .bind(submission_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("retry_count")?)
    }

    /// Used by the reclaimer to reset `running -> pending` for expired
    /// leases, and generally for any unconditional status write that does
    /// not need the `AcquirePending` row-lock semantics.
    pub async fn mark_status(
        &self,
        submission_id: i64,
        status: SubmissionStatus,
    ) -> anyhow::Result<()> {
        sqlx::query("update submissions set status = $2, updated_at = now() where submission_id = $1")
            .bind(submission_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_submission(&self, submission_id: i64) -> anyhow::Result<Option<Submission>> {
        let row = sqlx::query(
            r#"
            select submission_id, user_id, problem_id, language, source_path,
                   status, retry_count, created_at, updated_at
            from submissions
            where submission_id = $1
            "#,
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let status: String = row.try_get("status")?;

        Ok(Some(Submission {
            submission_id: row.try_get("submission_id")?,
            user_id: row.try_get("user_id")?,
            problem_id: row.try_get("problem_id")?,
            language: row.try_get("language")?,
            source_path: row.try_get("source_path")?,
            status: SubmissionStatus::from_str(&status)
                .ok_or_else(|| anyhow::anyhow!("unknown submission status: {status}"))?,
            retry_count: row.try_get("retry_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    pub async fn list_judge_details(
        &self,
        submission_id: i64,
    ) -> anyhow::Result<Vec<SubmissionJudgeDetail>> {
        let rows = sqlx::query(
            "select testcase_name, status, time_ms, memory_kb from submission_judge_details \
             where submission_id = $1 order by seq asc",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(SubmissionJudgeDetail {
                    testcase_name: row.try_get("testcase_name")?,
                    status: Verdict::from_code(&status)
                        .ok_or_else(|| anyhow::anyhow!("unknown verdict code: {status}"))?,
                    time_ms: row.try_get("time_ms")?,
                    memory_kb: row.try_get("memory_kb")?,
                })
            })
            .collect()
    }

    /// Intake helper: insert a new submission row as `pending`. The HTTP
    /// submission surface that calls this is out of core; kept here
    /// because every end-to-end scenario test needs a way to seed one.
    pub async fn insert_pending(
        &self,
        user_id: uuid::Uuid,
        problem_id: uuid::Uuid,
        language: &str,
        source_path: &str,
    ) -> anyhow::Result<i64> {
        let row = sqlx::query(
            r#"
            insert into submissions (user_id, problem_id, language, source_path, status)
            values ($1, $2, $3, $4, 'pending')
            returning submission_id
            "#,
        )
        .bind(user_id)
        .bind(problem_id)
        .bind(language)
        .bind(source_path)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("submission_id")?)
    }
}
