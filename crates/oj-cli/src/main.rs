//! Operator CLI for the judge core: database status/migration, queue
//! depth, and local submission intake — the same kind of thin wrapper
//! around the core crates as the daemon binary, just for one-shot
//! operator commands instead of a long-running process.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oj_config::Config;
use oj_db::{ProblemStore, SubmissionStore};
use oj_queue::{QueueBroker, IN_FLIGHT_KEY, PENDING_KEY};
use oj_schemas::{CheckerType, Problem, TestCase};
use oj_storage::SubmissionStorage;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "oj")]
#[command(about = "Submission execution core operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Queue commands
    Queue {
        #[command(subcommand)]
        cmd: QueueCmd,
    },

    /// Enqueue a new submission for judging.
    Submit {
        /// Submitting user id
        #[arg(long)]
        user: Uuid,

        /// Problem id
        #[arg(long)]
        problem: Uuid,

        /// Language: c | cpp | python | java
        #[arg(long)]
        language: String,

        /// Path to the source file to submit
        #[arg(long)]
        source: String,
    },

    /// Look up a submission's status and per-case detail.
    Submission {
        #[command(subcommand)]
        cmd: SubmissionCmd,
    },

    /// Seed a problem and a single test case.
    Problem {
        #[command(subcommand)]
        cmd: ProblemCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    Migrate,
}

#[derive(Subcommand)]
enum QueueCmd {
    Depth,
}

#[derive(Subcommand)]
enum SubmissionCmd {
    /// Print status and judge details for one submission.
    Status {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand)]
enum ProblemCmd {
    /// Register a problem with a single test case (for local smoke-testing).
    AddSimple {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = 2000)]
        time_limit_ms: i64,
        #[arg(long, default_value_t = 256 * 1024)]
        memory_limit_kb: i64,
        #[arg(long)]
        input: String,
        #[arg(long)]
        expected_output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    oj_config::bootstrap_dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = oj_db::connect(&config.database_url).await?;
            match cmd {
                DbCmd::Status => {
                    let status = oj_db::status(&pool).await?;
                    println!("db_ok={} has_submissions_table={}", status.ok, status.has_submissions_table);
                }
                DbCmd::Migrate => {
                    oj_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::Queue { cmd } => match cmd {
            QueueCmd::Depth => {
                let broker = QueueBroker::connect(&config.redis_url)?;
                let now_ms = chrono_now_ms();
                let depth = broker.depth(PENDING_KEY, IN_FLIGHT_KEY, now_ms).await?;
                println!("pending_depth={}", depth.pending_depth);
                println!("in_flight_depth={}", depth.in_flight_depth);
                println!("expired_candidates={}", depth.expired_candidates);
            }
        },

        Commands::Submit {
            user,
            problem,
            language,
            source,
        } => {
            let pool = oj_db::connect(&config.database_url).await?;
            let submissions = SubmissionStore::new(pool);
            let storage = SubmissionStorage::new(config.submission_dir.clone());
            let broker = QueueBroker::connect(&config.redis_url)?;

            let source_bytes = tokio::fs::read(&source)
                .await
                .with_context(|| format!("reading source file {source}"))?;

            let submission_id = submissions
                .insert_pending(user, problem, &language, &source)
                .await
                .context("inserting submission row")?;
            storage
                .write_source(submission_id, &source_bytes)
                .await
                .context("writing submission source")?;
            broker
                .enqueue(PENDING_KEY, &submission_id.to_string())
                .await
                .context("enqueueing submission")?;

            println!("submission_id={submission_id}");
        }

        Commands::Submission { cmd } => match cmd {
            SubmissionCmd::Status { id } => {
                let pool = oj_db::connect(&config.database_url).await?;
                let submissions = SubmissionStore::new(pool);
                let Some(row) = submissions.get_submission(id).await? else {
                    anyhow::bail!("no such submission: {id}");
                };
                println!(
                    "submission_id={} status={} retry_count={}",
                    row.submission_id,
                    row.status.as_str(),
                    row.retry_count
                );
                for detail in submissions.list_judge_details(id).await? {
                    println!(
                        "  case={} verdict={} time_ms={:?} memory_kb={:?}",
                        detail.testcase_name, detail.status, detail.time_ms, detail.memory_kb
                    );
                }
            }
        },

        Commands::Problem { cmd } => match cmd {
            ProblemCmd::AddSimple {
                slug,
                title,
                time_limit_ms,
                memory_limit_kb,
                input,
                expected_output,
            } => {
                let pool = oj_db::connect(&config.database_url).await?;
                let problems = ProblemStore::new(pool);

                let problem = Problem {
                    id: Uuid::new_v4(),
                    slug,
                    title,
                    statement: String::new(),
                    time_limit_ms,
                    memory_limit_kb,
                    is_public: true,
                    checker_type: CheckerType::Exact,
                    checker_eps: 0.0,
                };
                problems.insert_problem(&problem).await.context("inserting problem row")?;

                let testcase = TestCase {
                    id: Uuid::new_v4(),
                    problem_id: problem.id,
                    name: "1".to_string(),
                    input_text: input,
                    expected_output_text: expected_output,
                    is_sample: true,
                };
                problems
                    .insert_testcase(&testcase, 0)
                    .await
                    .context("inserting test case row")?;

                println!("problem_id={}", problem.id);
            }
        },
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `chrono::Utc::now()` without threading a `Config`-owned clock through
/// this one-shot command; matches the reclaimer's own epoch-millis math.
fn chrono_now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
