use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod access;
mod aggregate;
mod config;
mod db;
mod error;
mod exams;
mod import;
mod models;
mod persist;
mod report;
mod scoring;
mod snapshot;
mod store;

use crate::access::{AccessGate, PasscodeField};
use crate::config::{Config, LogFormat};
use crate::models::{
    EvaluationType, GrowthMetrics, QaSection, QuestionKind, Retention, ReturnRate, SlaCategory,
    SlaCounter, TestQuestion,
};
use crate::snapshot::SnapshotOutcome;
use crate::store::{AppState, NewEvaluation, NewPeerReview};

#[derive(Parser)]
#[command(name = "support-scorecard")]
#[command(about = "Performance scorecard for the customer support team", long_about = None)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,
    #[arg(
        long,
        env = "SCORECARD_MANAGER_PASSCODE",
        default_value = access::DEFAULT_MANAGER_PASSCODE,
        global = true,
        hide_env_values = true
    )]
    manager_passcode: String,
    /// Passcode entered to unlock manager-only commands
    #[arg(long, global = true)]
    passcode: Option<String>,
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo data into empty keys
    Seed,
    /// Import evaluations from a CSV file (manager)
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show global KPIs and the overall performance index
    Stats,
    /// Rank staff by composite score
    Rank {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Write the full markdown report
    Report {
        #[arg(long, default_value = "scorecard.md")]
        out: PathBuf,
    },
    /// Show one staff member's profile; their own passcode adds exam history
    Profile {
        #[arg(long)]
        staff: String,
        #[arg(long)]
        staff_passcode: Option<String>,
    },
    /// Record a performance evaluation (manager)
    Evaluate {
        #[arg(long)]
        staff: String,
        #[arg(long, value_enum)]
        kind: EvaluationType,
        #[arg(long, value_enum)]
        project: Option<SlaCategory>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        communication: u32,
        #[arg(long)]
        speed: u32,
        #[arg(long)]
        process: u32,
        #[arg(long, default_value_t = 0)]
        calls: u32,
        #[arg(long, default_value_t = 0)]
        chats: u32,
        #[arg(long, default_value_t = 0)]
        tasks: u32,
        #[arg(long, default_value_t = 0)]
        sla_met: u32,
        #[arg(long, default_value_t = 0)]
        sla_total: u32,
        #[arg(long)]
        latest_test_score: Option<u32>,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Record a QA audit from a JSON file (manager)
    Audit {
        #[arg(long)]
        file: PathBuf,
    },
    /// Submit a peer review
    PeerReview {
        #[arg(long)]
        target: String,
        #[arg(long)]
        reviewer: Option<String>,
        #[arg(long)]
        teamwork: u32,
        #[arg(long)]
        helpfulness: u32,
        #[arg(long)]
        communication: u32,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Create or delete assessments (manager)
    Assessment {
        #[command(subcommand)]
        action: AssessmentAction,
    },
    /// Print the take-exam link for an assessment
    ExamLink {
        #[arg(long)]
        id: Uuid,
    },
    /// Submit answers for an exam link
    SubmitExam {
        #[arg(long)]
        link: String,
        #[arg(long)]
        staff: String,
        /// JSON object mapping question id to answer text
        #[arg(long)]
        answers: PathBuf,
    },
    /// Grade the written answers of a submission (manager)
    Grade {
        #[arg(long)]
        submission: Uuid,
        /// Points per written question as QUESTION_ID=POINTS
        #[arg(long = "points", value_parser = parse_points)]
        points: Vec<(Uuid, u32)>,
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Update global KPI inputs (manager)
    Kpi {
        #[command(subcommand)]
        metric: KpiCommand,
    },
    /// Save this month's KPI snapshot (manager)
    Snapshot {
        /// Overwrite an existing snapshot for this month without asking
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AssessmentAction {
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum KpiCommand {
    Sla {
        #[arg(long, value_enum)]
        category: SlaCategory,
        #[arg(long)]
        total: u32,
        #[arg(long)]
        met: u32,
        #[arg(long, default_value_t = 95)]
        target: u32,
    },
    /// Average customer rating, 0 to 5
    Csat {
        #[arg(long)]
        rating: f64,
    },
    /// Average first response time in minutes
    Speed {
        #[arg(long)]
        minutes: f64,
    },
    Growth {
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
        #[arg(long)]
        new: u32,
        #[arg(long)]
        returning: u32,
        #[arg(long)]
        total: u32,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditFile {
    staff_id: String,
    date: NaiveDate,
    sections: Vec<QaSection>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionInput {
    #[serde(rename = "type")]
    kind: QuestionKind,
    question: String,
    #[serde(default)]
    correct_answer: Option<String>,
    #[serde(default)]
    distractors: Vec<String>,
    max_points: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentFile {
    title: String,
    topic: String,
    date: NaiveDate,
    questions: Vec<QuestionInput>,
}

fn parse_points(value: &str) -> Result<(Uuid, u32), String> {
    let (id, points) = value
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION_ID=POINTS, got '{value}'"))?;
    let id = Uuid::parse_str(id.trim()).map_err(|err| err.to_string())?;
    let points = points.trim().parse::<u32>().map_err(|err| err.to_string())?;
    Ok((id, points))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn confirm_overwrite(label: &str) -> bool {
    print!("A snapshot for {label} already exists. Overwrite? [y/N] ");
    if let Err(err) = std::io::stdout().flush() {
        tracing::warn!(error = %err, "failed to flush overwrite prompt");
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn authorize(config: &Config, passcode: Option<&str>) -> anyhow::Result<AccessGate> {
    let mut gate = AccessGate::new(config.manager_passcode.clone());
    let mut field = PasscodeField::new(passcode.unwrap_or_default());
    gate.submit(&mut field)
        .context("this command requires the manager passcode (--passcode)")?;
    Ok(gate)
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::init_tracing(cli.log_format);
    let config = Config::new(cli.database_url, cli.manager_passcode, cli.log_format)?;

    let manager_only = matches!(
        cli.command,
        Commands::Import { .. }
            | Commands::Evaluate { .. }
            | Commands::Audit { .. }
            | Commands::Assessment { .. }
            | Commands::Grade { .. }
            | Commands::Kpi { .. }
            | Commands::Snapshot { .. }
    );
    let gate = if manager_only {
        Some(authorize(&config, cli.passcode.as_deref())?)
    } else {
        None
    };

    let pool = connect(&config).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(&pool).await?;
            println!("Seed data written to {inserted} keys.");
        }
        Commands::Stats => {
            let state = db::load_state(&pool).await?;
            print!("{}", report::render_stats(&state));
        }
        Commands::Rank { limit } => {
            let state = db::load_state(&pool).await?;
            println!("Team ranking:");
            print!("{}", report::render_ranking(&state, limit));
        }
        Commands::Report { out } => {
            let state = db::load_state(&pool).await?;
            let report = report::build_report(&state, Utc::now().date_naive());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Profile {
            staff,
            staff_passcode,
        } => {
            let state = db::load_state(&pool).await?;
            print!(
                "{}",
                report::build_profile(&state, &staff, staff_passcode.as_deref())?
            );
        }
        Commands::ExamLink { id } => {
            let state = db::load_state(&pool).await?;
            match state.assessment(id) {
                Some(assessment) => println!("{}: {}", assessment.title, exams::exam_link(id)),
                None => println!("Assessment not found."),
            }
        }
        Commands::PeerReview {
            target,
            reviewer,
            teamwork,
            helpfulness,
            communication,
            comment,
        } => {
            let mut state = db::load_state(&pool).await?;
            state.add_peer_review(
                NewPeerReview {
                    target_staff_id: target,
                    reviewer_name: reviewer,
                    teamwork,
                    helpfulness,
                    communication,
                    comment,
                },
                Utc::now(),
            )?;
            db::save_state(&pool, &state).await?;
            println!("Peer review recorded.");
        }
        Commands::SubmitExam {
            link,
            staff,
            answers,
        } => {
            let mut state = db::load_state(&pool).await?;
            let test_id = match exams::open_exam(&state, &link) {
                exams::ExamView::Ready(assessment) => assessment.id,
                exams::ExamView::NotFound => {
                    println!("Exam not found. Check the link with your manager.");
                    return Ok(());
                }
            };
            let answers: BTreeMap<Uuid, String> = read_json(&answers)?;
            let submission = state.submit_exam(test_id, &staff, answers, Utc::now())?;
            if submission.is_graded {
                println!(
                    "Submitted. Score {}%.",
                    scoring::exam_percentage(submission)
                );
            } else {
                println!("Submitted. Written answers are waiting for review.");
            }
            db::save_state(&pool, &state).await?;
        }
        command => {
            let mut gate = gate.context("manager access was not checked")?;
            gate.require_manager()?;
            let mut state = db::load_state(&pool).await?;
            run_manager_command(&mut state, command)?;
            db::save_state(&pool, &state).await?;
            gate.logout();
        }
    }

    Ok(())
}

fn run_manager_command(state: &mut AppState, command: Commands) -> anyhow::Result<()> {
    let now = Utc::now();

    match command {
        Commands::Import { csv } => {
            let summary = import::import_csv(state, &csv)?;
            println!(
                "Imported {} evaluations from {} ({} skipped).",
                summary.inserted,
                csv.display(),
                summary.skipped
            );
        }
        Commands::Evaluate {
            staff,
            kind,
            project,
            date,
            communication,
            speed,
            process,
            calls,
            chats,
            tasks,
            sla_met,
            sla_total,
            latest_test_score,
            note,
        } => {
            let record = state.add_evaluation(
                NewEvaluation {
                    staff_id: staff,
                    date: date.unwrap_or_else(|| now.date_naive()),
                    kind,
                    project,
                    communication_score: communication,
                    speed_score: speed,
                    process_compliance: process,
                    calls,
                    chats,
                    tasks,
                    sla_met_count: sla_met,
                    sla_total_base: sla_total,
                    latest_test_score,
                    note,
                },
                now,
            )?;
            println!(
                "Evaluation recorded: composite {}%.",
                scoring::evaluation_composite(record)
            );
        }
        Commands::Audit { file } => {
            let audit: AuditFile = read_json(&file)?;
            let record = state.submit_qa(&audit.staff_id, audit.date, audit.sections)?;
            println!("QA audit recorded: {}%.", record.overall_percentage);
        }
        Commands::Assessment { action } => match action {
            AssessmentAction::Create { file } => {
                let input: AssessmentFile = read_json(&file)?;
                let questions = input
                    .questions
                    .into_iter()
                    .map(|question| TestQuestion {
                        id: Uuid::new_v4(),
                        kind: question.kind,
                        question: question.question,
                        correct_answer: question.correct_answer,
                        distractors: question.distractors,
                        max_points: question.max_points,
                    })
                    .collect();
                let assessment =
                    state.add_assessment(&input.title, &input.topic, input.date, questions)?;
                println!("Assessment created: {}", exams::exam_link(assessment.id));
                for question in &assessment.questions {
                    println!("- {} {}", question.id, question.question);
                }
            }
            AssessmentAction::Delete { id } => {
                let removed = state.delete_assessment(id)?;
                println!("Assessment '{}' deleted.", removed.title);
            }
        },
        Commands::Grade {
            submission,
            points,
            feedback,
        } => {
            let graded =
                state.grade_submission(submission, points.into_iter().collect(), feedback, now)?;
            println!("Graded: {}%.", scoring::exam_percentage(graded));
        }
        Commands::Kpi { metric } => {
            match metric {
                KpiCommand::Sla {
                    category,
                    total,
                    met,
                    target,
                } => state.set_sla(category, SlaCounter { total, met, target }),
                KpiCommand::Csat { rating } => state.set_csat_rating(rating)?,
                KpiCommand::Speed { minutes } => state.set_response_speed(minutes)?,
                KpiCommand::Growth {
                    start,
                    end,
                    new,
                    returning,
                    total,
                } => state.set_growth_metrics(GrowthMetrics {
                    retention: Retention {
                        start_count: start,
                        end_count: end,
                        new_count: new,
                    },
                    return_rate: ReturnRate {
                        returning_count: returning,
                        total_count: total,
                    },
                }),
            }
            println!(
                "KPIs updated. Overall performance {}%.",
                aggregate::global_stats(state).overall_perf
            );
        }
        Commands::Snapshot { yes } => {
            let outcome = snapshot::save_snapshot(state, now, |label| yes || confirm_overwrite(label));
            match outcome {
                SnapshotOutcome::Saved => println!("Snapshot saved."),
                SnapshotOutcome::Replaced => println!("Snapshot replaced."),
                SnapshotOutcome::Kept => println!("Existing snapshot kept."),
            }
        }
        _ => anyhow::bail!("not a manager command"),
    }

    Ok(())
}
