//! Cadence CLI
//!
//! Command-line front end for the study scheduler. Reads plans and events as
//! JSON files, keeps review state (memory cards, quiz attempts, generated
//! review tasks) in a JSON snapshot, and prints results for humans or, with
//! `--json`, for scripts.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cadence_core::config::parse_iso_date;
use cadence_core::{
    AttemptRecord, AttemptStats, AvailabilityConfig, CatchUpRedistributor, CompletedReview,
    InMemoryStore, MemoryCard, OverdueItem, OverflowPolicy, PerformanceGrader, PlanOutcome,
    PlanRequest, PlannerConfig, RedistributedTask, ReviewOutcome, ReviewScheduler, ReviewStore,
    StudyPlanner, build_day_capacities,
};

/// Default review state file, relative to the working directory
const DEFAULT_STATE_FILE: &str = "cadence-state.json";

/// Cadence - adaptive study scheduler
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build study plans and time reviews with FSRS-5")]
struct Cli {
    /// Planner configuration (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Review state snapshot (JSON)
    #[arg(long, global = true, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a dated plan from a plan request file
    Plan {
        /// Path to a plan request JSON file
        request: PathBuf,
        /// Drop work that fits on no day instead of forcing it onto the
        /// emptiest one
        #[arg(long)]
        drop_overflow: bool,
        /// Feed memory cards from the state file into review timing
        #[arg(long)]
        adaptive: bool,
    },

    /// Re-spread overdue tasks over the next few days
    CatchUp {
        /// Path to a JSON array of overdue items
        items: PathBuf,
        /// Reference date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<String>,
        /// Days to spread over
        #[arg(long)]
        span: Option<u32>,
        /// Availability JSON; packs into real free time when given
        #[arg(long)]
        availability: Option<PathBuf>,
    },

    /// Grade quiz performance
    Grade {
        /// Grade the recorded attempts of this section
        #[arg(long, conflicts_with = "accuracy")]
        section: Option<String>,
        /// Share of correct answers (0-1)
        #[arg(long)]
        accuracy: Option<f64>,
        /// Average seconds per answer
        #[arg(long, default_value = "30")]
        avg_time: f64,
        /// Average confidence (0-5)
        #[arg(long, default_value = "2.5")]
        confidence: f64,
    },

    /// Record a quiz attempt in the state file
    Attempt {
        /// Section the question belongs to
        section: String,
        /// The answer was correct
        #[arg(long)]
        correct: bool,
        /// Seconds spent answering
        #[arg(long, default_value = "30")]
        time: f64,
        /// Self-reported confidence (0-5)
        #[arg(long)]
        confidence: Option<f64>,
        /// Attempt time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Complete a REVIEW task and schedule the next one
    Review {
        /// Id of the completed task
        task_id: String,
        /// Section the review covers
        #[arg(long)]
        section: String,
        /// Course the section belongs to
        #[arg(long)]
        course: String,
        /// Title of the completed task
        #[arg(long, default_value = "")]
        title: String,
        /// Completion time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Show a memory card with its recall probability and grade preview
    Card {
        /// Section id
        section: String,
        /// Reference time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan {
            request,
            drop_overflow,
            adaptive,
        } => {
            let outcome = run_plan(
                &config,
                &request,
                drop_overflow,
                adaptive.then_some(&cli.state),
            )?;
            if cli.json {
                print_json(&outcome)
            } else {
                print_plan(&outcome);
                Ok(())
            }
        }
        Commands::CatchUp {
            items,
            today,
            span,
            availability,
        } => {
            let today = match today {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let tasks = run_catch_up(&config, &items, today, span, availability.as_deref())?;
            if cli.json {
                print_json(&tasks)
            } else {
                print_catch_up(&tasks);
                Ok(())
            }
        }
        Commands::Grade {
            section,
            accuracy,
            avg_time,
            confidence,
        } => {
            let stats = match (section, accuracy) {
                (Some(section), _) => {
                    let store = load_state(&cli.state)?;
                    section_stats(&config, &store, &section, Utc::now())?
                }
                (None, Some(accuracy)) => AttemptStats {
                    accuracy,
                    avg_time_sec: avg_time,
                    avg_confidence: confidence,
                    count: 1,
                },
                (None, None) => bail!("Pass either --section or --accuracy"),
            };
            let grade = PerformanceGrader::new(config.grading).grade(&stats);
            if cli.json {
                print_json(&serde_json::json!({ "grade": grade, "stats": stats }))
            } else {
                println!("{}: {}", "Grade".white().bold(), grade.as_str().cyan().bold());
                println!(
                    "  accuracy {:.0}%, {:.1}s per answer, confidence {:.1}, {} attempts",
                    stats.accuracy * 100.0,
                    stats.avg_time_sec,
                    stats.avg_confidence,
                    stats.count
                );
                Ok(())
            }
        }
        Commands::Attempt {
            section,
            correct,
            time,
            confidence,
            at,
        } => {
            let attempt = AttemptRecord {
                section_id: section,
                correct,
                time_sec: time,
                confidence,
                attempted_at: parse_time(at.as_deref())?,
            };
            let mut store = load_state(&cli.state)?;
            store.record_attempt(attempt.clone());
            save_state(&cli.state, &store)?;
            if cli.json {
                print_json(&attempt)
            } else {
                println!(
                    "{} attempt for {} ({})",
                    "Recorded".green().bold(),
                    attempt.section_id,
                    if attempt.correct { "correct" } else { "wrong" }
                );
                Ok(())
            }
        }
        Commands::Review {
            task_id,
            section,
            course,
            title,
            at,
        } => {
            let review = CompletedReview {
                task_id,
                course_id: course,
                section_id: section,
                title,
                completed_at: parse_time(at.as_deref())?,
            };
            let outcome = run_review(&config, &cli.state, &review)?;
            if cli.json {
                print_json(&outcome)
            } else {
                match &outcome {
                    Some(outcome) => print_review(outcome),
                    None => println!(
                        "{} no adaptive review scheduled, see log",
                        "Skipped:".yellow().bold()
                    ),
                }
                Ok(())
            }
        }
        Commands::Card { section, at } => {
            let store = load_state(&cli.state)?;
            let card = store
                .load_card(&section)?
                .with_context(|| format!("No memory card for section '{}'", section))?;
            let now = parse_time(at.as_deref())?;
            if cli.json {
                let preview = ReviewScheduler::new(&config).memory().preview(
                    &card,
                    card.elapsed_days_at(now),
                    &config.review_target,
                    now,
                );
                print_json(&serde_json::json!({
                    "card": card,
                    "retrievability": card.retrievability_at(now),
                    "preview": preview,
                }))
            } else {
                print_card(&config, &card, now);
                Ok(())
            }
        }
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_plan(
    config: &PlannerConfig,
    request_path: &Path,
    drop_overflow: bool,
    state: Option<&PathBuf>,
) -> anyhow::Result<PlanOutcome> {
    let mut request: PlanRequest = read_json(request_path)?;
    if let Some(state) = state {
        let store = load_state(state)?;
        request.memory_cards.extend(store.cards_for_course(&request.course_id));
    }

    let overflow = if drop_overflow {
        OverflowPolicy::Drop
    } else {
        OverflowPolicy::ForcePlace
    };
    let planner = StudyPlanner::new(config.clone())?.with_overflow(overflow);
    Ok(planner.plan(&request))
}

fn run_catch_up(
    config: &PlannerConfig,
    items_path: &Path,
    today: NaiveDate,
    span: Option<u32>,
    availability_path: Option<&Path>,
) -> anyhow::Result<Vec<RedistributedTask>> {
    let items: Vec<OverdueItem> = read_json(items_path)?;
    let span = span.unwrap_or(config.catch_up_span_days).max(1);
    let redistributor = CatchUpRedistributor::new(config).with_span_days(span);

    let capacities = match availability_path {
        Some(path) => {
            let raw: AvailabilityConfig = read_json(path)?;
            let start = today
                .checked_add_days(Days::new(1))
                .context("Date out of range")?;
            let end = today.checked_add_days(Days::new(u64::from(span)));
            Some(build_day_capacities(start, end, &raw.sanitize(config), config))
        }
        None => None,
    };

    Ok(redistributor.redistribute(&items, today, capacities))
}

/// Scheduling failures are logged and yield `None`; only file errors fail
fn run_review(
    config: &PlannerConfig,
    state: &Path,
    review: &CompletedReview,
) -> anyhow::Result<Option<ReviewOutcome>> {
    let mut store = load_state(state)?;
    let outcome = ReviewScheduler::new(config).on_review_completed(&mut store, review);
    if outcome.is_some() {
        save_state(state, &store)?;
    }
    Ok(outcome)
}

fn section_stats(
    config: &PlannerConfig,
    store: &InMemoryStore,
    section: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<AttemptStats> {
    let since = now - chrono::Duration::days(i64::from(config.attempt_lookback_days));
    let attempts = store.attempts_since(section, since)?;
    Ok(AttemptStats::from_attempts(&attempts))
}

// ============================================================================
// FILES
// ============================================================================

fn load_config(path: Option<&Path>) -> anyhow::Result<PlannerConfig> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    PlannerConfig::from_json(&content)
        .with_context(|| format!("Invalid config {}", path.display()))
}

/// Missing state file means empty state
fn load_state(path: &Path) -> anyhow::Result<InMemoryStore> {
    if !path.exists() {
        return Ok(InMemoryStore::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state {}", path.display()))?;
    InMemoryStore::from_json(&content)
        .with_context(|| format!("Corrupt state file {}", path.display()))
}

fn save_state(path: &Path, store: &InMemoryStore) -> anyhow::Result<()> {
    let json = store.to_json()?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write state {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    parse_iso_date(raw).with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_time(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match raw {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid timestamp '{}', expected RFC 3339", raw))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_plan(outcome: &PlanOutcome) {
    let report = outcome.feasibility();
    println!("{}", "=== Study Plan ===".cyan().bold());
    println!(
        "{}: {} of {} minutes",
        "Workload".white().bold(),
        report.requested_minutes,
        report.capacity_minutes
    );

    let Some(placement) = outcome.placement() else {
        println!(
            "{} short by {} minutes",
            "Infeasible:".red().bold(),
            report.deficit_minutes
        );
        for suggestion in &report.suggestions {
            println!("  - {}", suggestion);
        }
        return;
    };

    let mut current = None;
    for task in &placement.tasks {
        if current != Some(task.due_date) {
            current = Some(task.due_date);
            println!();
            println!("{}", task.due_date.format("%a %Y-%m-%d").to_string().yellow().bold());
        }
        let marker = if task.unit.adaptive { "*" } else { " " };
        println!(
            "  {}{:>2}. {:<50} {:>4} min",
            marker,
            task.order_index + 1,
            task.unit.title,
            task.unit.est_minutes
        );
    }

    println!();
    if placement.forced_placements > 0 {
        println!(
            "{} {} placements exceed their day's capacity",
            "Warning:".yellow().bold(),
            placement.forced_placements
        );
    }
    for dropped in &placement.dropped {
        println!(
            "{} {} ({:?})",
            "Dropped:".red().bold(),
            dropped.unit.title,
            dropped.reason
        );
    }
}

fn print_catch_up(tasks: &[RedistributedTask]) {
    println!("{}", "=== Catch-up ===".cyan().bold());
    if tasks.is_empty() {
        println!("{}", "Nothing overdue.".dimmed());
        return;
    }
    for task in tasks {
        println!("  {:<24} -> {} (+{}d)", task.task_id, task.due_date, task.day_offset);
    }
}

fn print_review(outcome: &ReviewOutcome) {
    println!("{}", "=== Review Recorded ===".cyan().bold());
    println!(
        "{}: {} from {} attempts",
        "Grade".white().bold(),
        outcome.grade.as_str().cyan(),
        outcome.stats.count
    );
    println!(
        "{}: {} (stability {:.2}, difficulty {:.2}, lapses {})",
        "Card".white().bold(),
        outcome.card.state,
        outcome.card.stability,
        outcome.card.difficulty,
        outcome.card.lapses
    );
    println!(
        "{}: {} on {} ({} min)",
        "Next review".white().bold(),
        outcome.task.title,
        outcome.task.due_date.to_string().green(),
        outcome.task.est_minutes
    );
}

fn print_card(config: &PlannerConfig, card: &MemoryCard, now: DateTime<Utc>) {
    println!("{}", format!("=== {} ===", card.section_id).cyan().bold());
    println!("{}: {}", "State".white().bold(), card.state);
    println!("{}: {:.2} days", "Stability".white().bold(), card.stability);
    println!("{}: {:.2}", "Difficulty".white().bold(), card.difficulty);
    println!("{}: {} / {}", "Reps / Lapses".white().bold(), card.reps, card.lapses);
    println!(
        "{}: {:.1}%",
        "Recall now".white().bold(),
        card.retrievability_at(now) * 100.0
    );
    if let Some(next) = card.next_review {
        let due = if card.is_due(now) {
            "due".red().bold()
        } else {
            "scheduled".green()
        };
        println!("{}: {} ({})", "Next review".white().bold(), next.format("%Y-%m-%d"), due);
    }

    let preview = ReviewScheduler::new(config).memory().preview(
        card,
        card.elapsed_days_at(now),
        &config.review_target,
        now,
    );
    println!();
    println!("{}", "If reviewed now:".yellow().bold());
    for (label, result) in [
        ("again", &preview.again),
        ("hard", &preview.hard),
        ("good", &preview.good),
        ("easy", &preview.easy),
    ] {
        println!("  {:<6} -> {:>4} days", label, result.interval);
    }
}

// ============================================================================
// TESTS
// ============================================================================
