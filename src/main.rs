use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cadence::card::{self, CardRecord};
use cadence::{Parameters, PreviewReport, Rating, ScheduleResult, Scheduler, Stats, review, web};

#[derive(Parser)]
#[command(name = "cadence", version, about = "Spaced-repetition scheduler")]
struct Cli {
    /// JSON parameter file (weights, decay, requestRetention)
    #[arg(long, global = true, env = "CADENCE_PARAMS")]
    params: Option<PathBuf>,

    /// Reference time, RFC 3339 (defaults to now)
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rate one card and write the new state back to the snapshot
    Schedule {
        file: PathBuf,
        #[arg(long)]
        id: String,
        /// 1 = again, 2 = hard, 3 = good, 4 = easy
        #[arg(long)]
        rating: i64,
    },
    /// Show the interval each rating would give, without committing
    Preview {
        file: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// List cards due now, new cards first
    Due { file: PathBuf },
    /// Summarize a snapshot
    Stats { file: PathBuf },
    /// Start the JSON HTTP API
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let params = match &cli.params {
        Some(path) => Parameters::load(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        None => Parameters::default(),
    };
    let scheduler = Scheduler::new(params);
    let now = cli.now.unwrap_or_else(Utc::now);

    // stdout carries only JSON; logs go to stderr
    let output = match cli.command {
        Command::Schedule { file, id, rating } => {
            serde_json::to_value(schedule(&scheduler, &file, &id, rating, now)?)?
        }
        Command::Preview { file, id } => {
            serde_json::to_value(preview(&scheduler, &file, &id, now)?)?
        }
        Command::Due { file } => serde_json::to_value(due(&file, now)?)?,
        Command::Stats { file } => serde_json::to_value(stats(&file, now)?)?,
        Command::Serve { port } => {
            tokio::runtime::Runtime::new()?.block_on(web::serve(scheduler, port))?;
            return Ok(());
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load(file: &Path, now: DateTime<Utc>) -> anyhow::Result<Vec<CardRecord>> {
    card::load_snapshot(file, now).with_context(|| format!("failed to read {}", file.display()))
}

fn find(cards: &[CardRecord], id: &str) -> anyhow::Result<usize> {
    match cards.iter().position(|c| c.id == id) {
        Some(i) => Ok(i),
        None => bail!("no card with id {id}"),
    }
}

fn schedule(
    scheduler: &Scheduler,
    file: &Path,
    id: &str,
    rating: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<ScheduleResult> {
    let rating = Rating::try_from(rating)?;
    let mut cards = load(file, now)?;
    let i = find(&cards, id)?;

    let result = scheduler.schedule_card(&cards[i].card, rating, now)?;
    tracing::info!(
        id,
        from = %cards[i].card.state,
        to = %result.state,
        interval = %result.interval,
        "scheduled card"
    );
    cards[i].card = result.clone().into_card();

    card::save_snapshot(file, &cards)
        .with_context(|| format!("failed to write {}", file.display()))?;
    Ok(result)
}

fn preview(
    scheduler: &Scheduler,
    file: &Path,
    id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<PreviewReport> {
    let cards = load(file, now)?;
    let i = find(&cards, id)?;
    Ok(scheduler.preview_schedule(&cards[i].card, now)?.into())
}

fn due(file: &Path, now: DateTime<Utc>) -> anyhow::Result<Vec<CardRecord>> {
    let cards = load(file, now)?;
    Ok(review::get_due_cards(&cards, now)
        .into_iter()
        .cloned()
        .collect())
}

fn stats(file: &Path, now: DateTime<Utc>) -> anyhow::Result<Stats> {
    let cards = load(file, now)?;
    Ok(review::calculate_stats(&cards, now))
}
