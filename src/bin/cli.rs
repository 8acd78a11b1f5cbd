// src/bin/cli.rs

//! Paper Tracker CLI
//!
//! Runs reconciliation passes, inspects the record store and manages
//! the candidate queue.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};

use paper_tracker::error::Result;
use paper_tracker::models::{CandidateStatus, Config};
use paper_tracker::pipeline::{export_csv, export_json, export_markdown, Tracker};
use paper_tracker::services::GitHubClient;
use paper_tracker::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "paper-tracker",
    version,
    about = "Tracks weight releases for low-level vision paper repositories"
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Record store snapshot
    #[arg(long, default_value = "data/history.json")]
    history: PathBuf,

    /// Candidate queue snapshot
    #[arg(long, default_value = "data/queue.json")]
    queue_file: PathBuf,

    /// GitHub token (falls back to config, then GITHUB_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one reconciliation pass over all configured queries
    Run {
        /// Repository URLs to check without relevance gating
        #[arg(long = "submit")]
        submissions: Vec<String>,

        /// Write JSON/CSV/Markdown reports into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Override the configured star floor
        #[arg(long)]
        min_stars: Option<u32>,

        /// Override the configured per-query result cap
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Inspect and manage the candidate queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Validate the configuration file
    Validate,
    /// Print record store statistics
    Info,
}

#[derive(Subcommand, Debug)]
enum QueueAction {
    /// List queue entries
    List {
        /// Include completed and skipped entries
        #[arg(long)]
        all: bool,
    },
    /// Queue a tracked repository manually
    Add {
        /// Identity string (`owner/name`)
        repo: String,
    },
    /// Remove an entry
    Remove {
        repo: String,
    },
    /// Update an entry's workflow status
    Status {
        repo: String,
        /// pending | processing | completed | skipped
        status: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Paths and credentials shared by every subcommand.
struct AppContext {
    config: PathBuf,
    history: PathBuf,
    queue_file: PathBuf,
    token: Option<String>,
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config,
        history,
        queue_file,
        token,
        verbose: _,
        command,
    } = cli;
    let ctx = AppContext {
        config,
        history,
        queue_file,
        token,
    };

    match command {
        Command::Run {
            submissions,
            export,
            min_stars,
            max_results,
        } => run_reconciliation(&ctx, submissions, export, min_stars, max_results).await,
        Command::Queue { action } => run_queue(&ctx, action).await,
        Command::Validate => {
            let config = Config::load(&ctx.config)?;
            config.validate()?;
            println!("Configuration OK: {} queries", config.queries.len());
            Ok(())
        }
        Command::Info => run_info(&ctx).await,
    }
}

async fn run_reconciliation(
    ctx: &AppContext,
    submissions: Vec<String>,
    export: Option<PathBuf>,
    min_stars: Option<u32>,
    max_results: Option<usize>,
) -> Result<()> {
    let mut config = Config::load_or_default(&ctx.config);
    if let Some(token) = &ctx.token {
        config.github.token = Some(token.clone());
    }
    if let Some(min_stars) = min_stars {
        config.search.min_stars = min_stars;
    }
    if let Some(max_results) = max_results {
        config.search.max_results_per_query = max_results;
    }
    config.validate()?;

    let client = GitHubClient::new(&config)?;
    let mut tracker = Tracker::new(config)?;
    tracker.load(&ctx.history, &ctx.queue_file).await;

    let today = Utc::now().date_naive();
    tracker.reconcile(&client, today).await?;
    if !submissions.is_empty() {
        tracker.process_submissions(&client, &submissions, today).await;
    }
    tracker.save(&ctx.history, &ctx.queue_file, today).await?;

    if let Some(dir) = export {
        tokio::fs::create_dir_all(&dir).await?;
        let summary = tracker.summary(today);
        export_json(dir.join("report.json"), tracker.repos(), &summary).await?;
        export_csv(dir.join("report.csv"), tracker.repos()).await?;
        export_markdown(
            dir.join("report.md"),
            tracker.repos(),
            &summary,
            today,
            tracker.config().search.fresh_window_days,
        )
        .await?;
        println!("Reports written to {}", dir.display());
    }

    print_summary(&tracker, today);
    for full_name in tracker.fresh_releases() {
        println!("Fresh release: {}", full_name);
    }
    Ok(())
}

async fn run_queue(ctx: &AppContext, action: QueueAction) -> Result<()> {
    let config = Config::load_or_default(&ctx.config);
    let mut tracker = Tracker::new(config)?;
    tracker.load(&ctx.history, &ctx.queue_file).await;
    let today = Utc::now().date_naive();

    match action {
        QueueAction::List { all } => {
            let entries: Vec<_> = if all {
                tracker.queue().entries().iter().collect()
            } else {
                tracker.queue().pending()
            };
            if entries.is_empty() {
                println!("Queue is empty");
                return Ok(());
            }
            for entry in entries {
                let paper = if entry.arxiv_id.is_empty() {
                    "-".to_string()
                } else {
                    entry.arxiv_id.clone()
                };
                println!(
                    "{:<12} {:<40} {:<14} {}",
                    entry.status.as_str(),
                    entry.full_name,
                    paper,
                    entry.notes
                );
            }
        }
        QueueAction::Add { repo } => {
            match tracker.promote_manual(&repo) {
                Some(true) => {
                    tracker.save(&ctx.history, &ctx.queue_file, today).await?;
                    println!("Queued {}", repo);
                }
                Some(false) => println!("{} not queued (already present or no weights)", repo),
                None => {
                    return Err(AppError::validation(format!("{} is not tracked", repo)));
                }
            }
        }
        QueueAction::Remove { repo } => {
            if tracker.queue_mut().remove(&repo) {
                tracker.save(&ctx.history, &ctx.queue_file, today).await?;
                println!("Removed {}", repo);
            } else {
                println!("{} not in queue", repo);
            }
        }
        QueueAction::Status {
            repo,
            status,
            notes,
        } => {
            let status = CandidateStatus::parse(&status)
                .ok_or_else(|| AppError::validation(format!("Unknown status: {}", status)))?;
            if tracker
                .queue_mut()
                .update_status(&repo, status, notes.as_deref())
            {
                tracker.save(&ctx.history, &ctx.queue_file, today).await?;
                println!("Updated {} -> {}", repo, status.as_str());
            } else {
                println!("{} not in queue", repo);
            }
        }
    }
    Ok(())
}

async fn run_info(ctx: &AppContext) -> Result<()> {
    let config = Config::load_or_default(&ctx.config);
    let mut tracker = Tracker::new(config)?;
    tracker.load(&ctx.history, &ctx.queue_file).await;
    print_summary(&tracker, Utc::now().date_naive());
    Ok(())
}

fn print_summary(tracker: &Tracker, today: chrono::NaiveDate) {
    let summary = tracker.summary(today);
    println!("Tracked repos:   {}", summary.total_repos);
    for (status, count) in &summary.by_status {
        println!("  {:<14} {}", status, count);
    }
    println!("Fresh releases:  {}", summary.fresh_releases);
    println!("New this run:    {}", summary.new_this_run);
    println!("Queue pending:   {}", summary.queue_pending);
    if !summary.by_conference.is_empty() {
        let venues: Vec<String> = summary
            .by_conference
            .iter()
            .map(|(venue, count)| format!("{} ({})", venue, count))
            .collect();
        println!("Venues:          {}", venues.join(", "));
    }
}
