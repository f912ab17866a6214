//! ═══════════════════════════════════════════════════════════════════════════════
//! AUGUR — Unified Entry Point
//! ═══════════════════════════════════════════════════════════════════════════════
//! Single binary, subcommand dispatch: live polling + HTTP serving, or an
//! offline replay over a saved history file.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use augur::engine::{CycleStatus, Engine, EngineConfig};
use augur::feed::HttpFeed;
use augur::history::DEFAULT_HISTORY_CAPACITY;
use augur::persistence::LearningStore;
use augur::server::{run_server, ServerState};

#[derive(Parser)]
#[command(name = "augur")]
#[command(about = "Augur - dice round prediction engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the upstream feed and serve predictions over HTTP
    Serve {
        /// HTTP bind address
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        bind: String,

        /// Upstream history endpoint (JSON array, newest first)
        #[arg(short, long)]
        feed_url: String,

        /// Learning snapshot file
        #[arg(short, long, default_value = "augur_learning.json")]
        learning_file: PathBuf,

        /// Seconds between polling cycles
        #[arg(short, long, default_value = "3")]
        interval: u64,

        /// Rounds kept in the rolling history window
        #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
        history_capacity: usize,
    },

    /// Run the engine offline over a saved history file and print the summary
    Replay {
        /// JSON file holding a newest-first array of feed records
        file: PathBuf,

        /// Learning snapshot file (read only, never written by replay)
        #[arg(short, long)]
        learning_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            feed_url,
            learning_file,
            interval,
            history_capacity,
        } => {
            let bind_addr: SocketAddr = bind
                .parse()
                .with_context(|| format!("invalid bind address '{}'", bind))?;
            run_serve(bind_addr, feed_url, learning_file, interval, history_capacity).await
        }
        Commands::Replay {
            file,
            learning_file,
        } => run_replay(&file, learning_file.as_deref()),
    }
}

/// Live mode: polling loop as the single engine writer, HTTP server reading
/// snapshots alongside it
async fn run_serve(
    bind_addr: SocketAddr,
    feed_url: String,
    learning_file: PathBuf,
    interval: u64,
    history_capacity: usize,
) -> Result<()> {
    let store = LearningStore::new(&learning_file);
    let records = store.load();

    let config = EngineConfig {
        history_capacity,
        ..EngineConfig::default()
    };
    let engine = Engine::with_learning(config, records);
    let state = Arc::new(ServerState::new(engine));

    let mut feed = HttpFeed::new(&feed_url, history_capacity)?;
    println!("[augur] polling {} every {}s", feed_url, interval);

    let server_state = Arc::clone(&state);
    let server = tokio::spawn(async move { run_server(server_state, bind_addr).await });

    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    loop {
        ticker.tick().await;

        let events = feed.fetch().await;
        let (report, dirty) = {
            let mut engine = state.engine.write().await;
            let report = engine.cycle(events);
            (report, engine.take_learning_dirty())
        };

        if let Some(resolved) = report.resolved {
            let mark = if resolved.correct { "HIT" } else { "MISS" };
            println!(
                "[augur] round #{}: {} ({} at {}%)",
                resolved.target_round, mark, resolved.detector, resolved.confidence
            );
        }
        match report.status {
            CycleStatus::Issued => {
                let engine = state.engine.read().await;
                if let Some(entry) = engine.current_prediction() {
                    println!(
                        "[augur] predicting round #{}: {} ({}%) - {}",
                        entry.target_round, entry.outcome, entry.confidence, entry.rationale
                    );
                }
            }
            CycleStatus::NoPattern => println!("[augur] no pattern fired this round"),
            CycleStatus::NoData => println!("[augur] waiting for history"),
            CycleStatus::NoNewRound => {}
        }

        if dirty {
            let engine = state.engine.read().await;
            if let Err(e) = store.save(engine.learning()) {
                eprintln!("[augur] learning snapshot failed: {}", e);
            }
        }

        if server.is_finished() {
            break;
        }
    }

    server.await?.context("server exited")?;
    Ok(())
}

/// Offline mode: feed the saved history to the engine one round at a time,
/// oldest first, then print the ledger summary
fn run_replay(file: &std::path::Path, learning_file: Option<&std::path::Path>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("could not read {}", file.display()))?;
    let records: Vec<augur::feed::FeedRecord> =
        serde_json::from_str(&text).context("history file is not a JSON array of records")?;
    let events = augur::feed::parse_records(records, usize::MAX);

    let learning = learning_file
        .map(|path| LearningStore::new(path).load())
        .unwrap_or_default();
    let mut engine = Engine::with_learning(EngineConfig::default(), learning);

    // Replay newest-first data as a growing window, oldest round first
    for cut in (0..events.len()).rev() {
        engine.cycle(events[cut..].to_vec());
    }

    let stats = engine.stats();
    println!("Replayed {} rounds from {}", events.len(), file.display());
    println!(
        "  Predictions: {} issued, {} resolved",
        engine.ledger().len(),
        stats.total_resolved
    );
    println!("  Hits: {}  Misses: {}", stats.correct, stats.wrong);
    if let Some(accuracy) = stats.accuracy {
        println!("  Accuracy: {:.1}%", accuracy * 100.0);
    }
    for detector in &stats.per_detector {
        println!(
            "    {:<20} {:>3}/{:<3} ({:.0}%)",
            detector.detector.as_str(),
            detector.correct,
            detector.total,
            detector.accuracy * 100.0
        );
    }
    let assessment = engine.break_assessment();
    println!(
        "  Break risk: {} ({}%) - {}",
        assessment.tier, assessment.probability, assessment.advisory
    );

    Ok(())
}
