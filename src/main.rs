use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teeshot::booking::Orchestrator;
use teeshot::client::CountySession;
use teeshot::config::{club_name, credentials_from_env, Config, CLUBS};
use teeshot::models::SortOrder;
use teeshot::scheduler::ClockSync;
use teeshot::utils::{format_clock, now_kst};

#[derive(Parser)]
#[command(
    name = "teeshot",
    version,
    about = "Claims a Golfzon County tee time the moment the booking window opens",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configuration
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for the booking window and claim a tee time
    Run {
        /// Club name or numeric golfclubSeq
        #[arg(long)]
        club: Option<String>,

        /// Tee-time date (YYYYMMDD)
        #[arg(long)]
        date: Option<String>,

        /// Date the booking window opens (YYYYMMDD)
        #[arg(long)]
        run_date: Option<String>,

        /// Time the booking window opens (HH:MM:SS, KST)
        #[arg(long)]
        run_time: Option<String>,

        /// Earliest acceptable tee time (HH:MM)
        #[arg(long)]
        start: Option<String>,

        /// Latest acceptable tee time (HH:MM)
        #[arg(long)]
        end: Option<String>,

        /// Course name or ALL
        #[arg(long)]
        course: Option<String>,

        /// asc or desc
        #[arg(long)]
        order: Option<SortOrder>,

        /// Delay after the target instant in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Actually claim instead of reporting the best candidate
        #[arg(long, default_value = "false")]
        live: bool,
    },

    /// List the known clubs
    Clubs,

    /// Measure the service clock offset
    Clock {
        /// Club name or numeric golfclubSeq
        #[arg(long)]
        club: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    setup_tracing(&config.logging.level, &config.logging.format, cli.verbose)?;

    match cli.command {
        Commands::Run {
            club,
            date,
            run_date,
            run_time,
            start,
            end,
            course,
            order,
            delay_ms,
            live,
        } => {
            let target = &mut config.target;
            if let Some(club) = club {
                target.club = club;
            }
            if date.is_some() {
                target.claim_date = date;
            }
            if run_date.is_some() {
                target.run_date = run_date;
            }
            if let Some(run_time) = run_time {
                target.run_time = run_time;
            }
            if let Some(start) = start {
                target.window_start = start;
            }
            if let Some(end) = end {
                target.window_end = end;
            }
            if let Some(course) = course {
                target.course = course;
            }
            if let Some(order) = order {
                target.order = order;
            }
            if let Some(delay_ms) = delay_ms {
                target.delay_ms = delay_ms;
            }
            if live {
                target.dry_run = false;
            }

            let code = run(config).await?;
            std::process::exit(code);
        }

        Commands::Clubs => {
            for club in CLUBS {
                println!("{:>4}  {:<12} {}", club.seq, club.name, club.region);
            }
        }

        Commands::Clock { club } => {
            if let Some(club) = club {
                config.target.club = club;
            }
            clock(config).await?;
        }
    }

    Ok(())
}

fn setup_tracing(level: &str, format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("teeshot=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("teeshot={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

async fn run(config: Config) -> Result<i32> {
    config.validate()?;
    let target = config.target_config()?;
    let credentials = credentials_from_env()
        .filter(|c| c.is_complete())
        .context("TEESHOT_USER_ID and TEESHOT_PASSWORD must be set")?;

    println!(
        "Club: {} ({})",
        club_name(&target.club_seq).unwrap_or("custom"),
        target.club_seq
    );
    println!("Claim date: {}", target.claim_date);
    println!("Opens at: {} KST", target.run_at);
    println!("Window: {}  Course: {}  Order: {}", target.window, target.category, target.order);
    println!("Mode: {}", if target.dry_run { "dry run" } else { "live" });

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nStop requested, shutting down...");
            on_signal.cancel();
        }
    });

    let outcome = Orchestrator::from_config(&config)
        .run(&target, credentials, cancel)
        .await;

    println!("Result: {outcome}");
    Ok(outcome.exit_code())
}

async fn clock(config: Config) -> Result<()> {
    config.validate()?;
    let target = config.target_config()?;
    let session = CountySession::new(&config.client, target.club_seq)
        .context("Failed to create HTTP session")?;

    let sync = ClockSync::new(
        config.timing.clock_attempts,
        Duration::from_millis(config.timing.clock_retry_pause_ms),
    );
    let offset = sync.measure(&session, &CancellationToken::new()).await?;

    println!("Local time:  {}", now_kst().format("%Y-%m-%d %H:%M:%S%.3f"));
    println!(
        "Server time: {}",
        format_clock(chrono::Utc::now() + offset.offset())
    );
    if offset.is_degraded() {
        println!("Offset: unknown (no usable Date header)");
    } else {
        println!("Offset: {:+.3}s", offset.seconds());
    }

    Ok(())
}
