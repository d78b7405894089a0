//! table-recon CLI - gate a migrated Snowflake table against its Netezza source.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use table_recon::config::{SourceKind, TargetKind};
use table_recon::{
    Config, Predicate, ReconError, ReconcileOutcome, ReconcileRequest, Reconciler, TableRef,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "table-recon")]
#[command(about = "Reconcile a migrated Snowflake table against its Netezza source")]
#[command(version)]
struct Cli {
    /// Target table as DB.SCHEMA.TABLE
    snowflake_table_name: String,

    /// Source table as DB.SCHEMA.TABLE
    netezza_table_name: String,

    /// Date column used to restrict the source rows
    #[arg(long = "date_column", alias = "date-column")]
    date_column: Option<String>,

    /// Exclusive lower bound (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long = "start_date", alias = "start-date")]
    start_date: Option<String>,

    /// Exclusive upper bound (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long = "end_date", alias = "end-date")]
    end_date: Option<String>,

    /// Path to YAML configuration file
    #[arg(short, long, default_value = "recon.yaml")]
    config: PathBuf,

    /// Read the source profile from this snapshot file instead of Netezza
    #[arg(long)]
    source_snapshot: Option<PathBuf>,

    /// Read the target payload from this file instead of calling Snowflake
    #[arg(long)]
    target_payload: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ReconError::Cancelled) => {
            eprintln!("{}", ReconError::Cancelled.format_detailed());
            // An abandoned driver call may still be running on the blocking
            // pool; do not wait for it on runtime shutdown.
            std::process::exit(i32::from(ReconError::Cancelled.exit_code()))
        }
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), ReconError> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.verbosity, &cli.log_format).map_err(ReconError::Config)?;

    let config = load_config(&cli)?;

    let request = ReconcileRequest {
        source_table: cli.netezza_table_name.parse::<TableRef>()?,
        target_table: cli.snowflake_table_name.parse::<TableRef>()?,
        predicate: Predicate::from_parts(
            cli.date_column.as_deref(),
            cli.start_date.as_deref(),
            cli.end_date.as_deref(),
        )?,
    };

    let reconciler = Reconciler::from_config(&config)?;

    // Setup signal handling (SIGINT and SIGTERM)
    let cancel_token = setup_signal_handler();

    let result = tokio::select! {
        result = reconciler.run(&request) => result?,
        _ = cancel_token.cancelled() => return Err(ReconError::Cancelled),
    };

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        println!(
            "Reconciliation {}: {} (source) vs {} (target)",
            result.outcome.status(),
            result.source_table,
            result.target_table
        );
        if let Some(ref p) = result.predicate {
            println!("  Filter: {}", p);
        }
        match &result.outcome {
            ReconcileOutcome::CountMismatch {
                source_count,
                target_count,
            } => println!(
                "Row count: source={} target={} (MISMATCH)",
                source_count, target_count
            ),
            outcome => {
                if let Some(report) = outcome.report() {
                    print!("{}", report);
                }
            }
        }
        for w in &result.payload_warnings {
            println!("  Ignored {}.{}: {}", w.column, w.key, w.reason);
        }
        println!("  Run: {} ({:.2}s)", result.run_id, result.duration_seconds);
    }

    result.check()
}

/// Load the YAML file (if present), apply command-line overrides, validate.
fn load_config(cli: &Cli) -> Result<Config, ReconError> {
    let has_overrides = cli.source_snapshot.is_some() || cli.target_payload.is_some();
    let mut config = if cli.config.exists() || !has_overrides {
        let config = Config::read(&cli.config)?;
        info!("Loaded configuration from {:?}", cli.config);
        config
    } else {
        Config::default()
    };

    if let Some(ref path) = cli.source_snapshot {
        config.source.kind = SourceKind::Snapshot;
        config.source.snapshot_path = Some(path.clone());
    }
    if let Some(ref path) = cli.target_payload {
        config.target.kind = TargetKind::File;
        config.target.payload_path = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    // Logs go to stderr so --output-json stays parseable.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}

/// Setup signal handlers. Returns a token cancelled on SIGINT or SIGTERM.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for kind in [SignalKind::interrupt(), SignalKind::terminate()] {
        let token = cancel_token.clone();
        match signal(kind) {
            Ok(mut stream) => {
                tokio::spawn(async move {
                    stream.recv().await;
                    eprintln!("\nReceived signal. Cancelling reconciliation...");
                    token.cancel();
                });
            }
            Err(e) => eprintln!("Failed to install signal handler: {}", e),
        }
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Cancelling reconciliation...");
            token.cancel();
        }
    });

    cancel_token
}
