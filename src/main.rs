use anyhow::{Context as _, Result};
use clap::Parser;
use proctord::{config::ProctordConfig, ledger::Ledger, rest, roster::Roster, AppContext};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "proctord",
    about = "Exam collusion audit daemon — flags improbably correlated answer histories",
    version
)]
struct Args {
    /// REST server port
    #[arg(long, env = "PROCTORD_PORT")]
    port: Option<u16>,

    /// Data directory for the revision ledger, roster files, and config
    #[arg(long, env = "PROCTORD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PROCTORD_LOG")]
    log: Option<String>,

    /// Bind address for the REST server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "PROCTORD_BIND")]
    bind_address: Option<String>,

    /// Minimum suspicion score (exclusive) for a pair to appear in audit reports
    #[arg(long, env = "PROCTORD_SUSPICION_THRESHOLD")]
    suspicion_threshold: Option<f64>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "PROCTORD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ProctordConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
        args.suspicion_threshold,
    );

    let _log_guard = setup_logging(&config.log, args.log_file.as_deref(), &config.log_format);

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(serve(config))
}

async fn serve(config: ProctordConfig) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        threshold = config.suspicion_score_threshold,
        "proctord starting"
    );

    let ledger = Ledger::new(&config.data_dir)
        .await
        .context("failed to open revision ledger")?;

    let roster = Roster::load(&config.data_dir).with_context(|| {
        format!(
            "failed to load roster files from {}",
            config.data_dir.display()
        )
    })?;
    info!(
        exams = roster.exams.len(),
        students = roster.students.len(),
        "roster loaded"
    );

    let ctx = Arc::new(AppContext {
        config: Arc::new(config),
        ledger: Arc::new(ledger),
        roster: Arc::new(roster),
        started_at: std::time::Instant::now(),
    });

    rest::start_rest_server(ctx, shutdown_signal()).await
}

/// Resolves when ctrl-c arrives; the REST server drains and exits.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(err = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received — draining open connections");
}

fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("proctord.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            // Fall back to stdout-only — don't panic on a bad log path.
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                .init();
        }
        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
