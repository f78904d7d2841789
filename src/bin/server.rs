//! Online Evaluator server
//!
//! Serves the submission form and the `/eval` endpoint.

use clap::Parser;
use online_evaluator::audit::AuditLog;
use online_evaluator::config::{config_to_toml, load_config_with, validate_config};
use online_evaluator::sandbox::{InterpreterRunner, SnippetRunner};
use online_evaluator::server::{serve, AppState};
use online_evaluator::{NAME, VERSION};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

// ---- CLI ----

#[derive(Parser)]
#[command(name = "online-evaluator", version = VERSION, about = "Online snippet evaluator")]
struct Args {
    /// Configuration file (TOML or JSON5)
    #[arg(long, short, env = "EVALD_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    bind: Option<String>,

    /// Port
    #[arg(long, short)]
    port: Option<u16>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,online_evaluator=info".into());

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut config = load_config_with(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if args.print_config {
        print!("{}", config_to_toml(&config)?);
        return Ok(());
    }

    let validation = validate_config(&config);
    for issue in &validation.warnings {
        warn!("{}", issue);
    }
    for issue in &validation.errors {
        error!("{}", issue);
    }
    if !validation.valid {
        anyhow::bail!("Invalid configuration ({} errors)", validation.errors.len());
    }
    if args.check {
        info!("Configuration OK");
        return Ok(());
    }

    let runner: Arc<dyn SnippetRunner> = Arc::new(InterpreterRunner::new());
    info!(
        "{} {} using {} runner with {}",
        NAME,
        VERSION,
        runner.name(),
        config.interpreter.program.display()
    );

    let audit = if config.audit.enabled {
        let log = AuditLog::open(&config.audit.path).await?;
        info!("Recording submissions to {}", log.path().display());
        Some(log)
    } else {
        None
    };

    let state = AppState::new(&config, runner, audit);
    serve(&config, state).await?;

    Ok(())
}
