//! git-seed: bootstrap a git repository hosted on a WebDAV server

use anyhow::{Context, Result};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use git_seed::app;
use git_seed::cli::Cli;
use git_seed::domain::SeedParams;
use git_seed::services::{LineConfirm, SystemRunner};
use git_seed::{AppError, SeedConfig, Seeder};

/// Initialize logging with RUST_LOG environment variable support
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn seed(cli: Cli, params: SeedParams) -> Result<()> {
    let config = SeedConfig::load(cli.config.as_deref())
        .map_err(AppError::from)
        .context("Loading configuration")?;

    let runner = SystemRunner::new();
    let mut seeder = Seeder::new(&config, &runner, io::stdout());

    if cli.dry_run {
        print!("{}", seeder.plan(&params)?);
        return Ok(());
    }

    let report = seeder.run(&params, &mut LineConfirm::stdin())?;
    tracing::info!("Seeded {}", report.locations.remote);
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<AppError>()
        .map(AppError::exit_code)
        .unwrap_or(1)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    init_logging();

    let cli = Cli::parse_args();
    let params = cli.usage_params().unwrap_or_else(|err| err.exit());
    tracing::info!("Starting git-seed for {}", params.repo_name);

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    match app::run_until_interrupted(move || seed(cli, params), interrupt).await {
        Some(Ok(())) => ExitCode::SUCCESS,
        Some(Err(err)) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
        None => {
            // The blocking stdin read cannot be cancelled; leave without
            // waiting for it.
            eprintln!("Interrupted");
            std::process::exit(130);
        }
    }
}
