mod cli;
mod compile_flags;
mod config;
mod download;
mod include_all;
mod install;
mod manifest;
mod types;


use anyhow::Result;
use clap::Parser;
use cli::Cli;
use compile_flags::COMPILE_FLAGS_FILE_NAME;
use config::{absolutize, get_install_root, get_vendordeps_dirs, headers_dir};
use download::http_client;
use install::{ensure_installed, InstallState};
use manifest::load_dependencies;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let install_root = get_install_root()?;
    let target_dir = absolutize(&cli.target_dir)?;
    let project_dir = absolutize(&cli.project_dir)?;

    let specs = load_dependencies(&get_vendordeps_dirs(&project_dir))?;
    tracing::debug!("{} dependencies known", specs.len());

    let client = http_client()?;
    match ensure_installed(&client, &install_root, &specs).await? {
        InstallState::NeedsInstall => tracing::info!("Header installation finished"),
        InstallState::Incomplete => tracing::info!("Header cache topped up"),
        InstallState::Ready => tracing::debug!("Header installation skipped"),
    }

    let headers = headers_dir(&install_root);

    println!("Generating {}", COMPILE_FLAGS_FILE_NAME);
    compile_flags::generate(&project_dir, &headers)?;

    println!("Generating header with all includes");
    include_all::generate(&target_dir, &headers)?;

    println!("Done");
    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}
