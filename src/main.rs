use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;

use immigrant_core::{Driver, DriverConfig, DriverError, Revision};
use immigrant_sqlite::SqliteDriver;
use immigrant_telemetry::{init_telemetry, TelemetryConfig};

const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "immigrant", about = "Apply and revert schema revisions")]
struct Cli {
    /// SQLite database to migrate.
    #[arg(long, global = true, env = "IMMIGRANT_DB")]
    db: Option<PathBuf>,

    /// Default log level (RUST_LOG takes precedence).
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the version.
    Version,
    /// Apply revision files in the order given.
    Migrate { revisions: Vec<PathBuf> },
    /// Revert revision files in the order given.
    Rollback { revisions: Vec<PathBuf> },
    /// Print the current HEAD revision.
    State,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig {
        log_level: cli.log_level,
        json: cli.log_json,
        ..TelemetryConfig::default()
    };
    if let Err(e) = init_telemetry(&telemetry) {
        eprintln!("immigrant: failed to initialize logging: {e}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("immigrant: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Command::Version = cli.command {
        println!("immigrant {CLI_VERSION}");
        return Ok(());
    }

    let db = cli.db.context("--db (or IMMIGRANT_DB) is required")?;
    let mut driver = open_driver(&db)?;

    let result = match &cli.command {
        Command::Migrate { revisions } => migrate(driver.as_mut(), revisions),
        Command::Rollback { revisions } => rollback(driver.as_mut(), revisions),
        Command::State => print_state(driver.as_ref()),
        Command::Version => Ok(()),
    };

    // Close even when the command failed, but report the command's error first.
    let closed = driver.close();
    result?;
    closed.context("close database")?;
    Ok(())
}

/// Bind a driver to the database at `db`. Everything past this point sees
/// only the `Driver` operations.
fn open_driver(db: &Path) -> anyhow::Result<Box<dyn Driver>> {
    let mut driver: Box<dyn Driver> = Box::new(SqliteDriver::new());
    driver
        .init(&DriverConfig::from_path(db))
        .with_context(|| format!("open {}", db.display()))?;
    Ok(driver)
}

fn load(paths: &[PathBuf]) -> anyhow::Result<Vec<Revision>> {
    paths
        .iter()
        .map(|path| {
            Revision::from_file(path).with_context(|| format!("load {}", path.display()))
        })
        .collect()
}

fn migrate(driver: &mut dyn Driver, paths: &[PathBuf]) -> anyhow::Result<()> {
    for revision in load(paths)? {
        driver
            .migrate(&revision)
            .with_context(|| format!("migrate {revision}"))?;
        println!("applied {revision}");
    }
    Ok(())
}

fn rollback(driver: &mut dyn Driver, paths: &[PathBuf]) -> anyhow::Result<()> {
    for revision in load(paths)? {
        match driver.rollback(&revision) {
            Ok(()) => println!("rolled back {revision}"),
            Err(DriverError::NoRevisionsApplied) => {
                println!("nothing to roll back");
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("roll back {revision}")),
        }
    }
    Ok(())
}

fn print_state(driver: &dyn Driver) -> anyhow::Result<()> {
    match driver.state() {
        Ok(head) => println!("{}", serde_json::to_string_pretty(&head)?),
        Err(DriverError::HeadDoesNotExist) => println!("no revisions applied"),
        Err(e) => return Err(e).context("read state"),
    }
    Ok(())
}
