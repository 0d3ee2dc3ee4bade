//! Sideload - push APK packages to a networked Android target over adb
//!
//! Usage:
//!   sideload                    # Interactive queue (default)
//!   sideload address 10.0.0.5:5555
//!   sideload install a.apk b.apk
//!   sideload installed --format json

mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sideload_core::bridge::InstalledPackage;
use sideload_core::context::AppContext;
use sideload_core::deploy::{DeploymentOutcome, LibraryListing, Stage, count_failures};
use sideload_core::error::NotifyError;
use sideload_core::notify::Notifier;
use sideload_core::state::SessionObserver;
use sideload_core::status::ConnectionStatus;
use sideload_core::transcript::TranscriptEntry;

use crate::interactive::QueueSession;

#[derive(Parser)]
#[command(name = "sideload")]
#[command(about = "Install APK packages on a networked Android target", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the connection and show the current configuration
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show or set the target host address (host:port)
    Address {
        /// New address; prints the current one when omitted
        value: Option<String>,
    },

    /// Show or set the default package directory
    Dir {
        /// New directory; prints the current one when omitted
        path: Option<PathBuf>,
    },

    /// List package files in the default package directory
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List third-party apps installed on the target
    Installed {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Install one or more package files, in order
    Install {
        /// Package files (paths or file:// URLs)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Poll the connection and print status changes until interrupted
    Watch,

    /// Build and install a package queue interactively
    Queue,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq, Debug)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "sideload=debug,info"
    } else {
        "sideload=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = AppContext::with_defaults(Arc::new(TerminalNotifier))
        .await
        .context("Failed to load sideload configuration")?;

    run_cli(&ctx, cli.command.unwrap_or(Commands::Queue)).await
}

async fn run_cli(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Status { format } => run_status(ctx, format).await,
        Commands::Address { value } => run_address(ctx, value).await,
        Commands::Dir { path } => run_dir(ctx, path).await,
        Commands::List { format } => run_list(ctx, format).await,
        Commands::Installed { format } => run_installed(ctx, format).await,
        Commands::Install { paths } => {
            ctx.state().subscribe(Arc::new(TranscriptPrinter));
            run_install(ctx, &paths).await
        }
        Commands::Watch => run_watch(ctx).await,
        Commands::Queue => {
            ctx.state().subscribe(Arc::new(TranscriptPrinter));
            QueueSession::new(ctx).run().await
        }
    }
}

async fn run_status(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let status = ctx.monitor().check_connection().await;
    let target = ctx.target().load().await;

    match format {
        OutputFormat::Table => {
            println!(
                "Host address:      {}",
                target.address.as_deref().unwrap_or("(not set)")
            );
            println!(
                "Package directory: {}",
                target
                    .default_package_dir
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("Connection:        {}", styled_status(status));
            println!("Config directory:  {}", ctx.config_dir().display());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": status,
                "address": target.address,
                "default_package_dir": target.default_package_dir,
                "config_dir": ctx.config_dir(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

async fn run_address(ctx: &AppContext, value: Option<String>) -> Result<()> {
    let Some(value) = value else {
        match ctx.target().host_address().await {
            Some(address) => println!("{address}"),
            None => {
                println!("Host address not configured.");
                println!("Set one with: sideload address <host:port>");
            }
        }
        return Ok(());
    };

    let address = ctx
        .target()
        .set_host_address(&value)
        .await
        .context("Failed to save host address")?;
    println!("✓ Host address set to {}", style(&address).green());

    let status = ctx.monitor().check_connection().await;
    println!("  Connection: {}", styled_status(status));
    Ok(())
}

async fn run_dir(ctx: &AppContext, path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path else {
        match ctx.target().default_package_dir().await {
            Some(dir) => println!("{}", dir.display()),
            None => {
                println!("Default package directory not configured.");
                println!("Set one with: sideload dir <PATH>");
            }
        }
        return Ok(());
    };

    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }
    let path = std::path::absolute(&path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    ctx.target()
        .set_default_package_dir(&path)
        .await
        .context("Failed to save default package directory")?;
    println!(
        "✓ Default package directory set to {}",
        style(path.display()).green()
    );
    Ok(())
}

async fn run_list(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let listing = ctx
        .library()
        .list()
        .await
        .context("Failed to list package files")?;

    if format == OutputFormat::Json {
        let packages = match &listing {
            LibraryListing::Packages(packages) => packages.as_slice(),
            _ => &[],
        };
        println!("{}", serde_json::to_string_pretty(packages)?);
        return Ok(());
    }

    match listing {
        LibraryListing::DirectoryNotSet => {
            println!("No default package directory set.");
            println!("Set one with: sideload dir <PATH>");
        }
        LibraryListing::Empty => println!("No package files found."),
        LibraryListing::Packages(packages) => {
            for package in packages {
                println!("  {}", package.display_name);
            }
        }
    }
    Ok(())
}

async fn run_installed(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let packages = ctx
        .orchestrator()
        .refresh_installed()
        .await
        .context("Failed to list installed packages")?;

    match format {
        OutputFormat::Table => print_installed_table(&packages),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&packages)?),
    }
    Ok(())
}

async fn run_install(ctx: &AppContext, paths: &[String]) -> Result<()> {
    let report = ctx.registry().add_from_paths(paths);
    for rejected in &report.rejected {
        eprintln!("{} {}", style("⚠").yellow(), rejected);
    }
    if report.accepted.is_empty() {
        anyhow::bail!("No package files to install");
    }

    let outcomes = ctx.orchestrator().deploy_selection().await;

    let attempted = report.accepted.len();
    let failed = count_failures(&outcomes, Stage::Install);
    println!();
    println!("{}", install_summary(attempted, failed));
    if failed > 0 {
        anyhow::bail!("{failed} of {attempted} package(s) failed to install");
    }
    Ok(())
}

async fn run_watch(ctx: &AppContext) -> Result<()> {
    let mut status_rx = ctx.state().subscribe_status();
    let poller = ctx.spawn_polling();
    println!(
        "Watching {} every {}s (Ctrl-C to stop)",
        ctx.target()
            .host_address()
            .await
            .unwrap_or_else(|| "(no address)".to_string()),
        ctx.config().poll_interval().as_secs()
    );

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                println!("{} {}", style("•").dim(), styled_status(status));
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn print_installed_table(packages: &[InstalledPackage]) {
    if packages.is_empty() {
        println!("No third-party apps installed.");
        return;
    }

    println!("{:<32} {:<40} Version", "Label", "Package");
    println!("{}", "-".repeat(90));
    for package in packages {
        println!(
            "{:<32} {:<40} {} ({})",
            truncate(&package.display_label, 32),
            truncate(&package.package_name, 40),
            package.version_name,
            package.version_code
        );
    }
}

pub(crate) fn styled_status(status: ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Connected => style(status).green().to_string(),
        ConnectionStatus::Disconnected => style(status).red().to_string(),
        ConnectionStatus::Unknown => style(status).dim().to_string(),
    }
}

pub(crate) fn install_summary(attempted: usize, failed: usize) -> String {
    if failed == 0 {
        format!("✓ Installed {attempted} package(s)")
    } else {
        format!("✗ {failed} of {attempted} package(s) failed to install")
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Prints notifications on stderr when someone is watching the terminal.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn permission_granted(&self) -> bool {
        console::user_attended_stderr()
    }

    fn request_permission(&self) -> bool {
        false
    }

    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        eprintln!("{} {}: {}", style("🔔").cyan(), style(title).bold(), body);
        Ok(())
    }
}

/// Echoes transcript entries as they are appended.
pub(crate) struct TranscriptPrinter;

impl SessionObserver for TranscriptPrinter {
    fn on_transcript_entry(&self, entry: &TranscriptEntry) {
        let time = entry.at.format("%H:%M:%S");
        if entry.is_failure() {
            println!("  {} {}", style(time).dim(), style(&entry.message).red());
        } else {
            println!("  {} {}", style(time).dim(), entry.message);
        }
    }

    fn on_outcome(&self, outcome: &DeploymentOutcome) {
        tracing::debug!(
            package = %outcome.package.display_name,
            stage = %outcome.stage,
            success = outcome.success,
            "Deployment outcome"
        );
    }
}
