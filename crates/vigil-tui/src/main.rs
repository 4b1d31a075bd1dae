//! `vigil-tui`: real-time terminal dashboard for a camera behavior-monitoring
//! backend.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `vigil-core`'s [`Monitor`]. Screens are navigable via number keys
//! (1-3): Live, Analysis and Ask.
//!
//! Logs are written to a file (default `/tmp/vigil-tui.log`) to avoid
//! corrupting the terminal UI. A background data bridge task streams
//! snapshots, frames and status samples from the monitor into the TUI
//! action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vigil_config::Profile;
use vigil_core::{Monitor, MonitorConfig};

use crate::app::App;

/// Terminal dashboard for a camera behavior-monitoring backend.
#[derive(Parser, Debug)]
#[command(name = "vigil-tui", version, about)]
struct Cli {
    /// Monitoring backend URL (e.g., http://127.0.0.1:5000)
    #[arg(short = 's', long, env = "VIGIL_SERVER")]
    server: Option<String>,

    /// Search backend URL
    #[arg(long, env = "VIGIL_SEARCH")]
    search: Option<String>,

    /// Config profile to use
    #[arg(short = 'p', long, env = "VIGIL_PROFILE")]
    profile: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long, env = "VIGIL_INSECURE")]
    insecure: bool,

    /// Ring the terminal bell when a live alert arrives
    #[arg(long, env = "VIGIL_BELL")]
    bell: bool,

    /// Log file path (defaults to /tmp/vigil-tui.log)
    #[arg(long, default_value = "/tmp/vigil-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Nothing may log to stdout/stderr while the
/// terminal is in raw mode. Returns a guard that must be held for the
/// lifetime of the application so logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("vigil_tui={log_level},vigil_core={log_level}"))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("vigil-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the monitor configuration. Priority: CLI flags > config profile.
fn build_monitor_config(cli: &Cli) -> Result<MonitorConfig> {
    let cfg = vigil_config::load_config_or_default();
    let profile_name = cli
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if cli.profile.is_some() => {
            return Err(eyre!("profile '{profile_name}' not found in configuration"));
        }
        None => Profile::default(),
    };

    if let Some(server) = &cli.server {
        profile.server.clone_from(server);
    }
    if let Some(search) = &cli.search {
        profile.search = Some(search.clone());
    }
    if cli.insecure {
        profile.insecure = Some(true);
    }

    vigil_config::profile_to_monitor_config(&profile, &cfg.defaults).map_err(|e| {
        eyre!(
            "{e}\nPass --server <URL>, set VIGIL_SERVER, or add a profile to {}",
            vigil_config::config_path().display()
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file; hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    let config = build_monitor_config(&cli)?;
    info!(
        server = %config.server,
        search = %config.search,
        "starting vigil-tui"
    );

    let monitor = Monitor::new(config)?;
    let mut app = App::new(monitor).with_bell(cli.bell);
    app.run().await?;

    Ok(())
}
