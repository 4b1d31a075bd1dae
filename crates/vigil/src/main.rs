mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vigil_core::{Monitor, MonitorConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "vigil", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let mut monitor_config = build_monitor_config(&cli.global)?;
            if let Command::Watch(ref args) = cmd {
                monitor_config.load_history = !args.no_history;
            }
            let monitor = Monitor::new(monitor_config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &monitor, &cli.global).await
        }
    }
}

/// Build a `MonitorConfig` from the config file, profile, and CLI overrides.
fn build_monitor_config(global: &cli::GlobalOpts) -> Result<MonitorConfig, CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return config::resolve_profile(profile, &cfg, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: config::profile_names(&cfg),
        });
    }

    // No profile found -- build from CLI flags / env vars alone
    if global.server.is_none() {
        return Err(CliError::NoConfig {
            path: config::config_path().display().to_string(),
        });
    }
    config::resolve_profile(&config::Profile::default(), &cfg, global)
}
