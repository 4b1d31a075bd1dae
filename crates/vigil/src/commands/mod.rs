//! Command dispatch: bridges CLI args -> monitor calls -> output formatting.

pub mod alerts;
pub mod ask;
pub mod behaviors;
pub mod watch;

use vigil_core::Monitor;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    monitor: &Monitor,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Alerts(args) => alerts::handle(monitor, &args, global).await,
        Command::Behaviors => behaviors::handle(monitor, global).await,
        Command::Ask(args) => ask::handle(monitor, &args, global).await,
        Command::Watch(args) => watch::handle(monitor, &args, global).await,
        // Completions never reach a monitor
        Command::Completions(_) => Ok(()),
    }
}
