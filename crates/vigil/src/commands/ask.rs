//! Search backend question command.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use vigil_core::Monitor;

use crate::cli::{AskArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AskResult {
    question: String,
    k: u32,
    answer: String,
}

/// Spinner on stderr while the search backend works. Hidden when stderr
/// is not a terminal or output is quiet.
fn spinner(quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message("Searching…");
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub async fn handle(monitor: &Monitor, args: &AskArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let question = args.question.join(" ");

    let bar = spinner(global.quiet);
    let result = monitor.ask(&question, args.top_k).await;
    bar.finish_and_clear();

    let result = AskResult {
        question: question.trim().to_owned(),
        k: args.top_k,
        answer: result?,
    };
    let out = output::render_single(
        &global.output,
        &result,
        |r| r.answer.clone(),
        |r| r.answer.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
