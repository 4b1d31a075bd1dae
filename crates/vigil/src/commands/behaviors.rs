//! Behavior analysis report command.

use std::fmt::Write as _;

use tabled::Tabled;
use vigil_core::{BehaviorReport, BehaviorTally, Monitor};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct TallyRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Behavior")]
    behavior: String,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Share")]
    share: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl TallyRow {
    fn new(tally: &BehaviorTally, counted: u64, color: bool) -> Self {
        let behavior = match tally.code() {
            Some(code) if code.label() == tally.kind => output::paint_behavior(code, color),
            _ => tally.kind.clone(),
        };
        Self {
            id: tally.id,
            behavior,
            count: tally.count,
            share: share(tally.count, counted),
            last_seen: tally.timestamp.clone(),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn share(count: u64, total: u64) -> String {
    if total == 0 {
        return "-".into();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

fn detail(report: &BehaviorReport, color: bool) -> String {
    let stats = &report.statistics;
    let mut out = String::new();
    let _ = writeln!(out, "Total behaviors:   {}", stats.total_behaviors);
    let _ = writeln!(out, "Unique behaviors:  {}", stats.unique_behaviors);
    let _ = writeln!(
        out,
        "Most frequent:     {}",
        stats.most_frequent.as_deref().unwrap_or("-")
    );
    if report.is_empty() {
        out.push_str("\nNo behavior data recorded");
        return out;
    }
    let counted = report.counted();
    let rows: Vec<TallyRow> = report
        .behaviors
        .iter()
        .map(|t| TallyRow::new(t, counted, color))
        .collect();
    out.push('\n');
    out.push_str(&output::render_table(&rows));
    out
}

pub async fn handle(monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    let report = monitor.behavior_report().await?;
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| {
            r.behaviors
                .iter()
                .map(|t| format!("{}\t{}", t.kind, t.count))
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
