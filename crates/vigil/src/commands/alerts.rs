//! Alert history command.

use tabled::Tabled;
use vigil_core::{Alert, Monitor};

use crate::cli::{AlertsArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Content")]
    content: String,
    #[tabled(rename = "Details")]
    details: String,
    #[tabled(rename = "Image")]
    image: String,
}

impl AlertRow {
    fn new(alert: &Alert, color: bool) -> Self {
        let severity = alert.severity();
        Self {
            time: alert.display_time(),
            severity: output::paint_severity(severity, &format!("{severity:?}"), color),
            content: alert.content.clone(),
            details: alert.details_preview().unwrap_or_default(),
            image: if alert.has_image() { "yes" } else { "" }.into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &Monitor,
    args: &AlertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut alerts = monitor.list_alerts().await?;
    if let Some(limit) = args.limit {
        alerts.truncate(limit);
    }
    tracing::debug!(count = alerts.len(), "fetched alert history");

    if alerts.is_empty() && matches!(global.output, OutputFormat::Table) {
        if !global.quiet {
            eprintln!("No alerts stored");
        }
        return Ok(());
    }

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &alerts,
        |a| AlertRow::new(a, color),
        |a| format!("{}\t{}", a.display_time(), a.content),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
