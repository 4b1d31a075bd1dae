//! Horizontal bar rows for distributions and tallies.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::theme;

/// Pad `text` with spaces to `width` terminal cells. Wide glyphs count
/// as two cells.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let used = Span::raw(text).width();
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}

/// Bar length in cells for `fraction` of `budget`. Non-zero fractions
/// always get at least one cell.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn bar_width(fraction: f64, budget: usize) -> usize {
    if fraction <= 0.0 || budget == 0 {
        return 0;
    }
    let cells = (fraction.min(1.0) * budget as f64).round() as usize;
    cells.clamp(1, budget)
}

/// One labelled bar on a dim track: `  label ████░░░░ suffix`.
pub fn bar_line(
    label: &str,
    label_width: usize,
    fraction: f64,
    budget: usize,
    color: Color,
    suffix: String,
) -> Line<'static> {
    let width = bar_width(fraction, budget);
    Line::from(vec![
        Span::styled(
            format!("  {} ", pad_to_width(label, label_width)),
            Style::default().fg(theme::DIM_WHITE),
        ),
        Span::styled("█".repeat(width), Style::default().fg(color)),
        Span::styled(
            "░".repeat(budget - width),
            Style::default().fg(theme::BORDER_GRAY),
        ),
        Span::styled(suffix, Style::default().fg(theme::DIM_WHITE)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_labels_are_padded_by_cells() {
        assert_eq!(pad_to_width("喝水", 6), "喝水  ");
        assert_eq!(pad_to_width("other", 3), "other");
    }

    #[test]
    fn bar_width_scales_and_clamps() {
        assert_eq!(bar_width(0.0, 20), 0);
        assert_eq!(bar_width(0.5, 20), 10);
        assert_eq!(bar_width(0.001, 20), 1);
        assert_eq!(bar_width(3.0, 20), 20);
        assert_eq!(bar_width(0.5, 0), 0);
    }

    #[test]
    fn bar_line_fills_the_budget() {
        let line = bar_line("睡觉", 8, 0.25, 8, theme::CORAL, " 1".into());
        assert_eq!(line.width(), 2 + 8 + 1 + 8 + 2);
    }
}
