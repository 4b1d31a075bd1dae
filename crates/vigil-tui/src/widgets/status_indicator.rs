//! Channel status indicator: ●/◐/○ with color mapping.

use ratatui::style::Style;
use ratatui::text::Span;
use vigil_core::ConnectionState;

use crate::theme;

/// Returns a styled `Span` with the status dot for a channel state.
pub fn connection_span(state: ConnectionState) -> Span<'static> {
    Span::styled(
        connection_char(state),
        Style::default().fg(theme::connection_color(state)),
    )
}

/// Returns the status dot character without styling.
pub fn connection_char(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Open => "●",
        ConnectionState::Connecting => "◐",
        ConnectionState::Closed => "○",
    }
}
