//! Analysis screen: backend behavior report with statistics, a tally
//! table and relative bars.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table};

use vigil_core::{BehaviorReport, BehaviorTally};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::bars;

const LABEL_WIDTH: usize = 10;

pub struct AnalysisScreen {
    focused: bool,
    report: Option<Arc<BehaviorReport>>,
    loading: bool,
    error: Option<String>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl AnalysisScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            report: None,
            loading: false,
            error: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    fn block(&self, title: &'static str) -> Block<'static> {
        Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            })
    }

    fn render_summary(&self, frame: &mut Frame, area: Rect) {
        let block = self.block(" 行为分析 ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(inner);

        if let Some(report) = &self.report {
            let stats = &report.statistics;
            let value = Style::default()
                .fg(theme::NEON_CYAN)
                .add_modifier(Modifier::BOLD);
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("  总行为次数 ", theme::key_hint()),
                    Span::styled(stats.total_behaviors.to_string(), value),
                    Span::styled("    行为种类 ", theme::key_hint()),
                    Span::styled(stats.unique_behaviors.to_string(), value),
                    Span::styled("    最常见 ", theme::key_hint()),
                    Span::styled(stats.most_frequent.as_deref().unwrap_or("-").to_owned(), value),
                ])),
                rows[0],
            );
        }

        if self.loading {
            let throbber = throbber_widgets_tui::Throbber::default()
                .label("  正在加载行为数据…")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, rows[1], &mut self.throbber_state.clone());
        } else if let Some(err) = &self.error {
            frame.render_widget(
                Paragraph::new(format!("  加载失败：{err}"))
                    .style(Style::default().fg(theme::ERROR_RED)),
                rows[1],
            );
        } else if self.report.is_none() {
            frame.render_widget(
                Paragraph::new("  按 r 加载行为分析").style(theme::placeholder()),
                rows[1],
            );
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, report: &BehaviorReport) {
        let header = Row::new(vec![
            Cell::from("ID").style(theme::table_header()),
            Cell::from("行为").style(theme::table_header()),
            Cell::from("次数").style(theme::table_header()),
            Cell::from("占比").style(theme::table_header()),
            Cell::from("最后出现").style(theme::table_header()),
        ]);

        let counted = report.counted();
        let rows: Vec<Row> = report
            .behaviors
            .iter()
            .map(|tally| {
                let color = tally
                    .code()
                    .map_or(theme::DIM_WHITE, theme::behavior_color);
                Row::new(vec![
                    Cell::from(tally.id.to_string()),
                    Cell::from(tally.kind.clone()).style(Style::default().fg(color)),
                    Cell::from(tally.count.to_string()),
                    Cell::from(share(tally, counted)),
                    Cell::from(tally.timestamp.clone()),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Min(19),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(self.block(" 行为统计 "));
        frame.render_widget(table, area);
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn render_bars(&self, frame: &mut Frame, area: Rect, report: &BehaviorReport) {
        let block = self.block(" 频次 ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let max = report.behaviors.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        // 2 indent + label + 1 gap + 6 suffix
        let budget = usize::from(inner.width).saturating_sub(LABEL_WIDTH + 9);
        let lines: Vec<Line> = report
            .behaviors
            .iter()
            .take(usize::from(inner.height))
            .map(|tally| {
                bars::bar_line(
                    &tally.kind,
                    LABEL_WIDTH,
                    tally.count as f64 / max as f64,
                    budget,
                    tally.code().map_or(theme::DIM_WHITE, theme::behavior_color),
                    format!(" {:>5}", tally.count),
                )
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Share of the report rows, `-` when nothing was counted.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn share(tally: &BehaviorTally, counted: u64) -> String {
    if counted == 0 {
        return "-".into();
    }
    format!("{:.1}%", tally.count as f64 * 100.0 / counted as f64)
}

impl Component for AnalysisScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('r') if !self.loading => Ok(Some(Action::RequestReport)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RequestReport => {
                self.loading = true;
                self.error = None;
            }
            Action::ReportLoaded(report) => {
                self.report = Some(Arc::clone(report));
                self.loading = false;
            }
            Action::ReportFailed(err) => {
                self.error = Some(err.clone());
                self.loading = false;
            }
            Action::Tick if self.loading => self.throbber_state.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).split(area);
        self.render_summary(frame, layout[0]);

        let Some(report) = &self.report else {
            return;
        };
        if report.is_empty() {
            let block = self.block(" 行为统计 ");
            let inner = block.inner(layout[1]);
            frame.render_widget(block, layout[1]);
            frame.render_widget(
                Paragraph::new("  暂无行为数据").style(theme::placeholder()),
                inner,
            );
            return;
        }

        let body =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(layout[1]);
        self.render_table(frame, body[0], report);
        self.render_bars(frame, body[1], report);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
