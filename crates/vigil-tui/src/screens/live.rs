//! Live screen: video status, behavior timeline, distribution and alerts.

use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Paragraph};

use vigil_core::store::HISTORY_CAPACITY;
use vigil_core::{Alert, AlertOrigin, BehaviorCode, DashboardSnapshot, Severity};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{bars, status_indicator};

/// Shown in the timeline and distribution panels while no behavior has
/// been recorded.
pub const NO_BEHAVIOR_DATA: &str = "  暂无行为数据";
/// Shown in the alert panel while the feed is empty.
pub const NO_ALERTS: &str = "  暂无预警信息";

const LABEL_WIDTH: usize = 8;

pub struct LiveScreen {
    focused: bool,
    snapshot: Arc<DashboardSnapshot>,
    frame: Option<Arc<vigil_core::Frame>>,
    /// Render clock for frame age and the clip pulse; advanced on Tick.
    now: DateTime<Utc>,
}

impl LiveScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            snapshot: Arc::new(DashboardSnapshot::default()),
            frame: None,
            now: Utc::now(),
        }
    }

    fn panel(&self, title: String) -> Block<'static> {
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

    fn render_video(&self, frame: &mut Frame, area: Rect) {
        let pulsing = self
            .snapshot
            .clip
            .as_ref()
            .is_some_and(|clip| clip.is_pulsing(self.now));
        let mut block = self.panel(" 实时视频 ".into());
        if pulsing {
            block = block.border_style(Style::default().fg(theme::CORAL));
        }
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::from(vec![
            Span::raw("  "),
            status_indicator::connection_span(self.snapshot.video),
            Span::styled(
                format!(" 视频流 {}", self.snapshot.video),
                Style::default().fg(theme::DIM_WHITE),
            ),
        ])];

        match &self.frame {
            Some(f) => {
                let size = ByteSize::b(u64::try_from(f.len()).unwrap_or(u64::MAX));
                lines.push(Line::from(Span::styled(
                    format!(
                        "  帧 #{}  {size}  {}  {:.1} fps",
                        f.seq,
                        f.format.as_str(),
                        f.fps
                    ),
                    Style::default().fg(theme::NEON_CYAN),
                )));
                let age = self
                    .now
                    .signed_duration_since(f.received_at)
                    .to_std()
                    .unwrap_or_default();
                lines.push(Line::from(Span::styled(
                    format!(
                        "  {} 前接收",
                        humantime::format_duration(Duration::from_secs(age.as_secs()))
                    ),
                    theme::placeholder(),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                "  等待视频帧…",
                theme::placeholder(),
            ))),
        }

        if let Some(clip) = &self.snapshot.clip {
            let style = if pulsing {
                Style::default()
                    .fg(theme::CORAL)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::DIM_WHITE)
            };
            lines.push(Line::from(vec![
                Span::styled("  预警片段 ", style),
                Span::styled(clip.url.to_string(), style),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_current(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" 当前行为 ".into());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let current = match self.snapshot.current {
            Some(code) => Span::styled(
                format!("  {}", code.label()),
                Style::default()
                    .fg(theme::behavior_color(code))
                    .add_modifier(Modifier::BOLD),
            ),
            None => Span::styled("  -", theme::placeholder()),
        };
        let counters = Line::from(vec![
            Span::styled("  累计 ", theme::key_hint()),
            Span::styled(
                self.snapshot.counts.total().to_string(),
                Style::default().fg(theme::NEON_CYAN),
            ),
            Span::styled("  窗口 ", theme::key_hint()),
            Span::styled(
                format!("{}/{HISTORY_CAPACITY}", self.snapshot.history.len()),
                Style::default().fg(theme::NEON_CYAN),
            ),
        ]);
        frame.render_widget(Paragraph::new(vec![Line::from(current), counters]), inner);
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn render_timeline(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" 行为时间线 ".into());
        let history = &self.snapshot.history;

        if history.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new(NO_BEHAVIOR_DATA).style(theme::placeholder()),
                inner,
            );
            return;
        }

        let points: Vec<(f64, f64)> = history
            .iter()
            .enumerate()
            .map(|(i, e)| (i as f64, f64::from(e.code.digit())))
            .collect();
        let per_code: Vec<(BehaviorCode, Vec<(f64, f64)>)> = self
            .snapshot
            .counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(code, _)| {
                let pts = history
                    .iter()
                    .zip(&points)
                    .filter(|(e, _)| e.code == code)
                    .map(|(_, p)| *p)
                    .collect();
                (code, pts)
            })
            .collect();

        let mut datasets = vec![
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(theme::BORDER_GRAY))
                .data(&points),
        ];
        datasets.extend(per_code.iter().map(|(code, pts)| {
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(theme::behavior_color(*code)))
                .data(pts)
        }));

        let time_label = |e: &vigil_core::BehaviorEvent| {
            e.observed_at
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string()
        };
        let x_labels: Vec<Span> = [history.first(), history.last()]
            .into_iter()
            .flatten()
            .map(|e| Span::styled(time_label(e), theme::key_hint()))
            .collect();
        let y_labels: Vec<Span> = self
            .snapshot
            .counts
            .iter()
            .map(|(code, _)| {
                Span::styled(code.label(), Style::default().fg(theme::behavior_color(code)))
            })
            .collect();

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([0.0, (HISTORY_CAPACITY - 1) as f64])
                    .labels(x_labels)
                    .style(Style::default().fg(theme::BORDER_GRAY)),
            )
            .y_axis(
                Axis::default()
                    .bounds([1.0, 7.0])
                    .labels(y_labels)
                    .style(Style::default().fg(theme::BORDER_GRAY)),
            );

        frame.render_widget(chart, area);
    }

    fn render_distribution(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(" 行为分布 ".into());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let counts = &self.snapshot.counts;
        if counts.is_empty() {
            frame.render_widget(
                Paragraph::new(NO_BEHAVIOR_DATA).style(theme::placeholder()),
                inner,
            );
            return;
        }

        // 2 indent + label + 1 gap + 12 suffix
        let budget = usize::from(inner.width).saturating_sub(LABEL_WIDTH + 15);
        let lines: Vec<Line> = counts
            .iter()
            .map(|(code, count)| {
                let pct = counts.percentage(code);
                bars::bar_line(
                    code.label(),
                    LABEL_WIDTH,
                    pct / 100.0,
                    budget,
                    theme::behavior_color(code),
                    format!(" {count:>4} {pct:>5.1}%"),
                )
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_alerts(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel(format!(" 预警信息 ({}) ", self.snapshot.alert_total));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = Vec::new();
        if let Some(reason) = &self.snapshot.alerts_error {
            lines.push(Line::from(Span::styled(
                format!("  加载历史预警失败：{reason}"),
                Style::default().fg(theme::ERROR_RED),
            )));
        }

        if self.snapshot.alerts.is_empty() {
            lines.push(Line::from(Span::styled(NO_ALERTS, theme::placeholder())));
        } else {
            lines.extend(self.snapshot.alerts.iter().flat_map(alert_lines));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn alert_lines(alert: &Alert) -> Vec<Line<'static>> {
    let severity = alert.severity();
    let mut content_style = Style::default().fg(theme::severity_color(severity));
    if severity == Severity::Important {
        content_style = content_style.add_modifier(Modifier::BOLD);
    }
    if alert.origin == AlertOrigin::Notice {
        content_style = content_style.add_modifier(Modifier::ITALIC);
    }

    let mut head = vec![
        Span::styled(format!("  {} ", alert.display_time()), theme::key_hint()),
        Span::styled(alert.content.clone(), content_style),
    ];
    if alert.has_image() {
        head.push(Span::styled(" [图片]", Style::default().fg(theme::CORAL)));
    }

    let mut lines = vec![Line::from(head)];
    if let Some(details) = alert.details_preview() {
        lines.push(Line::from(Span::styled(
            format!("    {details}"),
            Style::default().fg(theme::DIM_WHITE),
        )));
    }
    lines
}

impl Component for LiveScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('R') => Ok(Some(Action::ResetBehaviors)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SnapshotUpdated(snapshot) => {
                self.snapshot = Arc::clone(snapshot);
                self.now = Utc::now();
            }
            Action::FrameReceived(frame) => self.frame = Some(Arc::clone(frame)),
            Action::Tick => self.now = Utc::now(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let cols =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).split(area);
        let left = Layout::vertical([Constraint::Min(8), Constraint::Length(9)]).split(cols[0]);
        let right = Layout::vertical([
            Constraint::Length(7),
            Constraint::Length(4),
            Constraint::Min(4),
        ])
        .split(cols[1]);

        self.render_timeline(frame, left[0]);
        self.render_distribution(frame, left[1]);
        self.render_video(frame, right[0]);
        self.render_current(frame, right[1]);
        self.render_alerts(frame, right[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
