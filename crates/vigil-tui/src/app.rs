//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_core::{AlertOrigin, ConnectionState, DEFAULT_TOP_K, Monitor, QaAnswer, SystemStatus};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader, RENDER_RATE, TICK_RATE};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::status_indicator;

/// Notifications disappear after this long.
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    /// Action sender; components and spawned requests dispatch through it.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver; the main loop drains it.
    action_rx: mpsc::UnboundedReceiver<Action>,
    monitor: Monitor,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
    video: ConnectionState,
    alerts: ConnectionState,
    status: Option<SystemStatus>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
    bell: Bell,
    /// `alerts_pushed` of the last snapshot seen.
    alerts_pushed: u64,
}

/// Terminal bell on live alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bell {
    Off,
    Armed,
    /// A live alert arrived since the last ring.
    Pending,
}

impl App {
    pub fn new(monitor: Monitor) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        Self {
            active_screen: ScreenId::default(),
            screens: create_screens(),
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
            monitor,
            data_cancel: CancellationToken::new(),
            video: ConnectionState::default(),
            alerts: ConnectionState::default(),
            status: None,
            notification: None,
            bell: Bell::Off,
            alerts_pushed: 0,
        }
    }

    /// Ring the terminal bell whenever a live alert arrives.
    pub fn with_bell(mut self, bell: bool) -> Self {
        self.bell = if bell { Bell::Armed } else { Bell::Off };
        self
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        let monitor = self.monitor.clone();
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        let bridge = tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(monitor, tx, cancel).await;
        });

        let mut events = EventReader::new(TICK_RATE, RENDER_RATE);

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }

            if self.bell == Bell::Pending {
                self.bell = Bell::Armed;
                tui.bell()?;
            }
        }

        // Stop the bridge; it shuts the monitor down on the way out
        self.data_cancel.cancel();
        events.stop();
        let _ = bridge.await;
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        // These stay global even while a text input is being edited
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            _ => {}
        }

        let capturing = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|screen| screen.captures_input());

        if !capturing {
            match (key.modifiers, key.code) {
                (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
                (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('?')) => {
                    return Ok(Some(Action::ToggleHelp));
                }
                (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => {
                    let n = c.to_digit(10).and_then(|d| u8::try_from(d).ok());
                    if let Some(screen) = n.and_then(ScreenId::from_number) {
                        return Ok(Some(Action::SwitchScreen(screen)));
                    }
                }
                _ => {}
            }
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    /// Process a single action: update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }

                    // Refresh the report whenever the Analysis screen opens
                    if *target == ScreenId::Analysis {
                        self.action_tx.send(Action::RequestReport)?;
                    }
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Render => {}

            // The terminal backend resizes itself on the next draw
            Action::Resize(w, h) => debug!(w, h, "terminal resized"),

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, created)| created.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.broadcast(action)?;
            }

            Action::SnapshotUpdated(snapshot) => {
                self.video = snapshot.video;
                self.alerts = snapshot.alert_channel;
                if self.bell == Bell::Armed
                    && snapshot
                        .alerts_since(self.alerts_pushed)
                        .iter()
                        .any(|a| a.origin == AlertOrigin::Live)
                {
                    self.bell = Bell::Pending;
                }
                self.alerts_pushed = snapshot.alerts_pushed;
                self.broadcast(action)?;
            }

            Action::FrameReceived(_) => self.broadcast(action)?,

            Action::StatusUpdated(status) => self.status = Some(*status),

            Action::MonitorFailed(reason) => {
                self.notification = Some((
                    Notification::error(format!("监控启动失败：{reason}")),
                    Instant::now(),
                ));
            }

            Action::ResetBehaviors => match self.monitor.reset() {
                Ok(()) => {
                    self.action_tx
                        .send(Action::Notify(Notification::success("行为数据已重置")))?;
                }
                Err(e) => {
                    warn!(error = %e, "reset failed");
                    self.action_tx
                        .send(Action::Notify(Notification::error(e.to_string())))?;
                }
            },

            Action::RequestReport => {
                self.fetch_report();
                self.forward(ScreenId::Analysis, action)?;
            }

            Action::ReportLoaded(_) | Action::ReportFailed(_) => {
                self.forward(ScreenId::Analysis, action)?;
            }

            Action::Ask { id, question } => self.ask(*id, question.clone()),

            Action::Answered { .. } => self.forward(ScreenId::Ask, action)?,

            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), Instant::now()));
            }
        }
        Ok(())
    }

    /// Send a data action to every screen so inactive screens stay in sync.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn forward(&mut self, target: ScreenId, action: &Action) -> Result<()> {
        if let Some(screen) = self.screens.get_mut(&target) {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn fetch_report(&self) {
        let monitor = self.monitor.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let action = match monitor.behavior_report().await {
                Ok(report) => Action::ReportLoaded(Arc::new(report)),
                Err(e) => {
                    warn!(error = %e, "behavior report fetch failed");
                    Action::ReportFailed(e.to_string())
                }
            };
            let _ = tx.send(action);
        });
    }

    fn ask(&self, id: u64, question: String) {
        let monitor = self.monitor.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let answer = QaAnswer::from_result(monitor.ask(&question, DEFAULT_TOP_K).await);
            let _ = tx.send(Action::Answered { id, answer });
        });
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [tab bar] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        // Overlays on top (last = topmost)
        if let Some((ref notif, _)) = self.notification {
            Self::render_notification(frame, area, notif);
        }
        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    /// Channel indicators, clock, synthetic load values and key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(" ")];
        for (label, state) in [("视频", self.video), ("预警", self.alerts)] {
            spans.push(status_indicator::connection_span(state));
            spans.push(Span::styled(
                format!(" {label} {state}  "),
                Style::default().fg(theme::connection_color(state)),
            ));
        }

        if let Some(status) = &self.status {
            spans.push(Span::styled("│ ", theme::key_hint()));
            spans.push(Span::styled(
                status.clock_text(),
                Style::default().fg(theme::DIM_WHITE),
            ));
            spans.push(Span::styled(
                format!(
                    "  内存 {}%  网络 {:.1} MB/s (模拟) ",
                    status.memory_pct, status.network_mbps
                ),
                theme::key_hint(),
            ));
        }

        spans.push(Span::styled("│ ? help  q quit", theme::key_hint()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Render the help overlay centered on screen.
    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 56u16.min(area.width.saturating_sub(4));
        let help_height = 20u16.min(area.height.saturating_sub(4));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let section = |title: &'static str| {
            [
                Line::from(Span::styled(title, Style::default().fg(theme::NEON_CYAN))),
                Line::from(Span::styled("  ──────", theme::key_hint())),
            ]
        };
        let entry = |keys: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(keys, theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };

        let mut help_text = vec![Line::from("")];
        help_text.extend(section("  Global"));
        help_text.push(entry("  1-3         ", "Jump to screen"));
        help_text.push(entry("  Tab/S-Tab   ", "Next / previous screen"));
        help_text.push(entry("  ?           ", "This help"));
        help_text.push(entry("  q  Ctrl+c   ", "Quit"));
        help_text.push(Line::from(""));
        help_text.extend(section("  Live"));
        help_text.push(entry("  R           ", "Reset behavior data"));
        help_text.push(Line::from(""));
        help_text.extend(section("  Analysis"));
        help_text.push(entry("  r           ", "Reload report"));
        help_text.push(Line::from(""));
        help_text.extend(section("  Ask"));
        help_text.push(entry("  Enter       ", "Send question"));
        help_text.push(entry("  Esc  i      ", "Leave / resume typing"));
        help_text.push(Line::from(""));
        help_text.push(Line::from(Span::styled(
            "                     Esc or ? to close",
            theme::key_hint(),
        )));

        frame.render_widget(Paragraph::new(help_text), inner);
    }

    /// Render a notification toast in the bottom-right corner.
    fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
        let message = Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE));
        let msg_width = u16::try_from(message.width()).unwrap_or(u16::MAX);
        let width = msg_width
            .saturating_add(6)
            .clamp(20, 60)
            .min(area.width.saturating_sub(1));
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 2); // above status bar
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
            NotificationLevel::Error => (theme::ERROR_RED, "✗"),
            NotificationLevel::Info => (theme::NEON_CYAN, "·"),
        };

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            toast_area,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            message,
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}
