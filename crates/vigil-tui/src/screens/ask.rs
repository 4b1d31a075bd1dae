//! Ask screen: free-text questions against the search backend.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use vigil_core::{QaAnswer, QaLog};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

const PROMPT: &str = " > ";

pub struct AskScreen {
    focused: bool,
    input: String,
    /// Printable keys go to the input while set.
    editing: bool,
    log: QaLog,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl AskScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            input: String::new(),
            editing: true,
            log: QaLog::new(),
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    /// Record the typed question and hand it off. Blank input is dropped
    /// without a request.
    fn submit(&mut self) -> Option<Action> {
        let id = self.log.begin(&self.input)?;
        let question = self.input.trim().to_owned();
        self.input.clear();
        Some(Action::Ask { id, question })
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" 提问 ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.editing {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let line = if self.input.is_empty() && !self.editing {
            Line::from(vec![
                Span::styled(PROMPT, theme::key_hint()),
                Span::styled("按 i 输入问题", theme::placeholder()),
            ])
        } else {
            Line::from(vec![
                Span::styled(PROMPT, theme::key_hint_key()),
                Span::styled(self.input.clone(), Style::default().fg(theme::DIM_WHITE)),
            ])
        };
        let typed = line.width();
        frame.render_widget(Paragraph::new(line), inner);

        if self.editing && self.focused {
            let offset = u16::try_from(typed).unwrap_or(u16::MAX);
            let x = inner
                .x
                .saturating_add(offset)
                .min(inner.right().saturating_sub(1));
            frame.set_cursor_position(Position::new(x, inner.y));
        }
    }

    fn render_log(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" 问答记录 ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let progress_rows = u16::from(self.log.has_pending());
        let layout =
            Layout::vertical([Constraint::Length(progress_rows), Constraint::Min(0)]).split(inner);

        if self.log.has_pending() {
            let throbber = throbber_widgets_tui::Throbber::default()
                .label("  正在查询…")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, layout[0], &mut self.throbber_state.clone());
        }

        if self.log.is_empty() {
            frame.render_widget(
                Paragraph::new("  输入关于监控记录的问题，按 Enter 发送").style(theme::placeholder()),
                layout[1],
            );
            return;
        }

        let mut lines = Vec::new();
        for exchange in self.log.entries() {
            lines.push(Line::from(vec![
                Span::styled("  问：", theme::key_hint()),
                Span::styled(
                    exchange.question.clone(),
                    Style::default()
                        .fg(theme::NEON_CYAN)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            let answer = match &exchange.answer {
                QaAnswer::Pending => Span::styled("…", theme::placeholder()),
                QaAnswer::Answer(text) => {
                    Span::styled(text.clone(), Style::default().fg(theme::DIM_WHITE))
                }
                QaAnswer::Error(text) => {
                    Span::styled(text.clone(), Style::default().fg(theme::ERROR_RED))
                }
            };
            lines.push(Line::from(vec![Span::styled("  答：", theme::key_hint()), answer]));
            lines.push(Line::default());
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), layout[1]);
    }
}

impl Component for AskScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.editing {
            if matches!(key.code, KeyCode::Char('i' | '/') | KeyCode::Enter) {
                self.editing = true;
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => self.editing = false,
            KeyCode::Enter => return Ok(self.submit()),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Answered { id, answer } => self.log.resolve(*id, answer.clone()),
            Action::Tick if self.log.has_pending() => self.throbber_state.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);
        self.render_input(frame, layout[0]);
        self.render_log(frame, layout[1]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn captures_input(&self) -> bool {
        self.editing
    }
}
