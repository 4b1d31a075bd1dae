// ── Question/answer log ──
//
// Newest-first record of questions asked against the search backend.
// Each exchange is created when the question is sent and resolved when
// the answer (or error) comes back.

use std::collections::VecDeque;

use crate::error::CoreError;

/// Prefix of inline error answers.
pub const ERROR_PREFIX: &str = "错误：";

/// Oldest exchanges beyond this are dropped.
pub const QA_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QaAnswer {
    Pending,
    Answer(String),
    /// Already formatted with [`ERROR_PREFIX`].
    Error(String),
}

impl QaAnswer {
    pub fn from_result(result: Result<String, CoreError>) -> Self {
        match result {
            Ok(answer) => Self::Answer(answer),
            Err(e) => Self::Error(format!("{ERROR_PREFIX}{e}")),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaExchange {
    pub id: u64,
    pub question: String,
    pub answer: QaAnswer,
}

#[derive(Debug, Default)]
pub struct QaLog {
    entries: VecDeque<QaExchange>,
    next_id: u64,
}

impl QaLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a question. Returns `None` for blank input.
    pub fn begin(&mut self, question: &str) -> Option<u64> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }
        self.next_id += 1;
        self.entries.push_front(QaExchange {
            id: self.next_id,
            question: question.to_owned(),
            answer: QaAnswer::Pending,
        });
        self.entries.truncate(QA_CAPACITY);
        Some(self.next_id)
    }

    /// Attach the outcome to a pending question. Unknown ids are ignored.
    pub fn resolve(&mut self, id: u64, answer: QaAnswer) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.answer = answer;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.answer.is_pending())
    }

    /// Exchanges, newest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &QaExchange> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
