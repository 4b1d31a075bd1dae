//! Screen identifier enum.

use std::fmt;

/// Identifies each primary TUI screen, navigable by number keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Live, // 1
    Analysis, // 2
    Ask,      // 3
}

impl ScreenId {
    /// All screens in tab-bar order.
    pub const ALL: [ScreenId; 3] = [Self::Live, Self::Analysis, Self::Ask];

    pub fn number(self) -> u8 {
        match self {
            Self::Live => 1,
            Self::Analysis => 2,
            Self::Ask => 3,
        }
    }

    /// Screen from a numeric key (1-3). Returns None for out-of-range.
    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        match self {
            Self::Live => Self::Analysis,
            Self::Analysis => Self::Ask,
            Self::Ask => Self::Live,
        }
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        match self {
            Self::Live => Self::Ask,
            Self::Analysis => Self::Live,
            Self::Ask => Self::Analysis,
        }
    }

    /// Short label for the tab bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Analysis => "Analysis",
            Self::Ask => "Ask",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
