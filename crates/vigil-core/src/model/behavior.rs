// ── Behavior domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// One of the seven behavior categories the backend detects.
///
/// The discriminant is the stable digit the backend and the charts use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumCount,
)]
#[repr(u8)]
pub enum BehaviorCode {
    FocusedWork = 1,
    Eating = 2,
    DrinkingWater = 3,
    DrinkingBeverage = 4,
    PhoneUse = 5,
    Sleeping = 6,
    Other = 7,
}

impl BehaviorCode {
    /// The six codes that have a detection keyword, in match priority order.
    pub const DETECTABLE: [Self; 6] = [
        Self::FocusedWork,
        Self::Eating,
        Self::DrinkingWater,
        Self::DrinkingBeverage,
        Self::PhoneUse,
        Self::Sleeping,
    ];

    #[allow(clippy::as_conversions)]
    pub fn digit(self) -> u8 {
        self as u8
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        Self::iter().find(|code| code.digit() == digit)
    }

    /// Zero-based position, for indexing per-code arrays.
    pub fn index(self) -> usize {
        usize::from(self.digit() - 1)
    }

    /// Substring that identifies this behavior in free text.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::FocusedWork => Some("专注工作"),
            Self::Eating => Some("吃东西"),
            Self::DrinkingWater => Some("喝水"),
            Self::DrinkingBeverage => Some("喝饮料"),
            Self::PhoneUse => Some("玩手机"),
            Self::Sleeping => Some("睡觉"),
            Self::Other => None,
        }
    }

    /// Label shown in the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Self::FocusedWork => "专注工作",
            Self::Eating => "吃东西",
            Self::DrinkingWater => "喝水",
            Self::DrinkingBeverage => "喝饮料",
            Self::PhoneUse => "玩手机",
            Self::Sleeping => "睡觉",
            Self::Other => "其他",
        }
    }

    /// Short English name for logs and machine-readable output.
    pub fn name(self) -> &'static str {
        match self {
            Self::FocusedWork => "focused_work",
            Self::Eating => "eating",
            Self::DrinkingWater => "drinking_water",
            Self::DrinkingBeverage => "drinking_beverage",
            Self::PhoneUse => "phone_use",
            Self::Sleeping => "sleeping",
            Self::Other => "other",
        }
    }

    /// Display color as `(r, g, b)`.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::FocusedWork => (0x4C, 0xAF, 0x50),
            Self::Eating => (0xFF, 0x98, 0x00),
            Self::DrinkingWater => (0x21, 0x96, 0xF3),
            Self::DrinkingBeverage => (0x9C, 0x27, 0xB0),
            Self::PhoneUse => (0xF4, 0x43, 0x36),
            Self::Sleeping => (0x60, 0x7D, 0x8B),
            Self::Other => (0x79, 0x55, 0x48),
        }
    }

    /// Find the first detectable code whose keyword occurs in `text`.
    pub fn match_keyword(text: &str) -> Option<Self> {
        Self::DETECTABLE
            .into_iter()
            .find(|code| code.keyword().is_some_and(|kw| text.contains(kw)))
    }
}

impl std::fmt::Display for BehaviorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single classified observation. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub code: BehaviorCode,
    pub observed_at: DateTime<Utc>,
}

/// Running per-code counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorCounts([u64; BehaviorCode::COUNT]);

impl BehaviorCounts {
    pub fn get(&self, code: BehaviorCode) -> u64 {
        self.0[code.index()]
    }

    pub(crate) fn increment(&mut self, code: BehaviorCode) {
        self.0[code.index()] += 1;
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Share of `code` in percent, `0.0` when nothing has been counted.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn percentage(&self, code: BehaviorCode) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.get(code) as f64 * 100.0 / total as f64
    }

    /// `(code, count)` pairs in digit order.
    pub fn iter(&self) -> impl Iterator<Item = (BehaviorCode, u64)> + '_ {
        BehaviorCode::iter().map(|code| (code, self.get(code)))
    }
}
