// ── Video frames ──

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Window over which the frame rate is estimated.
const FPS_WINDOW: Duration = Duration::from_secs(2);

/// Image encoding sniffed from the first bytes of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Jpeg,
    Png,
    Unknown,
}

impl FrameFormat {
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Self::Png
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Unknown => "unknown",
        }
    }
}

/// The most recent binary frame from the video channel.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 1-based sequence number since the monitor started.
    pub seq: u64,
    pub data: Bytes,
    pub format: FrameFormat,
    pub received_at: DateTime<Utc>,
    /// Rolling frames-per-second estimate at the time of receipt.
    pub fps: f64,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Assigns sequence numbers and tracks the frame rate.
#[derive(Debug, Default)]
pub(crate) struct FrameMeter {
    seq: u64,
    recent: VecDeque<Instant>,
}

impl FrameMeter {
    pub(crate) fn observe(&mut self, data: Bytes, now: Instant) -> Frame {
        self.seq += 1;
        self.recent.push_back(now);
        while self
            .recent
            .front()
            .is_some_and(|t| now.duration_since(*t) > FPS_WINDOW)
        {
            self.recent.pop_front();
        }

        Frame {
            seq: self.seq,
            format: FrameFormat::sniff(&data),
            data,
            received_at: Utc::now(),
            fps: self.fps(),
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    fn fps(&self) -> f64 {
        match (self.recent.front(), self.recent.back()) {
            (Some(first), Some(last)) if self.recent.len() > 1 => {
                let span = last.duration_since(*first).as_secs_f64();
                if span > 0.0 {
                    (self.recent.len() - 1) as f64 / span
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(FrameFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), FrameFormat::Jpeg);
        assert_eq!(FrameFormat::sniff(b"\x89PNG\r\n\x1a\nrest"), FrameFormat::Png);
        assert_eq!(FrameFormat::sniff(b"GIF89a"), FrameFormat::Unknown);
    }

    #[test]
    fn meter_numbers_frames_and_estimates_rate() {
        let mut meter = FrameMeter::default();
        let start = Instant::now();

        let first = meter.observe(Bytes::from_static(b"a"), start);
        assert_eq!(first.seq, 1);
        assert!(first.fps.abs() < f64::EPSILON);

        let mut last = first;
        for i in 1..=10 {
            last = meter.observe(Bytes::from_static(b"a"), start + Duration::from_millis(100 * i));
        }
        assert_eq!(last.seq, 11);
        assert!((last.fps - 10.0).abs() < 0.01, "fps was {}", last.fps);
    }

    #[test]
    fn meter_forgets_frames_outside_window() {
        let mut meter = FrameMeter::default();
        let start = Instant::now();
        meter.observe(Bytes::new(), start);
        meter.observe(Bytes::new(), start + Duration::from_millis(500));
        let late = meter.observe(Bytes::new(), start + Duration::from_secs(10));
        assert!(late.fps.abs() < f64::EPSILON);
    }
}
