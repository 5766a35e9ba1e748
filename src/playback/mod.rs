pub mod engine;

pub use engine::PlaybackEngine;

use chrono::{DateTime, Utc};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    /// Before the first tick
    Idle,
    /// Broadcasting; only process shutdown leaves this state
    Playing,
}

/// Playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    pub hz: u32,  // ticks per second
    pub gps: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { hz: 10, gps: true }
    }
}

/// Running totals for a playback session
#[derive(Debug, Clone, Default)]
pub struct PlaybackStats {
    pub started_at: Option<DateTime<Utc>>,
    pub ticks: u64,
    /// Full passes over the datalog
    pub cycles: u64,
    pub frames_sent: u64,
    pub send_errors: u64,
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Sample index that was broadcast
    pub index: usize,
    pub sent: usize,
    pub failed: usize,
}
