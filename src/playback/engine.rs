use crate::core::RecordStore;
use crate::encode::{EncodeError, FrameEncoder};
use crate::hardware::CanInterface;
use crate::playback::{PlaybackConfig, PlaybackState, PlaybackStats, TickSummary};
use chrono::Utc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Cyclic broadcaster of a loaded datalog
///
/// Each tick encodes the current sample and sends every frame before the
/// next tick starts. After the last row the index wraps to 1, so the
/// sentinel at 0 is never replayed once data exists.
pub struct PlaybackEngine<'a, I: CanInterface> {
    encoder: FrameEncoder<'a>,
    rows: usize,
    transport: I,
    config: PlaybackConfig,
    state: PlaybackState,
    current_position: usize,
    stats: PlaybackStats,
}

impl<'a, I: CanInterface> PlaybackEngine<'a, I> {
    pub fn new(store: &'a RecordStore, transport: I, config: PlaybackConfig) -> Self {
        let rows = store.rows();
        Self {
            encoder: FrameEncoder::new(store, config.gps),
            rows,
            transport,
            config,
            state: PlaybackState::Idle,
            current_position: Self::first_position(rows),
            stats: PlaybackStats::default(),
        }
    }

    /// First real record, or the sentinel for an empty datalog
    fn first_position(rows: usize) -> usize {
        if rows == 0 {
            0
        } else {
            1
        }
    }

    /// Sample index the next tick will broadcast
    pub fn position(&self) -> usize {
        self.current_position
    }

    #[cfg(test)]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    #[cfg(test)]
    pub fn transport_mut(&mut self) -> &mut I {
        &mut self.transport
    }

    /// Give the transport back, e.g. to disconnect it on shutdown
    pub fn into_transport(self) -> I {
        self.transport
    }

    /// Time between ticks, never shorter than 1ns
    pub fn interval(&self) -> Duration {
        (Duration::from_secs(1) / self.config.hz.max(1)).max(Duration::from_nanos(1))
    }

    /// Broadcast the current sample and advance
    pub async fn tick(&mut self) -> Result<TickSummary, EncodeError> {
        if self.state == PlaybackState::Idle {
            self.state = PlaybackState::Playing;
            self.stats.started_at = Some(Utc::now());
            info!(
                "Transmitting {} rows to {} at {} Hz, {} frames per tick",
                self.rows,
                self.transport.name(),
                self.config.hz,
                self.encoder.frame_count()
            );
        }

        let index = self.current_position;
        let frames = self.encoder.encode(index)?;

        let mut summary = TickSummary {
            index,
            sent: 0,
            failed: 0,
        };
        for frame in &frames {
            match self.transport.send(frame).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    error!(index, id = frame.id, "Failed to send frame: {}", e);
                    summary.failed += 1;
                }
            }
        }

        self.stats.ticks += 1;
        self.stats.frames_sent += summary.sent as u64;
        self.stats.send_errors += summary.failed as u64;
        self.advance();

        Ok(summary)
    }

    fn advance(&mut self) {
        if self.rows == 0 {
            return;
        }
        if self.current_position >= self.rows {
            self.current_position = 1;
            self.stats.cycles += 1;
            debug!(
                cycles = self.stats.cycles,
                frames_sent = self.stats.frames_sent,
                send_errors = self.stats.send_errors,
                "Datalog cycle complete, restarting"
            );
        } else {
            self.current_position += 1;
        }
    }

    /// Tick forever at the configured rate
    ///
    /// Late ticks are skipped rather than bunched up. Only returns on an
    /// encoding error, which a store-backed position cannot produce.
    pub async fn run(&mut self) -> Result<(), EncodeError> {
        let mut ticker = tokio::time::interval(self.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let summary = self.tick().await?;
            if summary.failed > 0 {
                debug!(
                    index = summary.index,
                    sent = summary.sent,
                    failed = summary.failed,
                    "Tick finished with send errors"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::TelemetryRow;
    use crate::core::EcuVariant;
    use crate::encode::frames::{ENGINE_FRAME_ID, THERMAL_FRAME_ID};
    use crate::hardware::{CanConfig, MockCanInterface};

    fn store_with_rpms(rpms: &[u16]) -> RecordStore {
        let mut store = RecordStore::new(EcuVariant::KPro);
        for &rpm in rpms {
            let mut row = TelemetryRow::sentinel(EcuVariant::KPro);
            row.engine.rpm = rpm;
            store.push(row).unwrap();
        }
        store
    }

    async fn connected_mock() -> MockCanInterface {
        let mut iface = MockCanInterface::new("mock0");
        iface.connect(CanConfig::default()).await.unwrap();
        iface
    }

    fn rpm_of(frame: &crate::core::CanMessage) -> u16 {
        u16::from_be_bytes([frame.data[0], frame.data[1]])
    }

    #[tokio::test]
    async fn test_index_wraps_to_first_row() {
        let store = store_with_rpms(&[1000, 2000, 3000]);
        let mut engine = PlaybackEngine::new(&store, connected_mock().await, PlaybackConfig::default());
        assert_eq!(engine.state(), PlaybackState::Idle);
        assert_eq!(engine.position(), 1);

        let mut broadcast = Vec::new();
        for _ in 0..7 {
            broadcast.push(engine.tick().await.unwrap().index);
        }
        assert_eq!(broadcast, vec![1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(engine.state(), PlaybackState::Playing);
        assert_eq!(engine.stats().cycles, 2);
    }

    #[tokio::test]
    async fn test_position_returns_to_one_after_all_rows() {
        let store = store_with_rpms(&[1, 2, 3, 4, 5]);
        let mut engine = PlaybackEngine::new(&store, connected_mock().await, PlaybackConfig::default());
        for _ in 0..store.rows() {
            engine.tick().await.unwrap();
            assert_ne!(engine.position(), 0);
        }
        assert_eq!(engine.position(), 1);
    }

    #[tokio::test]
    async fn test_frames_sent_in_catalogue_order() {
        let store = store_with_rpms(&[5000, 6000]);
        let config = PlaybackConfig { hz: 10, gps: false };
        let mut engine = PlaybackEngine::new(&store, connected_mock().await, config);

        let summary = engine.tick().await.unwrap();
        assert_eq!(summary, TickSummary { index: 1, sent: 10, failed: 0 });
        engine.tick().await.unwrap();

        let sent = engine.transport_mut().take_sent_messages();
        let ids: Vec<u32> = sent.iter().map(|f| f.id).collect();
        assert_eq!(ids[..10], [660, 661, 662, 663, 664, 665, 666, 667, 668, 669]);
        assert_eq!(ids[10..], ids[..10]);
        assert_eq!(rpm_of(&sent[0]), 5000);
        assert_eq!(rpm_of(&sent[10]), 6000);
    }

    #[tokio::test]
    async fn test_send_failure_does_not_skip_other_frames() {
        let store = store_with_rpms(&[5000]);
        let mut iface = connected_mock().await;
        iface.fail_id(THERMAL_FRAME_ID);
        let mut engine = PlaybackEngine::new(&store, iface, PlaybackConfig::default());

        let summary = engine.tick().await.unwrap();
        assert_eq!(summary.sent, 10);
        assert_eq!(summary.failed, 1);

        // Next tick proceeds normally
        let summary = engine.tick().await.unwrap();
        assert_eq!(summary.index, 1);
        assert_eq!(summary.failed, 1);

        let sent = engine.transport_mut().take_sent_messages();
        assert_eq!(sent.len(), 20);
        assert!(sent.iter().all(|f| f.id != THERMAL_FRAME_ID));
        assert_eq!(engine.stats().send_errors, 2);
        assert_eq!(engine.stats().frames_sent, 20);
    }

    #[tokio::test]
    async fn test_empty_datalog_repeats_sentinel() {
        let store = store_with_rpms(&[]);
        let mut engine = PlaybackEngine::new(&store, connected_mock().await, PlaybackConfig::default());
        for _ in 0..3 {
            assert_eq!(engine.tick().await.unwrap().index, 0);
        }
        let sent = engine.into_transport().take_sent_messages();
        assert!(sent.iter().filter(|f| f.id == ENGINE_FRAME_ID).all(|f| rpm_of(f) == 0));
    }

    #[tokio::test]
    async fn test_interval_from_frequency() {
        let store = store_with_rpms(&[1]);
        let engine = PlaybackEngine::new(&store, connected_mock().await, PlaybackConfig { hz: 10, gps: true });
        assert_eq!(engine.interval(), Duration::from_millis(100));

        let engine = PlaybackEngine::new(&store, connected_mock().await, PlaybackConfig { hz: 50, gps: true });
        assert_eq!(engine.interval(), Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_interval_never_reaches_zero() {
        let store = store_with_rpms(&[1]);
        let config = PlaybackConfig { hz: 2_000_000_000, gps: true };
        let engine = PlaybackEngine::new(&store, connected_mock().await, config);
        assert_eq!(engine.interval(), Duration::from_nanos(1));

        let config = PlaybackConfig { hz: u32::MAX, gps: true };
        let engine = PlaybackEngine::new(&store, connected_mock().await, config);
        assert_eq!(engine.interval(), Duration::from_nanos(1));

        // tokio::time::interval panics on a zero period
        let _ticker = tokio::time::interval(engine.interval());
    }

    #[tokio::test]
    async fn test_run_ticks_until_cancelled() {
        let store = store_with_rpms(&[1, 2]);
        let config = PlaybackConfig { hz: 200, gps: true };
        let mut engine = PlaybackEngine::new(&store, connected_mock().await, config);

        let result = tokio::time::timeout(Duration::from_millis(100), engine.run()).await;
        assert!(result.is_err(), "run only ends when cancelled");
        assert!(engine.stats().ticks >= 1);
        assert!(engine.stats().started_at.is_some());
        assert_eq!(engine.stats().send_errors, 0);
    }
}
