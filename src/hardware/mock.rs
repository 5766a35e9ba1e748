use async_trait::async_trait;
use crate::core::CanMessage;
use crate::hardware::can_interface::{CanConfig, CanInterface, CanResult, CanStatus};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Most recent frames kept by a [`MockCanInterface`]
pub const TX_HISTORY_LIMIT: usize = 1024;

/// Virtual CAN interface for testing without hardware
///
/// The last [`TX_HISTORY_LIMIT`] transmitted frames are kept so tests can
/// inspect the broadcast; older frames are dropped, so a long dry run stays
/// bounded. Individual IDs can be made to fail to exercise error paths.
pub struct MockCanInterface {
    name: String,
    status: CanStatus,
    tx_buffer: VecDeque<CanMessage>,
    failing_ids: HashSet<u32>,
    refuse_connect: bool,
}

impl MockCanInterface {
    /// Create a new mock interface
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CanStatus::Disconnected,
            tx_buffer: VecDeque::with_capacity(TX_HISTORY_LIMIT),
            failing_ids: HashSet::new(),
            refuse_connect: false,
        }
    }

    /// Make every send of `id` fail
    #[cfg(test)]
    pub fn fail_id(&mut self, id: u32) {
        self.failing_ids.insert(id);
    }

    /// Make `connect` fail, as for a missing interface
    #[cfg(test)]
    pub fn set_refuse_connect(&mut self, refuse: bool) {
        self.refuse_connect = refuse;
    }

    /// Get all retained transmitted messages (for verification)
    #[cfg(test)]
    pub fn take_sent_messages(&mut self) -> Vec<CanMessage> {
        self.tx_buffer.drain(..).collect()
    }
}

#[async_trait]
impl CanInterface for MockCanInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> CanStatus {
        self.status
    }

    async fn connect(&mut self, config: CanConfig) -> CanResult<()> {
        if self.refuse_connect {
            return Err(format!("No such interface: {}", self.name).into());
        }
        debug!("{} up at {} bit/s", self.name, config.bitrate);
        self.status = CanStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> CanResult<()> {
        self.status = CanStatus::Disconnected;
        Ok(())
    }

    async fn send(&mut self, message: &CanMessage) -> CanResult<()> {
        if self.status != CanStatus::Connected {
            return Err("Not connected".into());
        }
        if self.failing_ids.contains(&message.id) {
            return Err(format!("Transmit of 0x{:X} rejected", message.id).into());
        }
        debug!("{} tx 0x{:03X} [{}] {}", self.name, message.id, message.len, message.hex_data());
        while self.tx_buffer.len() >= TX_HISTORY_LIMIT {
            self.tx_buffer.pop_front();
        }
        self.tx_buffer.push_back(*message);
        Ok(())
    }
}
