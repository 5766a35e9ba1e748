use async_trait::async_trait;
use crate::core::CanMessage;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Result type for CAN interface operations
pub type CanResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Configuration for a CAN interface
#[derive(Debug, Clone)]
pub struct CanConfig {
    /// Bitrate in bits per second (adapters that configure it themselves)
    pub bitrate: u32,
}

impl Default for CanConfig {
    fn default() -> Self {
        Self { bitrate: 500_000 }
    }
}

/// Status of a CAN interface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanStatus {
    /// Interface is disconnected
    Disconnected,
    /// Interface is connected and ready
    Connected,
}

/// Trait for CAN bus transmitters
///
/// Replay only ever writes to the bus:
/// - SocketCAN (Linux)
/// - USB-CAN serial adapters (SLCAN/Lawicel protocol)
/// - Virtual interfaces that record what was sent
#[async_trait]
pub trait CanInterface: Send {
    /// Get the name/identifier of this interface
    fn name(&self) -> &str;

    /// Get the current status of the interface
    fn status(&self) -> CanStatus;

    /// Connect to the CAN interface with the given configuration
    async fn connect(&mut self, config: CanConfig) -> CanResult<()>;

    /// Disconnect and release the bus handle
    async fn disconnect(&mut self) -> CanResult<()>;

    /// Send a CAN message, using its declared length
    async fn send(&mut self, message: &CanMessage) -> CanResult<()>;
}

#[async_trait]
impl<T: CanInterface + ?Sized> CanInterface for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn status(&self) -> CanStatus {
        (**self).status()
    }

    async fn connect(&mut self, config: CanConfig) -> CanResult<()> {
        (**self).connect(config).await
    }

    async fn disconnect(&mut self) -> CanResult<()> {
        (**self).disconnect().await
    }

    async fn send(&mut self, message: &CanMessage) -> CanResult<()> {
        (**self).send(message).await
    }
}

/// Type of CAN interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    /// SocketCAN (Linux)
    #[default]
    SocketCan,
    /// USB-CAN serial adapter
    Serial,
    /// Virtual/mock interface
    Virtual,
}
