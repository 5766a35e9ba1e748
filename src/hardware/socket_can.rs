use async_trait::async_trait;
use crate::core::CanMessage;
use crate::hardware::can_interface::{CanConfig, CanInterface, CanResult, CanStatus};
use socketcan::{CanFrame, CanSocket, EmbeddedFrame, ExtendedId, Id, Socket, StandardId};
use tracing::info;

/// SocketCAN interface (Linux), e.g. `can0` or `vcan0`
pub struct SocketCanInterface {
    name: String,
    status: CanStatus,
    socket: Option<CanSocket>,
}

impl SocketCanInterface {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CanStatus::Disconnected,
            socket: None,
        }
    }

    fn to_frame(message: &CanMessage) -> Option<CanFrame> {
        let id: Id = if message.is_extended() {
            ExtendedId::new(message.id)?.into()
        } else {
            StandardId::new(message.id as u16)?.into()
        };
        CanFrame::new(id, message.payload())
    }
}

#[async_trait]
impl CanInterface for SocketCanInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> CanStatus {
        self.status
    }

    async fn connect(&mut self, _config: CanConfig) -> CanResult<()> {
        // Bitrate belongs to the kernel interface (`ip link set ... bitrate`)
        let socket = CanSocket::open(&self.name)
            .map_err(|e| format!("Cannot connect to {}: {}", self.name, e))?;
        // A full TX queue should fail the frame, not stall the tick
        socket.set_nonblocking(true)?;

        self.socket = Some(socket);
        self.status = CanStatus::Connected;
        info!("Connected to {}", self.name);
        Ok(())
    }

    async fn disconnect(&mut self) -> CanResult<()> {
        // Dropping the socket closes it
        self.socket = None;
        self.status = CanStatus::Disconnected;
        info!("Disconnected from {}", self.name);
        Ok(())
    }

    async fn send(&mut self, message: &CanMessage) -> CanResult<()> {
        let socket = self.socket.as_ref().ok_or("Not connected")?;
        let frame = Self::to_frame(message)
            .ok_or_else(|| format!("Invalid CAN id 0x{:X}", message.id))?;
        socket.write_frame(&frame)?;
        Ok(())
    }
}
