use async_trait::async_trait;
use crate::core::CanMessage;
use crate::hardware::can_interface::{CanConfig, CanInterface, CanResult, CanStatus};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::SerialPortBuilderExt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// SLCAN adapters talk at this rate regardless of the CAN bitrate
const SLCAN_BAUD: u32 = 1_000_000;

/// How long to wait for a command acknowledgment
const ACK_TIMEOUT: Duration = Duration::from_millis(500);

/// Transmit-only SLCAN/Lawicel serial CAN interface
///
/// Works with common USB-CAN adapters (CANable, CANtact, Lawicel CANUSB).
pub struct SerialCanInterface {
    /// Interface name (serial port path)
    name: String,
    status: CanStatus,
    port: Option<tokio_serial::SerialStream>,
}

impl SerialCanInterface {
    pub fn new(port_name: &str) -> Self {
        debug!("Creating new SerialCanInterface for port: {}", port_name);
        Self {
            name: port_name.to_string(),
            status: CanStatus::Disconnected,
            port: None,
        }
    }

    /// Build SLCAN command to set bitrate
    fn build_bitrate_command(bitrate: u32) -> Vec<u8> {
        let code = match bitrate {
            10_000 => '0',
            20_000 => '1',
            50_000 => '2',
            100_000 => '3',
            125_000 => '4',
            250_000 => '5',
            500_000 => '6',
            800_000 => '7',
            1_000_000 => '8',
            other => {
                warn!("Unsupported SLCAN bitrate {}, using 500k", other);
                '6'
            }
        };
        format!("S{}\r", code).into_bytes()
    }

    /// Build an SLCAN command to transmit a CAN frame
    fn build_tx_command(message: &CanMessage) -> Vec<u8> {
        let data_hex: String = message.payload().iter()
            .map(|b| format!("{:02X}", b))
            .collect();

        if message.is_extended() {
            format!("T{:08X}{}{}\r", message.id, message.len, data_hex).into_bytes()
        } else {
            format!("t{:03X}{}{}\r", message.id, message.len, data_hex).into_bytes()
        }
    }

    /// Send a command and wait for the adapter's '\r' acknowledgment
    ///
    /// Some firmwares never acknowledge; a timeout is logged and tolerated.
    async fn send_command(port: &mut tokio_serial::SerialStream, cmd: &[u8]) -> CanResult<()> {
        debug!("Sending SLCAN command: {:?}", String::from_utf8_lossy(cmd));
        port.write_all(cmd).await?;
        port.flush().await?;

        let mut buf = [0u8; 64];
        let wait_ack = async {
            loop {
                match port.read(&mut buf).await {
                    Ok(0) => continue,
                    Ok(n) if buf[..n].contains(&b'\r') => return Ok(()),
                    // BEL means the adapter rejected the command
                    Ok(n) if buf[..n].contains(&0x07) => {
                        return Err(format!("Adapter rejected {:?}", String::from_utf8_lossy(cmd)))
                    }
                    Ok(_) => continue,
                    Err(e) => return Err(format!("Read error: {}", e)),
                }
            }
        };

        match tokio::time::timeout(ACK_TIMEOUT, wait_ack).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                warn!("No ACK for SLCAN command {:?}", String::from_utf8_lossy(cmd));
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CanInterface for SerialCanInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> CanStatus {
        self.status
    }

    async fn connect(&mut self, config: CanConfig) -> CanResult<()> {
        info!("Connecting to serial port: {} at bitrate: {}", self.name, config.bitrate);

        let mut port = tokio_serial::new(&self.name, SLCAN_BAUD)
            .timeout(Duration::from_millis(100))
            .open_native_async()
            .map_err(|e| format!("Failed to open serial port {}: {}", self.name, e))?;

        // Close any session a previous process left open
        port.write_all(b"C\r").await?;
        port.flush().await?;
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self::send_command(&mut port, &Self::build_bitrate_command(config.bitrate)).await?;
        Self::send_command(&mut port, b"O\r").await?;

        self.port = Some(port);
        self.status = CanStatus::Connected;
        info!("Successfully connected to {}", self.name);
        Ok(())
    }

    async fn disconnect(&mut self) -> CanResult<()> {
        info!("Disconnecting from {}", self.name);

        if let Some(mut port) = self.port.take() {
            let _ = port.write_all(b"C\r").await;
            let _ = port.flush().await;
        }
        self.status = CanStatus::Disconnected;
        Ok(())
    }

    async fn send(&mut self, message: &CanMessage) -> CanResult<()> {
        let port = self.port.as_mut().ok_or("Not connected")?;

        let cmd = Self::build_tx_command(message);
        port.write_all(&cmd).await?;
        port.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tx_command_uses_declared_length() {
        let msg = CanMessage::new(661, 7, [0, 31, 0, 88, 1, 0, 1, 0]);
        assert_eq!(
            SerialCanInterface::build_tx_command(&msg),
            b"t2957001F0058010001\r".to_vec()
        );
    }

    #[test]
    fn test_extended_tx_command() {
        let msg = CanMessage::new(6969, 8, [0xC2, 0x07, 0x79, 0xA6, 0x43, 0x17, 0x35, 0x9C]);
        assert_eq!(
            SerialCanInterface::build_tx_command(&msg),
            b"T00001B398C20779A64317359C\r".to_vec()
        );
    }

    #[test]
    fn test_bitrate_commands() {
        assert_eq!(SerialCanInterface::build_bitrate_command(500_000), b"S6\r".to_vec());
        assert_eq!(SerialCanInterface::build_bitrate_command(1_000_000), b"S8\r".to_vec());
        assert_eq!(SerialCanInterface::build_bitrate_command(33_333), b"S6\r".to_vec());
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let mut iface = SerialCanInterface::new("/dev/null-slcan");
        let msg = CanMessage::new(660, 6, [0; 8]);
        assert!(iface.send(&msg).await.is_err());
        assert_eq!(iface.status(), CanStatus::Disconnected);
    }
}
