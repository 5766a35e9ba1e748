/// Payload capacity of a classic CAN frame
pub const MAX_DLC: usize = 8;

/// Highest identifier that fits an 11-bit standard frame
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// A CAN frame ready for transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanMessage {
    /// CAN message ID (11-bit or 29-bit)
    pub id: u32,

    /// Declared payload length (DLC); receivers trust this over the buffer size
    pub len: u8,

    /// Raw data buffer, bytes past `len` are zero
    pub data: [u8; MAX_DLC],
}

impl CanMessage {
    /// Create a new CAN message from a full buffer and its declared length
    pub fn new(id: u32, len: u8, data: [u8; MAX_DLC]) -> Self {
        Self {
            id,
            len: len.min(MAX_DLC as u8),
            data,
        }
    }

    /// The meaningful bytes of the frame
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Check if this is an extended (29-bit) CAN ID
    pub fn is_extended(&self) -> bool {
        self.id > MAX_STANDARD_ID
    }

    /// Get the declared payload as hex string
    pub fn hex_data(&self) -> String {
        self.payload()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_honours_declared_length() {
        let msg = CanMessage::new(661, 7, [1, 2, 3, 4, 5, 6, 7, 0]);
        assert_eq!(msg.payload().len(), 7);
        assert_eq!(msg.hex_data(), "01 02 03 04 05 06 07");
    }

    #[test]
    fn test_extended_id() {
        assert!(!CanMessage::new(669, 8, [0; 8]).is_extended());
        assert!(CanMessage::new(6969, 8, [0; 8]).is_extended());
    }

    #[test]
    fn test_length_is_clamped_to_capacity() {
        let msg = CanMessage::new(0x100, 12, [0xFF; 8]);
        assert_eq!(msg.len, 8);
    }
}
