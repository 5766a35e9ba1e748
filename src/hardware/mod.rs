pub mod can_interface;
pub mod serial_can;
pub mod mock;
#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub mod socket_can;

pub use can_interface::{CanConfig, CanInterface, CanResult, InterfaceType};
pub use serial_can::SerialCanInterface;
pub use mock::MockCanInterface;
#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub use socket_can::SocketCanInterface;

/// Build an unconnected interface of the requested type
pub fn create_interface(interface_type: InterfaceType, name: &str) -> CanResult<Box<dyn CanInterface>> {
    match interface_type {
        InterfaceType::Serial => Ok(Box::new(SerialCanInterface::new(name))),
        InterfaceType::Virtual => Ok(Box::new(MockCanInterface::new(name))),
        #[cfg(all(target_os = "linux", feature = "socketcan"))]
        InterfaceType::SocketCan => Ok(Box::new(SocketCanInterface::new(name))),
        #[cfg(not(all(target_os = "linux", feature = "socketcan")))]
        InterfaceType::SocketCan => {
            Err("SocketCAN support requires Linux and the `socketcan` feature; \
                 rebuild with --features socketcan, or set interface_type to \"serial\" or \"virtual\""
                .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::can_interface::CanStatus;

    #[test]
    fn test_create_virtual_interface() {
        let iface = create_interface(InterfaceType::Virtual, "mock0").unwrap();
        assert_eq!(iface.name(), "mock0");
        assert_eq!(iface.status(), CanStatus::Disconnected);
    }

    #[cfg(not(all(target_os = "linux", feature = "socketcan")))]
    #[test]
    fn test_socketcan_unavailable_without_feature() {
        let err = create_interface(InterfaceType::SocketCan, "vcan0").err().unwrap();
        assert!(err.to_string().contains("--features socketcan"), "{}", err);
    }
}
