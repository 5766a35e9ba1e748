pub mod message;
pub mod records;
pub mod store;

pub use message::CanMessage;
pub use records::EcuVariant;
pub use store::RecordStore;
