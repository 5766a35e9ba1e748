pub mod frames;

pub use frames::{EncodeError, FrameEncoder};
