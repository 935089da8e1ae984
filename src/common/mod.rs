pub mod frame;
pub mod payload;

pub use frame::VideoFrame;
pub use payload::{ImageOrigin, ImagePayload};
