pub mod adapter;
pub mod device;
pub mod session;
pub mod still;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::CameraAdapter;
pub use device::{CaptureDevice, NoCamera, StreamConstraints, VideoStream};
pub use session::CameraSession;
pub use still::StillImageDevice;
