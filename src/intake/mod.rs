//! Image acquisition: user-selected files and single camera snapshots.

pub mod camera;
pub mod file;

pub use camera::CameraAdapter;
pub use file::{FileAdapter, SelectedFile};
