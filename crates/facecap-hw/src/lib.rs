//! facecap-hw - Camera capture and preview windows.
//!
//! Provides V4L2-based colour camera access, the BGR [`Frame`] type, and
//! OpenCV HighGUI windows. Sessions depend on the [`FrameSource`] and
//! [`Preview`] traits so they can run against scripted fakes.

pub mod camera;
pub mod display;
pub mod frame;

pub use camera::{Camera, CameraError, PixelFormat, DEFAULT_DEVICE};
pub use display::{DisplayError, Window, CAPTURE_WINDOW, RECOGNITION_WINDOW};
pub use frame::{Frame, FrameError};

use facecap_core::LabeledFace;

/// Something that yields camera frames one at a time.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError>;
}

/// A window that shows frames and reports operator key presses.
pub trait Preview {
    /// Show `frame` with `faces` drawn on top.
    fn show(&mut self, frame: &Frame, faces: &[LabeledFace]) -> Result<(), DisplayError>;

    /// Key pressed since the last poll, if any. Also lets the window repaint.
    fn poll_key(&mut self) -> Result<Option<char>, DisplayError>;
}
