//! Scripted stand-ins for the camera and the preview window.

use facecap_core::LabeledFace;
use facecap_hw::{CameraError, DisplayError, Frame, FrameSource, Preview};
use std::collections::VecDeque;

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

/// Yields a fixed number of grey frames, then fails like an unplugged camera.
pub struct FakeCamera {
    frames: VecDeque<Frame>,
}

impl FakeCamera {
    pub fn with_frames(n: u32) -> Self {
        let frames = (0..n)
            .map(|seq| {
                let data = vec![100u8; (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize];
                Frame::from_bgr(data, FRAME_WIDTH, FRAME_HEIGHT, seq).unwrap()
            })
            .collect();
        Self { frames }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for FakeCamera {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        self.frames
            .pop_front()
            .ok_or_else(|| CameraError::CaptureFailed("no more frames".into()))
    }
}

/// Replays scripted key presses and records what was drawn.
pub struct FakePreview {
    keys: VecDeque<Option<char>>,
    /// Faces passed to each `show` call, in order.
    pub shown: Vec<Vec<LabeledFace>>,
}

impl FakePreview {
    pub fn with_keys(keys: &[Option<char>]) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
            shown: Vec::new(),
        }
    }
}

impl Preview for FakePreview {
    fn show(&mut self, _frame: &Frame, faces: &[LabeledFace]) -> Result<(), DisplayError> {
        self.shown.push(faces.to_vec());
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>, DisplayError> {
        Ok(self.keys.pop_front().flatten())
    }
}
