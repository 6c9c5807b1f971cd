//! On-screen preview windows via OpenCV HighGUI.

use crate::frame::Frame;
use crate::Preview;
use facecap_core::{LabelLayout, LabeledFace};
use opencv::core::{Mat, Point, Scalar, CV_8UC3};
use opencv::prelude::*;
use opencv::{highgui, imgproc};
use thiserror::Error;

/// Title of the capture preview window.
pub const CAPTURE_WINDOW: &str = "Capture";
/// Title of the live recognition window.
pub const RECOGNITION_WINDOW: &str = "Video";

// BGR colours.
const OUTLINE_COLOR: (f64, f64, f64) = (255.0, 255.0, 0.0);
const STRIP_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const TEXT_COLOR: (f64, f64, f64) = (255.0, 255.0, 255.0);
const OUTLINE_THICKNESS: i32 = 2;
const FONT_SCALE: f64 = 1.0;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("frame buffer is {actual} bytes, window expects {expected}")]
    FrameSize { expected: usize, actual: usize },
}

fn bgr(color: (f64, f64, f64)) -> Scalar {
    Scalar::new(color.0, color.1, color.2, 0.0)
}

/// A titled HighGUI window, destroyed on drop.
pub struct Window {
    name: String,
}

impl Window {
    pub fn open(name: &str) -> Result<Self, DisplayError> {
        highgui::named_window(name, highgui::WINDOW_AUTOSIZE)?;
        tracing::debug!(window = name, "window opened");
        Ok(Self { name: name.to_string() })
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.name) {
            tracing::warn!(window = %self.name, error = %e, "failed to close window");
        }
    }
}

/// Copy a BGR frame into a fresh 8-bit three-channel matrix.
fn frame_to_mat(frame: &Frame) -> Result<Mat, DisplayError> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height as i32,
        frame.width as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    let bytes = mat.data_bytes_mut()?;
    if bytes.len() != frame.data.len() {
        return Err(DisplayError::FrameSize {
            expected: bytes.len(),
            actual: frame.data.len(),
        });
    }
    bytes.copy_from_slice(&frame.data);
    Ok(mat)
}

/// Draw outline, label strip and label text for one face.
fn draw_face(mat: &mut Mat, face: &LabeledFace) -> Result<(), DisplayError> {
    let layout = LabelLayout::for_location(&face.location);
    let point = |(x, y): (i32, i32)| Point::new(x, y);

    imgproc::rectangle_points(
        mat,
        point(layout.outline.0),
        point(layout.outline.1),
        bgr(OUTLINE_COLOR),
        OUTLINE_THICKNESS,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::rectangle_points(
        mat,
        point(layout.strip.0),
        point(layout.strip.1),
        bgr(STRIP_COLOR),
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::put_text(
        mat,
        &face.label,
        point(layout.text_origin),
        imgproc::FONT_HERSHEY_DUPLEX,
        FONT_SCALE,
        bgr(TEXT_COLOR),
        1,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

impl Preview for Window {
    fn show(&mut self, frame: &Frame, faces: &[LabeledFace]) -> Result<(), DisplayError> {
        let mut mat = frame_to_mat(frame)?;
        for face in faces {
            draw_face(&mut mat, face)?;
        }
        highgui::imshow(&self.name, &mat)?;
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>, DisplayError> {
        let key = highgui::wait_key(1)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(char::from_u32((key & 0xFF) as u32))
    }
}
