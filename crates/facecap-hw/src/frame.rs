//! Frame type and pixel conversions: YUYV/GREY/MJPG to BGR, downsampling, JPEG export.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::path::Path;

/// A captured colour camera frame, packed BGR (the display's native order).
#[derive(Clone)]
pub struct Frame {
    /// BGR pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub sequence: u32,
}

impl Frame {
    /// Wrap packed BGR bytes, checking the length against the dimensions.
    pub fn from_bgr(data: Vec<u8>, width: u32, height: u32, sequence: u32) -> Result<Self, FrameError> {
        let expected = (width * height * 3) as usize;
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            sequence,
        })
    }

    /// Build a frame from an RGB image.
    pub fn from_rgb_image(image: &RgbImage, sequence: u32) -> Self {
        let mut data = image.as_raw().clone();
        swap_red_blue(&mut data);
        Self {
            data,
            width: image.width(),
            height: image.height(),
            sequence,
        }
    }

    /// Copy into an RGB image, the channel order detectors and encoders expect.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut data = self.data.clone();
        swap_red_blue(&mut data);
        RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Shrink both dimensions by `factor` with bilinear filtering.
    pub fn downsample(&self, factor: u32) -> Frame {
        let factor = factor.max(1);
        let new_w = (self.width / factor).max(1);
        let new_h = (self.height / factor).max(1);

        // Resampling is channel-order agnostic, so BGR rides in an Rgb buffer.
        let resized = match ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(self.width, self.height, &self.data[..]) {
            Some(src) => imageops::resize(&src, new_w, new_h, FilterType::Triangle),
            None => RgbImage::new(new_w, new_h),
        };

        Frame {
            data: resized.into_raw(),
            width: new_w,
            height: new_h,
            sequence: self.sequence,
        }
    }

    /// Encode as JPEG at `path`.
    pub fn save_jpeg(&self, path: &Path) -> Result<(), FrameError> {
        self.to_rgb_image().save_with_format(path, ImageFormat::Jpeg)?;
        Ok(())
    }
}

/// Swap the first and third channel of every packed 3-byte pixel, in place.
pub fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// BT.601 limited-range YUV to BGR for one pixel.
fn yuv_to_bgr(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let r = clamp_u8((298 * c + 409 * e + 128) >> 8);
    let g = clamp_u8((298 * c - 100 * d - 208 * e + 128) >> 8);
    let b = clamp_u8((298 * c + 516 * d + 128) >> 8);
    [b, g, r]
}

/// Convert packed YUYV (4:2:2) to BGR.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V], sharing chroma.
pub fn yuyv_to_bgr(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut bgr = Vec::with_capacity((width * height * 3) as usize);
    for quad in yuyv[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
        bgr.extend_from_slice(&yuv_to_bgr(y0, u, v));
        bgr.extend_from_slice(&yuv_to_bgr(y1, u, v));
    }
    Ok(bgr)
}

/// Replicate 8-bit grayscale into three BGR channels.
pub fn grey_to_bgr(gray: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height) as usize;
    if gray.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: gray.len(),
        });
    }
    Ok(gray[..expected].iter().flat_map(|&p| [p, p, p]).collect())
}

/// Decode a Motion-JPEG buffer to BGR, checking it matches the negotiated size.
pub fn mjpg_to_bgr(jpeg: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let decoded = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)?.to_rgb8();
    if decoded.dimensions() != (width, height) {
        return Err(FrameError::UnexpectedSize {
            expected: (width, height),
            actual: decoded.dimensions(),
        });
    }
    let mut data = decoded.into_raw();
    swap_red_blue(&mut data);
    Ok(data)
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("decoded frame is {actual:?}, expected {expected:?}")]
    UnexpectedSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
}
