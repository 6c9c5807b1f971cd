use serde::{Deserialize, Serialize};

/// Label assigned to a detected face that matches no enrolled person.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Face bounding box in integer pixel coordinates, ordered
/// `(top, right, bottom, left)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceLocation {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceLocation {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self { top, right, bottom, left }
    }

    /// A box is well-formed when its edges are not inverted.
    pub fn is_well_formed(&self) -> bool {
        self.top <= self.bottom && self.left <= self.right
    }

    /// Multiply every coordinate by `factor`, mapping a box found on a
    /// downsampled frame back onto the full-resolution frame.
    pub fn scaled(&self, factor: u32) -> Self {
        let f = factor as i32;
        Self {
            top: self.top * f,
            right: self.right * f,
            bottom: self.bottom * f,
            left: self.left * f,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// A face found by a detector: its box plus whatever extra geometry the
/// detector produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub location: FaceLocation,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl Face {
    /// A face with only a box, as produced by detectors without landmarks.
    pub fn from_location(location: FaceLocation) -> Self {
        Self {
            location,
            confidence: 1.0,
            landmarks: None,
        }
    }
}

/// Face embedding vector (512-dimensional for ArcFace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            model_version: None,
        }
    }

    /// Compute cosine similarity between two embeddings.
    ///
    /// Returns a value in [-1, 1]. Higher = more similar.
    pub fn similarity(&self, other: &Embedding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 { dot / denom } else { 0.0 }
    }
}

/// A face on a live frame with its resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFace {
    pub location: FaceLocation,
    pub label: String,
}

impl LabeledFace {
    pub fn scaled(&self, factor: u32) -> Self {
        Self {
            location: self.location.scaled(factor),
            label: self.label.clone(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

/// Height of the filled strip behind a face label, in pixels.
pub const LABEL_STRIP_HEIGHT: i32 = 35;
/// Offset of the label text from the strip's left and bottom edges.
pub const LABEL_TEXT_INSET: i32 = 6;

/// Pixel geometry for drawing one labelled face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    /// Outline rectangle: (left, top) to (right, bottom).
    pub outline: ((i32, i32), (i32, i32)),
    /// Filled label strip anchored at the box's bottom edge.
    pub strip: ((i32, i32), (i32, i32)),
    /// Baseline origin of the label text.
    pub text_origin: (i32, i32),
}

impl LabelLayout {
    pub fn for_location(loc: &FaceLocation) -> Self {
        Self {
            outline: ((loc.left, loc.top), (loc.right, loc.bottom)),
            strip: (
                (loc.left, loc.bottom - LABEL_STRIP_HEIGHT),
                (loc.right, loc.bottom),
            ),
            text_origin: (loc.left + LABEL_TEXT_INSET, loc.bottom - LABEL_TEXT_INSET),
        }
    }
}
