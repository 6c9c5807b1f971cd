//! facecap-core - Face enrollment and recognition engine.
//!
//! Uses SCRFD for face detection and ArcFace for face encoding, both running
//! via ONNX Runtime, behind the [`FaceProvider`] seam. Also owns the on-disk
//! layout of captured faces, the enrollment loader and per-frame recognition.

pub mod alignment;
pub mod detector;
pub mod enrollment;
pub mod provider;
pub mod recognition;
pub mod recognizer;
pub mod storage;
pub mod types;

pub use enrollment::{load_enrollment, Enrollment, EnrollmentError};
pub use provider::{DetectionModel, FaceProvider, OnnxFaceProvider, ProviderError};
pub use recognition::{recognize_faces, resolve_label, DOWNSAMPLE_FACTOR};
pub use types::{Embedding, Face, FaceLocation, LabelLayout, LabeledFace, UNKNOWN_LABEL};
