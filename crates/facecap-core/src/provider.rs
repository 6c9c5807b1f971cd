//! The face capability seam: detect, encode, compare.
//!
//! Orchestration code only talks to [`FaceProvider`]; [`OnnxFaceProvider`]
//! backs it with SCRFD + ArcFace.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{Embedding, Face};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default cosine similarity at or above which two faces match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.40;

const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("provider returned {encodings} encodings for {faces} faces")]
    EncodingCount { faces: usize, encodings: usize },
}

/// Speed/accuracy trade-off for face detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionModel {
    /// Low-resolution pass suited to live video.
    #[default]
    Fast,
    /// Full-resolution pass for stills.
    Accurate,
}

impl DetectionModel {
    /// Square network input side used by the detector.
    pub fn input_size(self) -> usize {
        match self {
            DetectionModel::Fast => 320,
            DetectionModel::Accurate => 640,
        }
    }
}

impl FromStr for DetectionModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" | "hog" => Ok(DetectionModel::Fast),
            "accurate" | "cnn" => Ok(DetectionModel::Accurate),
            other => Err(format!("unknown detection model: {other} (expected fast or accurate)")),
        }
    }
}

/// Face detection, encoding and comparison as one opaque capability.
pub trait FaceProvider {
    /// Find faces in an RGB image, in the provider's output order.
    fn detect(&mut self, image: &RgbImage, model: DetectionModel) -> Result<Vec<Face>, ProviderError>;

    /// Compute one encoding per face, in the same order as `faces`.
    /// The result must have exactly `faces.len()` entries.
    fn encode(&mut self, image: &RgbImage, faces: &[Face]) -> Result<Vec<Embedding>, ProviderError>;

    /// Compare `candidate` against every reference; exactly one flag per
    /// reference, in reference order.
    fn compare(&self, known: &[Embedding], candidate: &Embedding) -> Vec<bool>;

    /// Detect then encode every face in a still image.
    fn encode_image(
        &mut self,
        image: &RgbImage,
        model: DetectionModel,
    ) -> Result<Vec<Embedding>, ProviderError> {
        let faces = self.detect(image, model)?;
        if faces.is_empty() {
            return Ok(Vec::new());
        }
        self.encode(image, &faces)
    }
}

/// Threshold comparison on cosine similarity.
pub fn compare_faces(known: &[Embedding], candidate: &Embedding, threshold: f32) -> Vec<bool> {
    known
        .iter()
        .map(|reference| reference.similarity(candidate) >= threshold)
        .collect()
}

/// SCRFD detection + ArcFace encoding on ONNX Runtime.
pub struct OnnxFaceProvider {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
    threshold: f32,
}

impl OnnxFaceProvider {
    /// Load both models from `model_dir` (`det_10g.onnx`, `w600k_r50.onnx`).
    pub fn load(model_dir: &Path, threshold: f32) -> Result<Self, ProviderError> {
        let detector = FaceDetector::load(&scrfd_model_path(model_dir))?;
        let recognizer = FaceRecognizer::load(&arcface_model_path(model_dir))?;
        tracing::info!(dir = %model_dir.display(), threshold, "face models loaded");
        Ok(Self {
            detector,
            recognizer,
            threshold,
        })
    }
}

impl FaceProvider for OnnxFaceProvider {
    fn detect(&mut self, image: &RgbImage, model: DetectionModel) -> Result<Vec<Face>, ProviderError> {
        Ok(self.detector.detect(image, model)?)
    }

    fn encode(&mut self, image: &RgbImage, faces: &[Face]) -> Result<Vec<Embedding>, ProviderError> {
        faces
            .iter()
            .map(|face| self.recognizer.extract(image, face).map_err(ProviderError::from))
            .collect()
    }

    fn compare(&self, known: &[Embedding], candidate: &Embedding) -> Vec<bool> {
        compare_faces(known, candidate, self.threshold)
    }
}

/// Path to the SCRFD detection model inside `model_dir`.
pub fn scrfd_model_path(model_dir: &Path) -> PathBuf {
    model_dir.join(SCRFD_MODEL_FILE)
}

/// Path to the ArcFace recognition model inside `model_dir`.
pub fn arcface_model_path(model_dir: &Path) -> PathBuf {
    model_dir.join(ARCFACE_MODEL_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FaceLocation;

    #[test]
    fn test_compare_faces_flags_each_reference() {
        let known = vec![
            Embedding::new(vec![1.0, 0.0]),
            Embedding::new(vec![0.0, 1.0]),
            Embedding::new(vec![0.9, 0.1]),
        ];
        let probe = Embedding::new(vec![1.0, 0.0]);
        assert_eq!(compare_faces(&known, &probe, 0.4), vec![true, false, true]);
    }

    #[test]
    fn test_compare_faces_empty_reference() {
        let probe = Embedding::new(vec![1.0, 0.0]);
        assert!(compare_faces(&[], &probe, 0.4).is_empty());
    }

    #[test]
    fn test_detection_model_parse() {
        assert_eq!("fast".parse::<DetectionModel>(), Ok(DetectionModel::Fast));
        assert_eq!("HOG".parse::<DetectionModel>(), Ok(DetectionModel::Fast));
        assert_eq!(" accurate ".parse::<DetectionModel>(), Ok(DetectionModel::Accurate));
        assert!("slow".parse::<DetectionModel>().is_err());
    }

    #[test]
    fn test_model_paths() {
        let dir = Path::new("/opt/models");
        assert_eq!(scrfd_model_path(dir), PathBuf::from("/opt/models/det_10g.onnx"));
        assert_eq!(arcface_model_path(dir), PathBuf::from("/opt/models/w600k_r50.onnx"));
    }

    struct NoFaces {
        encode_calls: usize,
    }

    impl FaceProvider for NoFaces {
        fn detect(&mut self, _: &RgbImage, _: DetectionModel) -> Result<Vec<Face>, ProviderError> {
            Ok(Vec::new())
        }
        fn encode(&mut self, _: &RgbImage, faces: &[Face]) -> Result<Vec<Embedding>, ProviderError> {
            self.encode_calls += 1;
            Ok(faces.iter().map(|_| Embedding::new(vec![1.0])).collect())
        }
        fn compare(&self, known: &[Embedding], _: &Embedding) -> Vec<bool> {
            vec![false; known.len()]
        }
    }

    #[test]
    fn test_encode_image_skips_encoder_without_faces() {
        let mut provider = NoFaces { encode_calls: 0 };
        let image = RgbImage::new(8, 8);
        let encodings = provider.encode_image(&image, DetectionModel::Fast).unwrap();
        assert!(encodings.is_empty());
        assert_eq!(provider.encode_calls, 0);

        // A face handed in directly still gets encoded.
        let faces = [Face::from_location(FaceLocation::new(0, 4, 4, 0))];
        assert_eq!(provider.encode(&image, &faces).unwrap().len(), 1);
    }
}
