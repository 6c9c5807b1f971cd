//! Per-frame recognition: detect, encode, match against the enrollment.

use crate::enrollment::Enrollment;
use crate::provider::{DetectionModel, FaceProvider, ProviderError};
use crate::types::{LabeledFace, UNKNOWN_LABEL};
use image::RgbImage;

/// Linear factor by which live frames are shrunk before detection.
pub const DOWNSAMPLE_FACTOR: u32 = 4;

/// Label at the first matching position, or [`UNKNOWN_LABEL`].
///
/// Later matches are ignored even if they are closer.
pub fn resolve_label(matches: &[bool], labels: &[String]) -> String {
    debug_assert_eq!(matches.len(), labels.len(), "one match flag per enrolled label");
    matches
        .iter()
        .position(|&m| m)
        .and_then(|idx| labels.get(idx))
        .cloned()
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// Identify every face in `image` against `enrollment`.
///
/// Locations are in `image` coordinates. If the detector returns nothing,
/// or any box is malformed, the frame is treated as having no faces and
/// neither the encoder nor the comparator is invoked.
pub fn recognize_faces<P: FaceProvider + ?Sized>(
    provider: &mut P,
    image: &RgbImage,
    enrollment: &Enrollment,
    model: DetectionModel,
) -> Result<Vec<LabeledFace>, ProviderError> {
    let faces = provider.detect(image, model)?;

    if faces.is_empty() {
        return Ok(Vec::new());
    }
    if !faces.iter().all(|f| f.location.is_well_formed()) {
        tracing::debug!(count = faces.len(), "malformed detection, treating frame as empty");
        return Ok(Vec::new());
    }

    let encodings = provider.encode(image, &faces)?;
    if encodings.len() != faces.len() {
        return Err(ProviderError::EncodingCount {
            faces: faces.len(),
            encodings: encodings.len(),
        });
    }

    let labeled = faces
        .iter()
        .zip(encodings.iter())
        .map(|(face, encoding)| {
            let matches = provider.compare(enrollment.encodings(), encoding);
            LabeledFace {
                location: face.location,
                label: resolve_label(&matches, enrollment.labels()),
            }
        })
        .collect();

    Ok(labeled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Embedding, Face, FaceLocation};
    use std::cell::Cell;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_match_wins() {
        let names = labels(&["Alice", "Bob", "Carol"]);
        assert_eq!(resolve_label(&[false, true, true], &names), "Bob");
        assert_eq!(resolve_label(&[true, false, true], &names), "Alice");
    }

    #[test]
    fn test_no_match_is_unknown() {
        let names = labels(&["Alice", "Bob"]);
        assert_eq!(resolve_label(&[false, false], &names), UNKNOWN_LABEL);
        assert_eq!(resolve_label(&[], &[]), UNKNOWN_LABEL);
    }

    /// Returns canned detections and match vectors, counting calls.
    struct Scripted {
        faces: Vec<Face>,
        matches: Vec<bool>,
        /// Encodings withheld from the end of each `encode` result.
        drop_encodings: usize,
        encode_calls: Cell<usize>,
        compare_calls: Cell<usize>,
    }

    impl Scripted {
        fn new(faces: Vec<Face>, matches: Vec<bool>) -> Self {
            Self {
                faces,
                matches,
                drop_encodings: 0,
                encode_calls: Cell::new(0),
                compare_calls: Cell::new(0),
            }
        }
    }

    impl FaceProvider for Scripted {
        fn detect(&mut self, _: &RgbImage, model: DetectionModel) -> Result<Vec<Face>, ProviderError> {
            assert_eq!(model, DetectionModel::Fast);
            Ok(self.faces.clone())
        }

        fn encode(&mut self, _: &RgbImage, faces: &[Face]) -> Result<Vec<Embedding>, ProviderError> {
            self.encode_calls.set(self.encode_calls.get() + 1);
            let n = faces.len().saturating_sub(self.drop_encodings);
            Ok((0..n).map(|_| Embedding::new(vec![1.0])).collect())
        }

        fn compare(&self, known: &[Embedding], _: &Embedding) -> Vec<bool> {
            self.compare_calls.set(self.compare_calls.get() + 1);
            assert_eq!(known.len(), self.matches.len());
            self.matches.clone()
        }
    }

    fn enrollment(names: &[&str]) -> Enrollment {
        let mut e = Enrollment::new();
        for (i, name) in names.iter().enumerate() {
            e.push(Embedding::new(vec![i as f32]), *name);
        }
        e
    }

    #[test]
    fn test_empty_detection_skips_encode_and_compare() {
        let mut provider = Scripted::new(Vec::new(), vec![true]);
        let image = RgbImage::new(16, 16);

        let faces = recognize_faces(&mut provider, &image, &enrollment(&["Alice"]), DetectionModel::Fast).unwrap();

        assert!(faces.is_empty());
        assert_eq!(provider.encode_calls.get(), 0);
        assert_eq!(provider.compare_calls.get(), 0);
    }

    #[test]
    fn test_malformed_box_drops_whole_frame() {
        let good = Face::from_location(FaceLocation::new(0, 10, 10, 0));
        let inverted = Face::from_location(FaceLocation::new(10, 0, 0, 10));
        let mut provider = Scripted::new(vec![good, inverted], vec![true]);
        let image = RgbImage::new(16, 16);

        let faces = recognize_faces(&mut provider, &image, &enrollment(&["Alice"]), DetectionModel::Fast).unwrap();

        assert!(faces.is_empty());
        assert_eq!(provider.encode_calls.get(), 0);
    }

    #[test]
    fn test_labels_each_face_with_first_match() {
        let a = Face::from_location(FaceLocation::new(10, 50, 60, 5));
        let b = Face::from_location(FaceLocation::new(1, 9, 9, 1));
        let mut provider = Scripted::new(vec![a, b], vec![false, true, true]);
        let image = RgbImage::new(64, 64);

        let faces = recognize_faces(
            &mut provider,
            &image,
            &enrollment(&["Alice", "Bob", "Carol"]),
            DetectionModel::Fast,
        )
        .unwrap();

        assert_eq!(faces.len(), 2);
        assert!(faces.iter().all(|f| f.label == "Bob"));
        assert_eq!(provider.compare_calls.get(), 2);
        assert_eq!(
            faces[0].scaled(DOWNSAMPLE_FACTOR).location,
            FaceLocation::new(40, 200, 240, 20)
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "one match flag per enrolled label")]
    fn test_match_vector_longer_than_labels_panics() {
        resolve_label(&[false, false, true], &labels(&["Alice", "Bob"]));
    }

    #[test]
    fn test_short_encoding_list_is_error() {
        let a = Face::from_location(FaceLocation::new(0, 4, 4, 0));
        let b = Face::from_location(FaceLocation::new(4, 8, 8, 4));
        let mut provider = Scripted::new(vec![a, b], vec![true]);
        provider.drop_encodings = 1;
        let image = RgbImage::new(8, 8);

        let err = recognize_faces(&mut provider, &image, &enrollment(&["Alice"]), DetectionModel::Fast)
            .unwrap_err();

        assert!(matches!(err, ProviderError::EncodingCount { faces: 2, encodings: 1 }));
        assert_eq!(provider.compare_calls.get(), 0);
    }

    #[test]
    fn test_empty_enrollment_yields_unknown() {
        let face = Face::from_location(FaceLocation::new(0, 4, 4, 0));
        let mut provider = Scripted::new(vec![face], Vec::new());
        let image = RgbImage::new(8, 8);

        let faces = recognize_faces(&mut provider, &image, &Enrollment::new(), DetectionModel::Fast).unwrap();

        assert_eq!(faces.len(), 1);
        assert!(faces[0].is_unknown());
    }
}
