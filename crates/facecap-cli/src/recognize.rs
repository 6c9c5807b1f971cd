//! Live recognition session.

use crate::capture::QUIT_KEY;
use anyhow::{Context, Result};
use facecap_core::{recognize_faces, DetectionModel, Enrollment, FaceProvider, DOWNSAMPLE_FACTOR};
use facecap_hw::{FrameSource, Preview};

/// Label faces on every frame until `q` or a failed read.
///
/// Each frame is shrunk by [`DOWNSAMPLE_FACTOR`] and converted to RGB for
/// detection; boxes are scaled back before drawing on the full frame.
/// Returns the number of frames processed.
pub fn run_recognition<S, P, F>(
    source: &mut S,
    preview: &mut P,
    provider: &mut F,
    enrollment: &Enrollment,
) -> Result<u64>
where
    S: FrameSource + ?Sized,
    P: Preview + ?Sized,
    F: FaceProvider + ?Sized,
{
    tracing::info!(known = enrollment.len(), "recognition started, press '{QUIT_KEY}' to quit");
    let mut frames = 0u64;

    loop {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "could not capture an image from the camera");
                break;
            }
        };
        frames += 1;

        let small = frame.downsample(DOWNSAMPLE_FACTOR).to_rgb_image();
        let faces = recognize_faces(provider, &small, enrollment, DetectionModel::Fast)
            .with_context(|| format!("recognizing faces in frame {}", frame.sequence))?;
        let faces: Vec<_> = faces.iter().map(|f| f.scaled(DOWNSAMPLE_FACTOR)).collect();

        for face in &faces {
            tracing::trace!(label = %face.label, location = ?face.location, "face");
        }

        if let Err(e) = preview.show(&frame, &faces) {
            tracing::warn!(error = %e, "failed to show frame");
        }

        match preview.poll_key() {
            Ok(Some(QUIT_KEY)) => break,
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "failed to poll keyboard"),
        }
    }

    tracing::debug!(frames, "recognition session ended");
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCamera, FakePreview, FRAME_HEIGHT, FRAME_WIDTH};
    use facecap_core::{Embedding, Face, FaceLocation, ProviderError, UNKNOWN_LABEL};
    use image::RgbImage;
    use std::cell::Cell;

    /// Detects a fixed set of faces and answers every comparison with a
    /// fixed match vector.
    struct Scripted {
        faces: Vec<Face>,
        matches: Vec<bool>,
        detect_sizes: Vec<(u32, u32)>,
        compares: Cell<usize>,
    }

    impl Scripted {
        fn new(faces: Vec<Face>, matches: Vec<bool>) -> Self {
            Self {
                faces,
                matches,
                detect_sizes: Vec::new(),
                compares: Cell::new(0),
            }
        }
    }

    impl FaceProvider for Scripted {
        fn detect(&mut self, image: &RgbImage, _: DetectionModel) -> Result<Vec<Face>, ProviderError> {
            self.detect_sizes.push(image.dimensions());
            Ok(self.faces.clone())
        }

        fn encode(&mut self, _: &RgbImage, faces: &[Face]) -> Result<Vec<Embedding>, ProviderError> {
            Ok(faces.iter().map(|_| Embedding::new(vec![0.5])).collect())
        }

        fn compare(&self, _: &[Embedding], _: &Embedding) -> Vec<bool> {
            self.compares.set(self.compares.get() + 1);
            self.matches.clone()
        }
    }

    fn enrollment(names: &[&str]) -> Enrollment {
        let mut e = Enrollment::new();
        for name in names {
            e.push(Embedding::new(vec![1.0]), *name);
        }
        e
    }

    #[test]
    fn test_boxes_are_scaled_back_and_labelled() {
        let face = Face::from_location(FaceLocation::new(10, 50, 60, 5));
        let mut provider = Scripted::new(vec![face], vec![false, true, true]);
        let mut camera = FakeCamera::with_frames(1);
        let mut preview = FakePreview::with_keys(&[]);

        let frames = run_recognition(
            &mut camera,
            &mut preview,
            &mut provider,
            &enrollment(&["Alice", "Bob", "Carol"]),
        )
        .unwrap();

        assert_eq!(frames, 1);
        assert_eq!(
            provider.detect_sizes,
            vec![(FRAME_WIDTH / DOWNSAMPLE_FACTOR, FRAME_HEIGHT / DOWNSAMPLE_FACTOR)]
        );
        assert_eq!(preview.shown.len(), 1);
        let drawn = &preview.shown[0];
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].label, "Bob");
        assert_eq!(drawn[0].location, FaceLocation::new(40, 200, 240, 20));
    }

    #[test]
    fn test_frame_without_faces_is_shown_plain() {
        let mut provider = Scripted::new(Vec::new(), vec![true]);
        let mut camera = FakeCamera::with_frames(3);
        let mut preview = FakePreview::with_keys(&[]);

        run_recognition(&mut camera, &mut preview, &mut provider, &enrollment(&["Alice"])).unwrap();

        assert_eq!(preview.shown.len(), 3);
        assert!(preview.shown.iter().all(|faces| faces.is_empty()));
        assert_eq!(provider.compares.get(), 0);
    }

    #[test]
    fn test_empty_enrollment_labels_unknown() {
        let face = Face::from_location(FaceLocation::new(1, 2, 3, 0));
        let mut provider = Scripted::new(vec![face], Vec::new());
        let mut camera = FakeCamera::with_frames(1);
        let mut preview = FakePreview::with_keys(&[]);

        run_recognition(&mut camera, &mut preview, &mut provider, &Enrollment::new()).unwrap();

        assert_eq!(preview.shown[0][0].label, UNKNOWN_LABEL);
    }

    #[test]
    fn test_quit_key_ends_session() {
        let mut provider = Scripted::new(Vec::new(), Vec::new());
        let mut camera = FakeCamera::with_frames(10);
        let mut preview = FakePreview::with_keys(&[None, Some('q')]);

        let frames = run_recognition(&mut camera, &mut preview, &mut provider, &Enrollment::new()).unwrap();

        assert_eq!(frames, 2);
        assert_eq!(camera.remaining(), 8);
    }
}
