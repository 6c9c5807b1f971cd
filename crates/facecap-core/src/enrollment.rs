//! Enrollment loader: builds the reference list from the faces directory.

use crate::provider::{DetectionModel, FaceProvider, ProviderError};
use crate::types::Embedding;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("cannot read faces directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("face provider failed on {path}: {source}")]
    Provider {
        path: PathBuf,
        source: ProviderError,
    },
}

/// Reference encodings and their person labels, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Enrollment {
    encodings: Vec<Embedding>,
    labels: Vec<String>,
    /// Images in which no face was found.
    skipped: Vec<PathBuf>,
}

impl Enrollment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, encoding: Embedding, label: impl Into<String>) {
        self.encodings.push(encoding);
        self.labels.push(label.into());
    }

    pub fn encodings(&self) -> &[Embedding] {
        &self.encodings
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    /// Number of entries per label, in first-seen order.
    pub fn counts_by_label(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for label in &self.labels {
            match counts.iter_mut().find(|(l, _)| *l == label.as_str()) {
                Some((_, n)) => *n += 1,
                None => counts.push((label.as_str(), 1)),
            }
        }
        counts
    }
}

/// Sorted entries of `dir`, so traversal order is stable across platforms.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, EnrollmentError> {
    let read_err = |source| EnrollmentError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = fs::read_dir(dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;
    paths.sort();
    Ok(paths)
}

/// Walk `<root>/<person>/<file>` and encode the first face of every image.
///
/// Non-directory entries at the root are ignored. Every file inside a person
/// directory is treated as an image; one that fails to decode aborts the load.
/// Images without a face are recorded in [`Enrollment::skipped`].
pub fn load_enrollment<P: FaceProvider + ?Sized>(
    provider: &mut P,
    root: &Path,
    model: DetectionModel,
) -> Result<Enrollment, EnrollmentError> {
    tracing::info!(root = %root.display(), "loading known faces");
    let mut enrollment = Enrollment::new();

    for person_dir in sorted_entries(root)? {
        if !person_dir.is_dir() {
            continue;
        }
        let label = person_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for path in sorted_entries(&person_dir)? {
            let image = image::open(&path)
                .map_err(|source| EnrollmentError::Image {
                    path: path.clone(),
                    source,
                })?
                .to_rgb8();

            let encodings = provider
                .encode_image(&image, model)
                .map_err(|source| EnrollmentError::Provider {
                    path: path.clone(),
                    source,
                })?;

            match encodings.into_iter().next() {
                Some(encoding) => {
                    tracing::debug!(path = %path.display(), label = %label, "enrolled face");
                    enrollment.push(encoding, label.as_str());
                }
                None => {
                    tracing::warn!(path = %path.display(), "no face found, skipping");
                    enrollment.skipped.push(path);
                }
            }
        }
    }

    tracing::info!(
        count = enrollment.len(),
        skipped = enrollment.skipped.len(),
        "known faces loaded"
    );
    Ok(enrollment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Face, FaceLocation};
    use image::{Rgb, RgbImage};
    use std::fs;

    /// Treats the red channel of pixel (0, 0) as the number of faces in the
    /// image; each face encodes to `[red, index]`.
    struct RedChannelFaces;

    impl FaceProvider for RedChannelFaces {
        fn detect(&mut self, image: &RgbImage, _: DetectionModel) -> Result<Vec<Face>, ProviderError> {
            let n = image.get_pixel(0, 0)[0] as i32;
            Ok((0..n).map(|i| Face::from_location(FaceLocation::new(i, i + 1, i + 1, i))).collect())
        }

        fn encode(&mut self, image: &RgbImage, faces: &[Face]) -> Result<Vec<Embedding>, ProviderError> {
            let red = image.get_pixel(0, 0)[0] as f32;
            Ok(faces
                .iter()
                .map(|f| Embedding::new(vec![red, f.location.top as f32]))
                .collect())
        }

        fn compare(&self, known: &[Embedding], _: &Embedding) -> Vec<bool> {
            vec![false; known.len()]
        }
    }

    fn write_image(path: &Path, faces: u8) {
        RgbImage::from_pixel(4, 4, Rgb([faces, 0, 0])).save(path).unwrap();
    }

    #[test]
    fn test_loads_first_face_per_image() {
        let tmp = tempfile::tempdir().unwrap();
        let alice = tmp.path().join("Alice");
        let bob = tmp.path().join("Bob");
        fs::create_dir_all(&alice).unwrap();
        fs::create_dir_all(&bob).unwrap();
        write_image(&alice.join("Alice_0.png"), 1);
        write_image(&alice.join("group.png"), 3);
        write_image(&bob.join("Bob_0.png"), 2);

        let enrollment = load_enrollment(&mut RedChannelFaces, tmp.path(), DetectionModel::Fast).unwrap();

        assert_eq!(enrollment.labels(), &["Alice", "Alice", "Bob"]);
        assert_eq!(enrollment.encodings().len(), enrollment.labels().len());
        // Multi-face images contribute only their first detection.
        assert_eq!(enrollment.encodings()[1].values, vec![3.0, 0.0]);
        assert_eq!(enrollment.encodings()[2].values, vec![2.0, 0.0]);
        assert!(enrollment.skipped().is_empty());
    }

    #[test]
    fn test_skips_images_without_faces_once_each() {
        let tmp = tempfile::tempdir().unwrap();
        let carol = tmp.path().join("Carol");
        fs::create_dir_all(&carol).unwrap();
        write_image(&carol.join("a.png"), 0);
        write_image(&carol.join("b.png"), 1);
        write_image(&carol.join("c.png"), 0);

        let enrollment = load_enrollment(&mut RedChannelFaces, tmp.path(), DetectionModel::Fast).unwrap();

        assert_eq!(enrollment.len(), 1);
        assert_eq!(enrollment.labels(), &["Carol"]);
        assert_eq!(enrollment.skipped(), &[carol.join("a.png"), carol.join("c.png")]);
    }

    #[test]
    fn test_ignores_files_at_root() {
        let tmp = tempfile::tempdir().unwrap();
        write_image(&tmp.path().join("stray.png"), 1);
        fs::create_dir_all(tmp.path().join("Empty")).unwrap();

        let enrollment = load_enrollment(&mut RedChannelFaces, tmp.path(), DetectionModel::Fast).unwrap();
        assert!(enrollment.is_empty());
        assert!(enrollment.skipped().is_empty());
    }

    #[test]
    fn test_undecodable_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let dave = tmp.path().join("Dave");
        fs::create_dir_all(&dave).unwrap();
        fs::write(dave.join("notes.txt"), b"not an image").unwrap();

        let err = load_enrollment(&mut RedChannelFaces, tmp.path(), DetectionModel::Fast).unwrap_err();
        assert!(matches!(err, EnrollmentError::Image { .. }));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_enrollment(&mut RedChannelFaces, &tmp.path().join("nope"), DetectionModel::Fast)
            .unwrap_err();
        assert!(matches!(err, EnrollmentError::ReadDir { .. }));
    }

    #[test]
    fn test_counts_by_label() {
        let mut enrollment = Enrollment::new();
        enrollment.push(Embedding::new(vec![1.0]), "Ana");
        enrollment.push(Embedding::new(vec![2.0]), "Luis");
        enrollment.push(Embedding::new(vec![3.0]), "Ana");
        assert_eq!(enrollment.counts_by_label(), vec![("Ana", 2), ("Luis", 1)]);
    }
}
