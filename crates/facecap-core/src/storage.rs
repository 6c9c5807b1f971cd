//! On-disk layout of captured faces: `<root>/<person>/<person>_<n>.jpg`.

use std::io;
use std::path::{Path, PathBuf};

/// Default storage root, relative to the working directory.
pub const DEFAULT_FACES_DIR: &str = "faces";

/// Directory holding one person's images. The name is used verbatim.
pub fn person_dir(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

/// File name for the `index`-th capture of `name` in a session.
pub fn capture_file_name(name: &str, index: u32) -> String {
    format!("{name}_{index}.jpg")
}

/// Full path for the `index`-th capture of `name` inside `dir`.
pub fn capture_path(dir: &Path, name: &str, index: u32) -> PathBuf {
    dir.join(capture_file_name(name, index))
}

/// Create the person's directory (and the root) if missing.
pub fn ensure_person_dir(root: &Path, name: &str) -> io::Result<PathBuf> {
    let dir = person_dir(root, name);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
