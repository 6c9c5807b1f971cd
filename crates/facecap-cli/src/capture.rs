//! Capture session: preview the camera and save frames on demand.

use anyhow::{Context, Result};
use facecap_core::storage;
use facecap_hw::{FrameSource, Preview};
use std::path::Path;

pub const CAPTURE_KEY: char = 'c';
pub const QUIT_KEY: char = 'q';

/// Show frames until `q` or a failed read; `c` saves the current frame as
/// `<dir>/<name>_<n>.jpg` with `n` counting from zero for this session.
///
/// Returns the number of images saved. Existing files with the same name
/// are overwritten.
pub fn run_capture<S, P>(source: &mut S, preview: &mut P, dir: &Path, name: &str) -> Result<u32>
where
    S: FrameSource + ?Sized,
    P: Preview + ?Sized,
{
    println!("Press '{CAPTURE_KEY}' to capture, '{QUIT_KEY}' to quit.");
    let mut count = 0u32;

    loop {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "could not read from the camera");
                break;
            }
        };

        if let Err(e) = preview.show(&frame, &[]) {
            tracing::warn!(error = %e, "failed to show frame");
        }

        match preview.poll_key() {
            Ok(Some(CAPTURE_KEY)) => {
                let path = storage::capture_path(dir, name, count);
                frame
                    .save_jpeg(&path)
                    .with_context(|| format!("saving {}", path.display()))?;
                tracing::info!(path = %path.display(), "saved");
                count += 1;
            }
            Ok(Some(QUIT_KEY)) => break,
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "failed to poll keyboard"),
        }
    }

    tracing::debug!(name, saved = count, "capture session ended");
    Ok(count)
}
