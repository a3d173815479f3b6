//! Snapshot export
//!
//! Composites the current video frame and overlay state into a still
//! image at the video's native resolution, reusing the compositor's
//! drawing logic exactly, and writes it as a PNG.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::camera::CameraFrame;
use crate::overlay::canvas::OverlayCanvas;
use crate::overlay::compositor;
use crate::overlay::smoothing::SmoothedAnchors;
use crate::state::TryOnState;

/// Render the frame plus current overlay and save it under `dir` as
/// `jewelry-tryon-<millis>.png`. Returns the written path.
pub fn save(
    dir: &Path,
    frame: &CameraFrame,
    state: &TryOnState,
    anchors: &SmoothedAnchors,
) -> Result<PathBuf, String> {
    let mut canvas = OverlayCanvas::with_background(frame.width, frame.height, frame.data.clone())?;
    compositor::render(&mut canvas, state, anchors);

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_millis();
    let path = dir.join(format!("jewelry-tryon-{}.png", millis));

    let (width, height) = (canvas.width(), canvas.height());
    let image = image::RgbaImage::from_raw(width, height, canvas.into_pixels())
        .ok_or("Snapshot buffer size mismatch")?;
    image
        .save(&path)
        .map_err(|e| format!("Failed to save snapshot {:?}: {}", path, e))?;

    log::info!("Saved snapshot to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{JewelryCategory, JewelryImage};
    use crate::overlay::Position;
    use crate::state::Mode;
    use std::sync::Arc;
    use std::time::Instant;

    fn solid_frame(width: u32, height: u32) -> CameraFrame {
        CameraFrame {
            data: vec![40u8; (width * height * 4) as usize],
            width,
            height,
            frame_number: 0,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn snapshot_writes_png_at_frame_resolution() {
        let dir = std::env::temp_dir().join("jewelry-tryon-test-snapshot");
        let _ = std::fs::create_dir_all(&dir);

        let mut state = TryOnState::new();
        state.set_mode(Mode::Necklace);
        state.set_asset(
            JewelryCategory::Necklace,
            Arc::new(JewelryImage::placeholder(8, 8)),
        );
        let anchors = SmoothedAnchors {
            chin: Some(Position::new(160.0, 120.0)),
            ..Default::default()
        };

        let path = save(&dir, &solid_frame(320, 240), &state, &anchors).unwrap();
        let written = image::open(&path).unwrap().into_rgba8();
        assert_eq!(written.dimensions(), (320, 240));

        // Video background survives outside the draw box.
        assert_eq!(written.get_pixel(0, 0).0, [40, 40, 40, 40]);
        let _ = std::fs::remove_file(path);
    }
}
