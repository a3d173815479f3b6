//! Jewelry asset loading
//!
//! Decodes jewelry PNGs on a background thread so a selection click never
//! stalls the render loop. Completions arrive on a channel and are applied
//! last-write-wins by the app. A failed load substitutes the fallback
//! image; a missing fallback substitutes a generated placeholder. Load
//! problems are logged, never user-visible.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Number of options offered per category.
pub const OPTIONS_PER_CATEGORY: u32 = 10;

/// Jewelry category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JewelryCategory {
    Earring,
    Necklace,
}

impl JewelryCategory {
    /// Subdirectory of the assets dir holding this category's images.
    pub fn dir_name(self) -> &'static str {
        match self {
            JewelryCategory::Earring => "earrings",
            JewelryCategory::Necklace => "necklaces",
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            JewelryCategory::Earring => "earring",
            JewelryCategory::Necklace => "necklace",
        }
    }
}

/// A decoded jewelry image, shared between the state and the compositor.
#[derive(Clone, Debug)]
pub struct JewelryImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major
    pub pixels: Vec<u8>,
}

impl JewelryImage {
    /// Translucent gray placeholder used when even the fallback image is
    /// missing, so selection always yields a drawable asset.
    pub fn placeholder(width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[160, 160, 160, 120]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// The fixed option list the selection UI offers for a category.
pub fn catalog(category: JewelryCategory) -> Vec<String> {
    (1..=OPTIONS_PER_CATEGORY)
        .map(|i| format!("{}{}.png", category.file_stem(), i))
        .collect()
}

/// Default selection on startup for a category.
pub fn default_selection(category: JewelryCategory) -> String {
    format!("{}1.png", category.file_stem())
}

/// A completed load: which category it was for and the decoded image.
pub struct LoadedAsset {
    pub category: JewelryCategory,
    pub filename: String,
    pub image: Arc<JewelryImage>,
}

struct LoadRequest {
    category: JewelryCategory,
    filename: String,
}

/// Background asset loader.
///
/// `request` is fire-and-forget; results are drained on the render thread
/// via `poll` and applied last-write-wins into the try-on state.
pub struct AssetLoader {
    request_tx: Option<Sender<LoadRequest>>,
    result_rx: Receiver<LoadedAsset>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl AssetLoader {
    pub fn new(assets_dir: PathBuf) -> Result<Self, String> {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<LoadRequest>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<LoadedAsset>();

        let thread_handle = std::thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || {
                Self::loader_thread(assets_dir, request_rx, result_tx);
            })
            .map_err(|e| format!("Failed to spawn asset loader thread: {}", e))?;

        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            thread_handle: Some(thread_handle),
        })
    }

    fn loader_thread(
        assets_dir: PathBuf,
        request_rx: Receiver<LoadRequest>,
        result_tx: Sender<LoadedAsset>,
    ) {
        log::info!("Asset loader thread started (assets dir: {:?})", assets_dir);

        while let Ok(request) = request_rx.recv() {
            let image = Self::load_with_fallback(&assets_dir, request.category, &request.filename);
            let loaded = LoadedAsset {
                category: request.category,
                filename: request.filename,
                image: Arc::new(image),
            };
            if result_tx.send(loaded).is_err() {
                break;
            }
        }

        log::info!("Asset loader thread stopped");
    }

    fn load_with_fallback(
        assets_dir: &Path,
        category: JewelryCategory,
        filename: &str,
    ) -> JewelryImage {
        let path = assets_dir.join(category.dir_name()).join(filename);
        match Self::decode(&path) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Failed to load {:?}: {}. Using fallback.", path, e);
                let fallback = assets_dir.join("fallback.png");
                Self::decode(&fallback).unwrap_or_else(|e| {
                    log::warn!("Fallback image unavailable ({}), using placeholder", e);
                    JewelryImage::placeholder(64, 64)
                })
            }
        }
    }

    fn decode(path: &Path) -> Result<JewelryImage, String> {
        let decoded = image::open(path)
            .map_err(|e| format!("{}", e))?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(JewelryImage {
            width,
            height,
            pixels: decoded.into_raw(),
        })
    }

    /// Queue a load. Returns immediately; the result shows up in `poll`.
    pub fn request(&self, category: JewelryCategory, filename: &str) {
        if let Some(tx) = &self.request_tx {
            let _ = tx.send(LoadRequest {
                category,
                filename: filename.to_string(),
            });
        }
    }

    /// Drain one completed load, if any.
    pub fn poll(&self) -> Option<LoadedAsset> {
        match self.result_rx.try_recv() {
            Ok(loaded) => Some(loaded),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn stop(&mut self) {
        self.request_tx = None;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_ten_numbered_options() {
        let earrings = catalog(JewelryCategory::Earring);
        assert_eq!(earrings.len(), 10);
        assert_eq!(earrings[0], "earring1.png");
        assert_eq!(earrings[9], "earring10.png");

        let necklaces = catalog(JewelryCategory::Necklace);
        assert_eq!(necklaces[0], "necklace1.png");
    }

    #[test]
    fn missing_file_resolves_to_placeholder() {
        let dir = std::env::temp_dir().join("jewelry-tryon-test-empty");
        let _ = std::fs::create_dir_all(&dir);
        let image =
            AssetLoader::load_with_fallback(&dir, JewelryCategory::Earring, "nope.png");
        // No asset and no fallback on disk: generated placeholder.
        assert_eq!((image.width, image.height), (64, 64));
        assert_eq!(image.pixels.len(), 64 * 64 * 4);
    }

    #[test]
    fn loader_round_trips_a_request() {
        let dir = std::env::temp_dir().join("jewelry-tryon-test-loader");
        let _ = std::fs::create_dir_all(&dir);
        let loader = AssetLoader::new(dir).unwrap();
        loader.request(JewelryCategory::Necklace, "necklace1.png");

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            if let Some(loaded) = loader.poll() {
                assert_eq!(loaded.category, JewelryCategory::Necklace);
                assert_eq!(loaded.filename, "necklace1.png");
                break;
            }
            assert!(std::time::Instant::now() < deadline, "loader timed out");
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }
}
