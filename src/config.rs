//! Application configuration
//!
//! Loaded from an optional `tryon.json` next to the executable or in the
//! working directory. Missing file means defaults; a malformed file is an
//! error so typos don't silently fall back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Requested camera capture width.
pub const DEFAULT_CAMERA_WIDTH: u32 = 1280;
/// Requested camera capture height.
pub const DEFAULT_CAMERA_HEIGHT: u32 = 720;

/// Application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Camera index to open (0 for default)
    pub camera_index: u32,
    /// Requested capture width
    pub camera_width: u32,
    /// Requested capture height
    pub camera_height: u32,
    /// Maximum faces to track
    pub max_faces: u32,
    /// Use the landmark-refinement model variant
    pub refine_landmarks: bool,
    /// Minimum face detection confidence
    pub min_detection_confidence: f32,
    /// Minimum tracking confidence
    pub min_tracking_confidence: f32,
    /// Directory holding jewelry images (`earrings/`, `necklaces/`, `fallback.png`)
    pub assets_dir: PathBuf,
    /// Directory snapshots are written into
    pub snapshot_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            camera_width: DEFAULT_CAMERA_WIDTH,
            camera_height: DEFAULT_CAMERA_HEIGHT,
            max_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            assets_dir: PathBuf::from("assets"),
            snapshot_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Load configuration from `tryon.json`, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self, String> {
        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                return Self::load_from(&candidate);
            }
        }
        log::info!("No tryon.json found, using default configuration");
        Ok(Self::default())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {:?}: {}", path, e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse config {:?}: {}", path, e))?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                paths.push(dir.join("tryon.json"));
            }
        }
        paths.push(PathBuf::from("tryon.json"));
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.camera_width, 1280);
        assert_eq!(config.camera_height, 720);
        assert_eq!(config.max_faces, 1);
        assert!(config.refine_landmarks);
        assert_eq!(config.min_detection_confidence, 0.5);
        assert_eq!(config.min_tracking_confidence, 0.5);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"camera_index": 2}"#).unwrap();
        assert_eq!(config.camera_index, 2);
        assert_eq!(config.camera_width, 1280);
    }
}
