//! ONNX face mesh detector
//!
//! MediaPipe-compatible face landmark model via ONNX Runtime. The model
//! takes a 192x192 RGB crop in [0,1] and yields 468 landmark triples plus
//! a face-presence score.

use std::path::{Path, PathBuf};

use ndarray::Array4;

use super::{Landmark, LandmarkDetector, LandmarkSet, VideoFrame};

const INPUT_WIDTH: u32 = 192;
const INPUT_HEIGHT: u32 = 192;
const LANDMARK_COUNT: usize = 468;

/// Detector configuration, consumed at session creation.
#[derive(Clone, Debug)]
pub struct FaceMeshConfig {
    /// Maximum faces to track. The landmark model handles a single face;
    /// values above 1 are clamped with a warning.
    pub max_faces: u32,
    /// Use the attention model variant with refined eye/lip landmarks.
    pub refine_landmarks: bool,
    /// Minimum face-presence score to report a detection.
    pub min_detection_confidence: f32,
    /// Minimum score to keep reporting an already tracked face.
    pub min_tracking_confidence: f32,
}

impl Default for FaceMeshConfig {
    fn default() -> Self {
        Self {
            max_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// ONNX Runtime face mesh backend.
pub struct FaceMeshDetector {
    session: ort::session::Session,
    config: FaceMeshConfig,
    /// Whether the previous frame had a face, selecting which confidence
    /// threshold applies.
    tracking: bool,
}

impl FaceMeshDetector {
    /// Load the model and create an inference session.
    pub fn new(config: FaceMeshConfig) -> Result<Self, String> {
        let mut config = config;
        if config.max_faces > 1 {
            log::warn!(
                "max_faces {} requested, model supports 1; clamping",
                config.max_faces
            );
            config.max_faces = 1;
        }

        let model_dir = Self::find_model_dir()?;
        let model_name = if config.refine_landmarks {
            "face_landmark_with_attention.onnx"
        } else {
            "face_landmark.onnx"
        };
        let model_path = model_dir.join(model_name);
        if !model_path.exists() {
            return Err(format!("Face landmark model not found: {:?}", model_path));
        }

        ort::init()
            .with_name("JewelryTryOn")
            .commit()
            .map_err(|e| format!("Failed to initialize ORT: {}", e))?;

        let session = ort::session::Session::builder()
            .map_err(|e| format!("Failed to create session builder: {}", e))?
            .with_intra_threads(2)
            .map_err(|e| format!("Failed to set threads: {}", e))?
            .commit_from_file(&model_path)
            .map_err(|e| format!("Failed to load face landmark model: {}", e))?;

        log::info!("Loaded face landmark model from {:?}", model_path);

        Ok(Self {
            session,
            config,
            tracking: false,
        })
    }

    /// Find the models directory, relative to the executable or cwd.
    fn find_model_dir() -> Result<PathBuf, String> {
        if let Ok(exe_path) = std::env::current_exe() {
            let mut dir: Option<&Path> = exe_path.parent();
            while let Some(parent) = dir {
                let model_dir = parent.join("models");
                if model_dir.exists() {
                    return Ok(model_dir);
                }
                dir = parent.parent();
            }
        }

        let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
        let model_dir = cwd.join("models");
        if model_dir.exists() {
            return Ok(model_dir);
        }

        Err("Models directory not found. Create a 'models' directory with the face landmark ONNX model.".to_string())
    }

    /// Resize to model input and convert to NHWC float RGB in [0,1].
    fn preprocess_frame_nhwc(frame: &VideoFrame) -> Vec<f32> {
        let mut output = vec![0.0f32; (INPUT_WIDTH * INPUT_HEIGHT * 3) as usize];

        let x_ratio = frame.width as f32 / INPUT_WIDTH as f32;
        let y_ratio = frame.height as f32 / INPUT_HEIGHT as f32;

        for y in 0..INPUT_HEIGHT {
            for x in 0..INPUT_WIDTH {
                let src_x = (x as f32 * x_ratio) as u32;
                let src_y = (y as f32 * y_ratio) as u32;
                let src_idx = ((src_y * frame.width + src_x) * 4) as usize;

                if src_idx + 2 < frame.data.len() {
                    let out_idx = ((y * INPUT_WIDTH + x) * 3) as usize;
                    output[out_idx] = frame.data[src_idx] as f32 / 255.0;
                    output[out_idx + 1] = frame.data[src_idx + 1] as f32 / 255.0;
                    output[out_idx + 2] = frame.data[src_idx + 2] as f32 / 255.0;
                }
            }
        }

        output
    }
}

impl LandmarkDetector for FaceMeshDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<LandmarkSet, String> {
        let input = Self::preprocess_frame_nhwc(frame);

        let input_array = Array4::from_shape_vec(
            (1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, 3),
            input,
        )
        .map_err(|e| format!("Failed to create input array: {}", e))?;

        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| format!("Failed to create tensor: {}", e))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| format!("Inference failed: {}", e))?;

        // Outputs: landmark coordinates (1404 floats, xyz in input pixels)
        // and a face-presence logit.
        let mut coords: Option<Vec<f32>> = None;
        let mut score: Option<f32> = None;
        for (_, value) in outputs.iter() {
            let (_, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| format!("Failed to extract output: {}", e))?;
            if data.len() >= LANDMARK_COUNT * 3 {
                coords = Some(data[..LANDMARK_COUNT * 3].to_vec());
            } else if data.len() == 1 {
                // Logit -> probability
                score = Some(1.0 / (1.0 + (-data[0]).exp()));
            }
        }

        let coords = coords.ok_or("No landmark output from face mesh model")?;
        let score = score.unwrap_or(0.0);

        let threshold = if self.tracking {
            self.config.min_tracking_confidence
        } else {
            self.config.min_detection_confidence
        };
        if score < threshold {
            self.tracking = false;
            return Ok(LandmarkSet::empty());
        }
        self.tracking = true;

        // Model coordinates are in input-crop pixels; normalize to [0,1].
        let landmarks = coords
            .chunks_exact(3)
            .map(|xyz| Landmark {
                x: xyz[0] / INPUT_WIDTH as f32,
                y: xyz[1] / INPUT_HEIGHT as f32,
                z: xyz[2] / INPUT_WIDTH as f32,
            })
            .collect();

        Ok(LandmarkSet::new(landmarks))
    }
}
