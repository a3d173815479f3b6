//! Overlay pipeline
//!
//! Turns noisy per-frame facial landmarks into stable jewelry placement:
//! anchor resolution, temporal smoothing, and compositing onto an
//! overlay surface.

pub mod anchors;
pub mod canvas;
pub mod compositor;
pub mod smoothing;

/// A 2D point in overlay-surface pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The three semantic anchor points jewelry is placed against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorKind {
    LeftEar,
    RightEar,
    Chin,
}
