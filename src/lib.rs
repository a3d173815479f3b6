//! Jewelry Try-On - virtual earring and necklace overlay on live video
//!
//! Captures camera input, tracks facial landmarks with an ONNX face mesh
//! model, and composites jewelry images anchored to the ears and chin
//! over the live feed.

pub mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod overlay;
pub mod snapshot;
pub mod state;
pub mod tracking;

pub use app::App;
