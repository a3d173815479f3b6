//! Anchor resolution
//!
//! Maps a raw face-mesh landmark set to the three placement anchors,
//! converting normalized coordinates to surface pixels and applying the
//! fixed vertical biases tuned against the jewelry asset set.

use crate::tracking::LandmarkSet;

use super::Position;

/// Face-mesh index of the near-left-ear landmark.
pub const LEFT_EAR_INDEX: usize = 132;
/// Face-mesh index of the near-right-ear landmark.
pub const RIGHT_EAR_INDEX: usize = 361;
/// Face-mesh index of the chin-tip landmark.
pub const CHIN_INDEX: usize = 152;

/// Lifts the ear anchors above the detected point to earlobe height.
pub const EAR_BIAS_Y: f32 = -20.0;
/// Drops the chin anchor below the chin tip to clear the jawline.
pub const CHIN_BIAS_Y: f32 = 10.0;

/// The raw resolved anchors for one frame. Each is absent when the frame
/// had no usable landmark set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnchorTriple {
    pub left: Option<Position>,
    pub right: Option<Position>,
    pub chin: Option<Position>,
}

impl AnchorTriple {
    /// True when no anchor was resolved this frame.
    pub fn is_absent(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.chin.is_none()
    }
}

/// Resolve the placement anchors from a landmark set.
///
/// An empty set (no face this frame) yields an all-absent triple; this is
/// the normal no-face path, not an error.
pub fn resolve(landmarks: &LandmarkSet, surface_width: f32, surface_height: f32) -> AnchorTriple {
    if landmarks.is_empty() {
        return AnchorTriple::default();
    }

    let project = |index: usize, bias_y: f32| -> Option<Position> {
        landmarks.get(index).map(|lm| Position {
            x: lm.x * surface_width,
            y: lm.y * surface_height + bias_y,
        })
    };

    AnchorTriple {
        left: project(LEFT_EAR_INDEX, EAR_BIAS_Y),
        right: project(RIGHT_EAR_INDEX, EAR_BIAS_Y),
        chin: project(CHIN_INDEX, CHIN_BIAS_Y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{Landmark, LandmarkSet};

    fn mesh_with(points: &[(usize, f32, f32)]) -> LandmarkSet {
        let max = points.iter().map(|(i, _, _)| *i).max().unwrap_or(0);
        let mut landmarks = vec![Landmark::default(); max + 1];
        for &(i, x, y) in points {
            landmarks[i] = Landmark { x, y, z: 0.0 };
        }
        LandmarkSet::new(landmarks)
    }

    #[test]
    fn empty_set_resolves_to_absent() {
        let triple = resolve(&LandmarkSet::empty(), 1280.0, 720.0);
        assert!(triple.is_absent());
    }

    #[test]
    fn anchors_scale_and_bias() {
        let mesh = mesh_with(&[
            (LEFT_EAR_INDEX, 0.25, 0.5),
            (RIGHT_EAR_INDEX, 0.75, 0.5),
            (CHIN_INDEX, 0.5, 0.75),
        ]);
        let triple = resolve(&mesh, 1000.0, 500.0);

        assert_eq!(triple.left, Some(Position::new(250.0, 250.0 - 20.0)));
        assert_eq!(triple.right, Some(Position::new(750.0, 250.0 - 20.0)));
        assert_eq!(triple.chin, Some(Position::new(500.0, 375.0 + 10.0)));
    }

    #[test]
    fn short_set_yields_partial_triple() {
        // Only the left ear index is covered; the others fall off the end.
        let mesh = mesh_with(&[(LEFT_EAR_INDEX, 0.5, 0.5)]);
        let triple = resolve(&mesh, 100.0, 100.0);
        assert!(triple.left.is_some());
        assert!(triple.right.is_none());
        assert!(triple.chin.is_none());
    }
}
