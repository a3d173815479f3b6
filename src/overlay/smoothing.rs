//! Temporal landmark smoothing
//!
//! Per-frame detection jitters at sub-pixel amplitude even on a still
//! face. A short trailing moving average trades roughly five frames of
//! latency for visibly stable placement.

use std::collections::VecDeque;

use super::anchors::AnchorTriple;
use super::{AnchorKind, Position};

/// Smoothing window length. Fixed, matched to the observed jitter
/// amplitude of the landmark source.
pub const WINDOW: usize = 5;

/// Fixed-capacity FIFO of recent positions for one anchor.
#[derive(Clone, Debug, Default)]
pub struct SmoothingBuffer {
    samples: VecDeque<Position>,
}

impl SmoothingBuffer {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(WINDOW),
        }
    }

    /// Append a sample, evicting the oldest when the window is full.
    pub fn push(&mut self, position: Position) {
        if self.samples.len() == WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(position);
    }

    /// Drop the oldest sample. Called once per frame with no detection so
    /// a stale position fades out instead of freezing in place.
    pub fn decay(&mut self) {
        self.samples.pop_front();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of the buffered samples, or `None` when empty.
    pub fn smoothed(&self) -> Option<Position> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f32;
        let (sx, sy) = self
            .samples
            .iter()
            .fold((0.0f32, 0.0f32), |(x, y), p| (x + p.x, y + p.y));
        Some(Position::new(sx / n, sy / n))
    }
}

/// Smoothed anchor output for one frame. Absent entries mean a cold or
/// fully decayed buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothedAnchors {
    pub left: Option<Position>,
    pub right: Option<Position>,
    pub chin: Option<Position>,
}

/// One smoothing buffer per anchor kind, owned for the session.
#[derive(Debug, Default)]
pub struct AnchorSmoother {
    left: SmoothingBuffer,
    right: SmoothingBuffer,
    chin: SmoothingBuffer,
}

impl AnchorSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    fn buffer_mut(&mut self, kind: AnchorKind) -> &mut SmoothingBuffer {
        match kind {
            AnchorKind::LeftEar => &mut self.left,
            AnchorKind::RightEar => &mut self.right,
            AnchorKind::Chin => &mut self.chin,
        }
    }

    pub fn push(&mut self, kind: AnchorKind, position: Position) {
        self.buffer_mut(kind).push(position);
    }

    /// Feed one frame's resolved anchors. A present anchor is pushed; an
    /// absent one decays its buffer by a sample, so after [`WINDOW`]
    /// consecutive misses the smoothed value goes absent too.
    pub fn observe(&mut self, anchors: &AnchorTriple) {
        match anchors.left {
            Some(p) => self.left.push(p),
            None => self.left.decay(),
        }
        match anchors.right {
            Some(p) => self.right.push(p),
            None => self.right.decay(),
        }
        match anchors.chin {
            Some(p) => self.chin.push(p),
            None => self.chin.decay(),
        }
    }

    pub fn smoothed_for(&self, kind: AnchorKind) -> Option<Position> {
        match kind {
            AnchorKind::LeftEar => self.left.smoothed(),
            AnchorKind::RightEar => self.right.smoothed(),
            AnchorKind::Chin => self.chin.smoothed(),
        }
    }

    pub fn smoothed(&self) -> SmoothedAnchors {
        SmoothedAnchors {
            left: self.left.smoothed(),
            right: self.right.smoothed(),
            chin: self.chin.smoothed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_never_exceeds_window() {
        let mut buffer = SmoothingBuffer::new();
        for i in 0..20 {
            buffer.push(Position::new(i as f32, 0.0));
            assert!(buffer.len() <= WINDOW);
        }
        assert_eq!(buffer.len(), WINDOW);
    }

    #[test]
    fn smoothed_is_mean_of_last_window() {
        let mut buffer = SmoothingBuffer::new();
        for i in 0..8 {
            buffer.push(Position::new(i as f32, (i * 2) as f32));
        }
        // Last five pushes: x in 3..=7, y in 6..=14
        let smoothed = buffer.smoothed().unwrap();
        assert_eq!(smoothed.x, 5.0);
        assert_eq!(smoothed.y, 10.0);
    }

    #[test]
    fn smoothed_is_mean_before_window_fills() {
        let mut buffer = SmoothingBuffer::new();
        buffer.push(Position::new(1.0, 0.0));
        buffer.push(Position::new(3.0, 0.0));
        assert_eq!(buffer.smoothed().unwrap().x, 2.0);
    }

    #[test]
    fn constant_input_is_idempotent() {
        let mut buffer = SmoothingBuffer::new();
        let p = Position::new(123.5, 67.25);
        for _ in 0..WINDOW {
            buffer.push(p);
        }
        assert_eq!(buffer.smoothed(), Some(p));
    }

    #[test]
    fn empty_buffer_smooths_to_none() {
        assert_eq!(SmoothingBuffer::new().smoothed(), None);
    }

    #[test]
    fn absence_decays_to_none_after_window_misses() {
        let mut smoother = AnchorSmoother::new();
        let present = AnchorTriple {
            left: Some(Position::new(10.0, 10.0)),
            right: Some(Position::new(20.0, 10.0)),
            chin: Some(Position::new(15.0, 30.0)),
        };
        for _ in 0..WINDOW {
            smoother.observe(&present);
        }
        assert!(smoother.smoothed().left.is_some());

        let absent = AnchorTriple::default();
        for i in 0..WINDOW {
            assert!(
                smoother.smoothed().left.is_some(),
                "still present after {} misses",
                i
            );
            smoother.observe(&absent);
        }
        assert_eq!(smoother.smoothed(), SmoothedAnchors::default());
    }
}
