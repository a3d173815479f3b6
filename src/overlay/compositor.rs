//! Overlay compositing
//!
//! Draws the active jewelry at deterministic offsets relative to the
//! smoothed anchors. The offsets and box sizes are tuned per asset aspect
//! ratio and must stay exact for visual parity with the asset set.

use std::sync::Arc;

use crate::assets::JewelryImage;
use crate::state::{Mode, TryOnState};

use super::smoothing::SmoothedAnchors;

/// Horizontal shift of the earring box from the left-ear anchor.
pub const EARRING_LEFT_OFFSET_X: f32 = 60.0;
/// Horizontal shift of the earring box from the right-ear anchor.
pub const EARRING_RIGHT_OFFSET_X: f32 = 20.0;
/// Earring draw box, pixels.
pub const EARRING_SIZE: (f32, f32) = (100.0, 100.0);
/// Horizontal shift of the necklace box from the chin anchor.
pub const NECKLACE_OFFSET_X: f32 = 100.0;
/// Necklace draw box, pixels.
pub const NECKLACE_SIZE: (f32, f32) = (200.0, 100.0);

/// Surface the compositor draws onto. The production implementation is
/// [`super::canvas::OverlayCanvas`]; tests substitute a recording surface.
pub trait RenderSurface {
    /// Reset the surface to its base state before any overlay draw.
    fn clear(&mut self);
    /// Draw `image` scaled into the box at (x, y) with size (w, h).
    fn draw_image(&mut self, image: &JewelryImage, x: f32, y: f32, w: f32, h: f32);
}

/// Composite the current overlay state onto `surface`.
///
/// Always clears first so the previous frame leaves no trailing artifacts.
/// A missing anchor or unloaded asset silently skips its draw; mode off
/// leaves the surface cleared.
pub fn render(surface: &mut dyn RenderSurface, state: &TryOnState, anchors: &SmoothedAnchors) {
    surface.clear();

    match state.mode() {
        Mode::None => {}
        Mode::Earring => {
            if let Some(earring) = state.earring() {
                draw_earrings(surface, &earring, anchors);
            }
        }
        Mode::Necklace => {
            if let (Some(necklace), Some(chin)) = (state.necklace(), anchors.chin) {
                let (w, h) = NECKLACE_SIZE;
                surface.draw_image(&necklace, chin.x - NECKLACE_OFFSET_X, chin.y, w, h);
            }
        }
    }
}

fn draw_earrings(surface: &mut dyn RenderSurface, image: &Arc<JewelryImage>, anchors: &SmoothedAnchors) {
    let (w, h) = EARRING_SIZE;
    if let Some(left) = anchors.left {
        surface.draw_image(image, left.x - EARRING_LEFT_OFFSET_X, left.y, w, h);
    }
    if let Some(right) = anchors.right {
        surface.draw_image(image, right.x - EARRING_RIGHT_OFFSET_X, right.y, w, h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::JewelryCategory;
    use crate::overlay::Position;

    /// Records draw calls with a pointer identity for the image used.
    #[derive(Default)]
    struct RecordingSurface {
        cleared: u32,
        draws: Vec<(usize, f32, f32, f32, f32)>,
    }

    impl RenderSurface for RecordingSurface {
        fn clear(&mut self) {
            self.cleared += 1;
        }

        fn draw_image(&mut self, image: &JewelryImage, x: f32, y: f32, w: f32, h: f32) {
            self.draws.push((image as *const _ as usize, x, y, w, h));
        }
    }

    fn test_image() -> Arc<JewelryImage> {
        Arc::new(JewelryImage::placeholder(4, 4))
    }

    fn anchors(left: Option<(f32, f32)>, right: Option<(f32, f32)>, chin: Option<(f32, f32)>) -> SmoothedAnchors {
        let p = |xy: Option<(f32, f32)>| xy.map(|(x, y)| Position::new(x, y));
        SmoothedAnchors {
            left: p(left),
            right: p(right),
            chin: p(chin),
        }
    }

    #[test]
    fn earring_mode_draws_both_sides_at_fixed_offsets() {
        let mut state = TryOnState::new();
        state.set_mode(Mode::Earring);
        state.set_asset(JewelryCategory::Earring, test_image());

        let mut surface = RecordingSurface::default();
        render(
            &mut surface,
            &state,
            &anchors(Some((200.0, 150.0)), Some((400.0, 150.0)), None),
        );

        assert_eq!(surface.cleared, 1);
        let boxes: Vec<_> = surface.draws.iter().map(|d| (d.1, d.2, d.3, d.4)).collect();
        assert_eq!(
            boxes,
            vec![(140.0, 150.0, 100.0, 100.0), (380.0, 150.0, 100.0, 100.0)]
        );
    }

    #[test]
    fn missing_side_is_skipped_silently() {
        let mut state = TryOnState::new();
        state.set_mode(Mode::Earring);
        state.set_asset(JewelryCategory::Earring, test_image());

        let mut surface = RecordingSurface::default();
        render(&mut surface, &state, &anchors(None, Some((400.0, 150.0)), None));

        assert_eq!(surface.draws.len(), 1);
        assert_eq!(surface.draws[0].1, 380.0);
    }

    #[test]
    fn necklace_mode_draws_once_below_chin() {
        let mut state = TryOnState::new();
        state.set_mode(Mode::Necklace);
        state.set_asset(JewelryCategory::Necklace, test_image());

        let mut surface = RecordingSurface::default();
        render(&mut surface, &state, &anchors(None, None, Some((300.0, 400.0))));

        assert_eq!(surface.draws.len(), 1);
        let d = &surface.draws[0];
        assert_eq!((d.1, d.2, d.3, d.4), (200.0, 400.0, 200.0, 100.0));
    }

    #[test]
    fn mode_none_never_draws() {
        let mut state = TryOnState::new();
        state.set_asset(JewelryCategory::Earring, test_image());
        state.set_asset(JewelryCategory::Necklace, test_image());

        let mut surface = RecordingSurface::default();
        render(
            &mut surface,
            &state,
            &anchors(Some((1.0, 1.0)), Some((2.0, 2.0)), Some((3.0, 3.0))),
        );

        assert_eq!(surface.cleared, 1);
        assert!(surface.draws.is_empty());
    }

    #[test]
    fn unloaded_asset_leaves_surface_cleared() {
        let mut state = TryOnState::new();
        state.set_mode(Mode::Necklace);

        let mut surface = RecordingSurface::default();
        render(&mut surface, &state, &anchors(None, None, Some((300.0, 400.0))));

        assert_eq!(surface.cleared, 1);
        assert!(surface.draws.is_empty());
    }

    #[test]
    fn asset_swap_switches_every_subsequent_draw() {
        let mut state = TryOnState::new();
        state.set_mode(Mode::Earring);
        let old = test_image();
        let new = test_image();
        state.set_asset(JewelryCategory::Earring, old.clone());

        let frame = anchors(Some((200.0, 150.0)), Some((400.0, 150.0)), None);

        let mut surface = RecordingSurface::default();
        render(&mut surface, &state, &frame);
        let old_ptr = Arc::as_ptr(&old) as usize;
        assert!(surface.draws.iter().all(|d| d.0 == old_ptr));

        state.set_asset(JewelryCategory::Earring, new.clone());
        let mut surface = RecordingSurface::default();
        render(&mut surface, &state, &frame);
        let new_ptr = Arc::as_ptr(&new) as usize;
        assert_eq!(surface.draws.len(), 2);
        assert!(surface.draws.iter().all(|d| d.0 == new_ptr));
    }
}
