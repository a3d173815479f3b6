//! Try-on mode and asset bindings
//!
//! Owned by the app and passed by reference into the compositor, so the
//! render path reads the current bindings at draw time with no ambient
//! shared state. All writes are last-write-wins on the render thread.

use std::sync::Arc;

use crate::assets::{JewelryCategory, JewelryImage};

/// Active try-on mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// No overlay drawn
    #[default]
    None,
    Earring,
    Necklace,
}

/// Current mode plus the selected image per jewelry category.
#[derive(Clone, Debug, Default)]
pub struct TryOnState {
    mode: Mode,
    earring: Option<Arc<JewelryImage>>,
    necklace: Option<Arc<JewelryImage>>,
}

impl TryOnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Replace the active asset for `category`. The old image is simply
    /// dropped; the compositor picks up the new binding on its next read.
    pub fn set_asset(&mut self, category: JewelryCategory, image: Arc<JewelryImage>) {
        match category {
            JewelryCategory::Earring => self.earring = Some(image),
            JewelryCategory::Necklace => self.necklace = Some(image),
        }
    }

    pub fn earring(&self) -> Option<Arc<JewelryImage>> {
        self.earring.clone()
    }

    pub fn necklace(&self) -> Option<Arc<JewelryImage>> {
        self.necklace.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_off() {
        let state = TryOnState::new();
        assert_eq!(state.mode(), Mode::None);
        assert!(state.earring().is_none());
        assert!(state.necklace().is_none());
    }

    #[test]
    fn asset_replacement_is_last_write_wins() {
        let mut state = TryOnState::new();
        let first = Arc::new(JewelryImage::placeholder(2, 2));
        let second = Arc::new(JewelryImage::placeholder(2, 2));

        state.set_asset(JewelryCategory::Earring, first.clone());
        state.set_asset(JewelryCategory::Earring, second.clone());

        assert!(Arc::ptr_eq(&state.earring().unwrap(), &second));
        assert!(state.necklace().is_none());
    }
}
