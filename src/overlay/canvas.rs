//! CPU overlay surface
//!
//! An RGBA pixel buffer the compositor draws into. The live pipeline
//! uploads it as a wgpu texture each frame; the snapshot path gives it
//! the video frame as background so clear-then-draw produces the final
//! still directly.

use crate::assets::JewelryImage;

use super::compositor::RenderSurface;

/// RGBA8 overlay canvas.
pub struct OverlayCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// When set, `clear` restores this image instead of transparency.
    background: Option<Vec<u8>>,
}

impl OverlayCanvas {
    /// Create a transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; (width * height * 4) as usize],
            background: None,
        }
    }

    /// Create a canvas whose base state is `background` (RGBA, same
    /// dimensions). Used by the snapshot exporter.
    pub fn with_background(width: u32, height: u32, background: Vec<u8>) -> Result<Self, String> {
        let expected = (width * height * 4) as usize;
        if background.len() != expected {
            return Err(format!(
                "Background size mismatch: got {} bytes, expected {}",
                background.len(),
                expected
            ));
        }
        let mut canvas = Self {
            width,
            height,
            pixels: background.clone(),
            background: Some(background),
        };
        canvas.clear();
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

impl RenderSurface for OverlayCanvas {
    fn clear(&mut self) {
        match &self.background {
            Some(bg) => self.pixels.copy_from_slice(bg),
            None => self.pixels.fill(0),
        }
    }

    fn draw_image(&mut self, image: &JewelryImage, x: f32, y: f32, w: f32, h: f32) {
        let dst_w = w.round() as i64;
        let dst_h = h.round() as i64;
        if dst_w <= 0 || dst_h <= 0 || image.width == 0 || image.height == 0 {
            return;
        }
        let x0 = x.round() as i64;
        let y0 = y.round() as i64;

        let x_ratio = image.width as f32 / dst_w as f32;
        let y_ratio = image.height as f32 / dst_h as f32;

        for dy in 0..dst_h {
            let py = y0 + dy;
            if py < 0 || py >= self.height as i64 {
                continue;
            }
            let src_y = ((dy as f32 * y_ratio) as u32).min(image.height - 1);
            for dx in 0..dst_w {
                let px = x0 + dx;
                if px < 0 || px >= self.width as i64 {
                    continue;
                }
                let src_x = ((dx as f32 * x_ratio) as u32).min(image.width - 1);
                let src_idx = ((src_y * image.width + src_x) * 4) as usize;
                let dst_idx = ((py as u32 * self.width + px as u32) * 4) as usize;

                let sa = image.pixels[src_idx + 3] as u32;
                if sa == 0 {
                    continue;
                }
                if sa == 255 {
                    self.pixels[dst_idx..dst_idx + 4]
                        .copy_from_slice(&image.pixels[src_idx..src_idx + 4]);
                    continue;
                }
                // src-over blend
                for c in 0..3 {
                    let s = image.pixels[src_idx + c] as u32;
                    let d = self.pixels[dst_idx + c] as u32;
                    self.pixels[dst_idx + c] = ((s * sa + d * (255 - sa)) / 255) as u8;
                }
                let da = self.pixels[dst_idx + 3] as u32;
                self.pixels[dst_idx + 3] = (sa + da * (255 - sa) / 255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> JewelryImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        JewelryImage {
            width,
            height,
            pixels,
        }
    }

    fn pixel(canvas: &OverlayCanvas, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * canvas.width() + x) * 4) as usize;
        canvas.pixels()[idx..idx + 4].try_into().unwrap()
    }

    #[test]
    fn clear_resets_to_transparent() {
        let mut canvas = OverlayCanvas::new(8, 8);
        canvas.draw_image(&solid(2, 2, [255, 0, 0, 255]), 0.0, 0.0, 4.0, 4.0);
        assert_eq!(pixel(&canvas, 1, 1), [255, 0, 0, 255]);
        canvas.clear();
        assert_eq!(pixel(&canvas, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn clear_restores_background() {
        let bg = vec![10u8; 4 * 4 * 4];
        let mut canvas = OverlayCanvas::with_background(4, 4, bg).unwrap();
        canvas.draw_image(&solid(2, 2, [255, 255, 255, 255]), 0.0, 0.0, 4.0, 4.0);
        canvas.clear();
        assert_eq!(pixel(&canvas, 0, 0), [10, 10, 10, 10]);
    }

    #[test]
    fn draw_scales_into_requested_box() {
        let mut canvas = OverlayCanvas::new(16, 16);
        canvas.draw_image(&solid(2, 2, [0, 255, 0, 255]), 4.0, 4.0, 8.0, 8.0);
        assert_eq!(pixel(&canvas, 4, 4), [0, 255, 0, 255]);
        assert_eq!(pixel(&canvas, 11, 11), [0, 255, 0, 255]);
        assert_eq!(pixel(&canvas, 3, 4), [0, 0, 0, 0]);
        assert_eq!(pixel(&canvas, 12, 11), [0, 0, 0, 0]);
    }

    #[test]
    fn draw_clips_at_canvas_edges() {
        let mut canvas = OverlayCanvas::new(8, 8);
        // Partially off the left/top edge; must not panic and must fill
        // only the visible quadrant.
        canvas.draw_image(&solid(2, 2, [0, 0, 255, 255]), -4.0, -4.0, 8.0, 8.0);
        assert_eq!(pixel(&canvas, 0, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&canvas, 3, 3), [0, 0, 255, 255]);
        assert_eq!(pixel(&canvas, 4, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn transparent_source_pixels_leave_destination() {
        let mut canvas = OverlayCanvas::new(4, 4);
        canvas.draw_image(&solid(2, 2, [255, 0, 0, 255]), 0.0, 0.0, 4.0, 4.0);
        canvas.draw_image(&solid(2, 2, [0, 255, 0, 0]), 0.0, 0.0, 4.0, 4.0);
        assert_eq!(pixel(&canvas, 1, 1), [255, 0, 0, 255]);
    }
}
