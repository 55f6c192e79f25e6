//! Software rasterizer: paints a laid-out document into an RGBA pixel buffer.

use flint_dom::ColorRgba;
use flint_dom::Document;

const CLEAR_COLOR: [u8; 4] = [255, 255, 255, 255];
const DEBUG_OUTLINE: [u8; 4] = [255, 64, 64, 255];

/// One frame's pixels, RGBA8 row-major. Replaced, never mutated in place,
/// each frame that paints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// A buffer cleared to the background color.
    pub fn cleared(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize * 4;
        let mut pixels = Vec::with_capacity(size);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&CLEAR_COLOR);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Fills an axis-aligned rectangle, clamped to the buffer, blending by
    /// source alpha.
    pub fn fill_rect(&mut self, left: f64, top: f64, right: f64, bottom: f64, color: [u8; 4]) {
        if color[3] == 0 {
            return;
        }

        let x0 = left.max(0.0).floor() as u32;
        let y0 = top.max(0.0).floor() as u32;
        let x1 = right.min(self.width as f64).ceil() as u32;
        let y1 = bottom.min(self.height as f64).ceil() as u32;

        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Draws a one-pixel rectangle outline, clamped to the buffer.
    pub fn stroke_rect(&mut self, left: f64, top: f64, right: f64, bottom: f64, color: [u8; 4]) {
        self.fill_rect(left, top, right, top + 1.0, color);
        self.fill_rect(left, bottom - 1.0, right, bottom, color);
        self.fill_rect(left, top, left + 1.0, bottom, color);
        self.fill_rect(right - 1.0, top, right, bottom, color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let slice = self.pixels.get(offset..offset + 4)?;
        Some([slice[0], slice[1], slice[2], slice[3]])
    }

    fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let Some(target) = self.pixels.get_mut(offset..offset + 4) else {
            return;
        };

        if color[3] == 255 {
            target.copy_from_slice(&color);
            return;
        }

        let alpha = color[3] as u32;
        let inverse = 255 - alpha;
        for channel in 0..3 {
            let blended = (color[channel] as u32 * alpha + target[channel] as u32 * inverse) / 255;
            target[channel] = blended as u8;
        }
        target[3] = 255;
    }
}

/// The paint collaborator contract: rasterize the document at the current
/// surface size, producing a fresh buffer.
pub trait PaintPass {
    fn paint(&mut self, document: &Document, width: u32, height: u32) -> PixelBuffer;
}

/// Paints node backgrounds in document order (later nodes paint over earlier
/// ones), offset by the document's vertical scroll.
///
/// Nodes without computed geometry are skipped, never painted. A document
/// without a live root yields a cleared buffer.
#[derive(Debug, Default)]
pub struct Painter;

impl PaintPass for Painter {
    fn paint(&mut self, document: &Document, width: u32, height: u32) -> PixelBuffer {
        let mut buffer = PixelBuffer::cleared(width, height);
        let Some(root) = document.root() else {
            return buffer;
        };

        let tree = document.tree();
        for id in tree.descendants(root) {
            let Some(render_box) = tree.render_box(id) else {
                continue;
            };

            let top = render_box.top - document.scroll_y;
            let bottom = render_box.bottom() - document.scroll_y;

            let background = tree
                .style(id)
                .and_then(|style| style.background)
                .map(ColorRgba::to_rgba8);
            if let Some(color) = background {
                buffer.fill_rect(render_box.left, top, render_box.right(), bottom, color);
            }

            if document.debug {
                buffer.stroke_rect(render_box.left, top, render_box.right(), bottom, DEBUG_OUTLINE);
            }
        }

        buffer
    }
}
