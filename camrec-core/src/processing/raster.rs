//! Fixed-size RGBA raster the compositor draws into and encoders read from.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::media::VideoFrame;
use crate::processing::overlay::OverlayImage;

/// Surface shared between the compositor (writer) and the raster stream (reader).
pub type SharedSurface = Arc<Mutex<RasterSurface>>;

#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    frame_index: u64,
}

impl RasterSurface {
    /// A transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            frame_index: 0,
        }
    }

    pub fn shared(width: u32, height: u32) -> SharedSurface {
        Arc::new(Mutex::new(Self::new(width, height)))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames presented so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Draw `frame` scaled (nearest neighbour) into the destination rectangle, replacing pixels.
    pub fn draw_frame(&mut self, frame: &VideoFrame, dx: u32, dy: u32, dw: u32, dh: u32) {
        if frame.is_empty() {
            return;
        }
        self.blit(frame.width, frame.height, &frame.rgba, dx, dy, dw, dh, false);
    }

    /// Alpha-blend `image` scaled into the destination rectangle.
    pub fn draw_image(&mut self, image: &OverlayImage, dx: u32, dy: u32, dw: u32, dh: u32) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        self.blit(image.width, image.height, &image.rgba, dx, dy, dw, dh, true);
    }

    /// Mark the current contents as a new frame for the raster stream.
    pub fn present(&mut self) -> u64 {
        self.frame_index += 1;
        self.frame_index
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> VideoFrame {
        VideoFrame::new(self.width, self.height, self.pixels.clone(), self.frame_index)
    }

    #[allow(clippy::too_many_arguments)]
    fn blit(&mut self, sw: u32, sh: u32, src: &[u8], dx: u32, dy: u32, dw: u32, dh: u32, blend: bool) {
        if dw == 0 || dh == 0 {
            return;
        }
        let x_end = (dx as u64 + dw as u64).min(self.width as u64) as u32;
        let y_end = (dy as u64 + dh as u64).min(self.height as u64) as u32;

        for y in dy..y_end {
            let sy = ((y - dy) as u64 * sh as u64 / dh as u64) as usize;
            for x in dx..x_end {
                let sx = ((x - dx) as u64 * sw as u64 / dw as u64) as usize;
                let s = (sy * sw as usize + sx) * 4;
                let d = (y as usize * self.width as usize + x as usize) * 4;
                let (Some(src_px), true) = (src.get(s..s + 4), d + 4 <= self.pixels.len()) else {
                    continue;
                };

                if !blend || src_px[3] == 255 {
                    self.pixels[d..d + 4].copy_from_slice(src_px);
                    continue;
                }

                let alpha = src_px[3] as u32;
                let inv = 255 - alpha;
                for c in 0..3 {
                    let blended = (src_px[c] as u32 * alpha + self.pixels[d + c] as u32 * inv) / 255;
                    self.pixels[d + c] = blended as u8;
                }
                self.pixels[d + 3] = (alpha + self.pixels[d + 3] as u32 * inv / 255).min(255) as u8;
            }
        }
    }
}
