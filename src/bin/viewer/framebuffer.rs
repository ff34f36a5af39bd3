//! RGBA + depth target written by the pixel callback

use std::path::Path;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Per-channel multiply by 0.0-1.0 factors
    pub fn modulate(self, r: f32, g: f32, b: f32) -> Self {
        let m = |c: u8, f: f32| (c as f32 * f.clamp(0.0, 1.0)) as u8;
        Self {
            r: m(self.r, r),
            g: m(self.g, g),
            b: m(self.b, b),
            a: self.a,
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

pub struct Framebuffer {
    pub pixels: Vec<u8>,   // RGBA, 4 bytes per pixel
    pub zbuffer: Vec<f32>, // Window-space depth
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            zbuffer: vec![f32::MAX; width * height],
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
        self.zbuffer.fill(f32::MAX);
    }

    /// Depth-tested write; returns whether the pixel was written
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, z: f32, color: Color) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        let idx = y as usize * self.width + x as usize;
        if z >= self.zbuffer[idx] {
            return false;
        }
        self.zbuffer[idx] = z;
        self.pixels[idx * 4..idx * 4 + 4].copy_from_slice(&color.to_bytes());
        true
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
        image::save_buffer(
            path,
            &self.pixels,
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgba8,
        )
    }
}
