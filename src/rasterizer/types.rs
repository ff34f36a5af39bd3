//! Core types shared by the rasterizer and the vertex processor

use serde::{Deserialize, Serialize};

use crate::{MAX_AVARS, MAX_PVARS};

/// Screen-space vertex consumed by the rasterizer
///
/// The vertex processor produces these in clip space (as vertex shader
/// output) and transforms them in place to screen space before handing
/// them to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    /// Affine variables (linearly interpolated in screen space)
    pub avar: [f32; MAX_AVARS],
    /// Perspective variables (interpolated with 1/w correction)
    pub pvar: [f32; MAX_PVARS],
}

impl Default for RasterizerVertex {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
            avar: [0.0; MAX_AVARS],
            pvar: [0.0; MAX_PVARS],
        }
    }
}

impl RasterizerVertex {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w, ..Default::default() }
    }

    /// Vertex at a screen position with z = 0 and w = 1
    pub fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0, 1.0)
    }

    /// Builder-style setter for the leading affine variables
    pub fn with_avars(mut self, vars: &[f32]) -> Self {
        self.avar[..vars.len()].copy_from_slice(vars);
        self
    }

    /// Builder-style setter for the leading perspective variables
    pub fn with_pvars(mut self, vars: &[f32]) -> Self {
        self.pvar[..vars.len()].copy_from_slice(vars);
        self
    }

    /// Linear interpolation of position and every variable
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let s = 1.0 - t;
        let mut out = Self::new(
            self.x * s + other.x * t,
            self.y * s + other.y * t,
            self.z * s + other.z * t,
            self.w * s + other.w * t,
        );
        for i in 0..MAX_AVARS {
            out.avar[i] = self.avar[i] * s + other.avar[i] * t;
        }
        for i in 0..MAX_PVARS {
            out.pvar[i] = self.pvar[i] * s + other.pvar[i] * t;
        }
        out
    }
}

/// Per-pixel interpolated state handed to the pixel callback
#[derive(Debug, Clone, Copy)]
pub struct PixelData {
    pub x: i32,
    pub y: i32,
    pub z: f32,
    pub w: f32,
    pub invw: f32,
    pub avar: [f32; MAX_AVARS],
    pub pvar: [f32; MAX_PVARS],
    /// Interpolated pvar/w plane values, before multiplying by w
    pub(crate) pvar_temp: [f32; MAX_PVARS],
}

impl Default for PixelData {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0.0,
            w: 0.0,
            invw: 0.0,
            avar: [0.0; MAX_AVARS],
            pvar: [0.0; MAX_PVARS],
            pvar_temp: [0.0; MAX_PVARS],
        }
    }
}

/// Scissor rectangle; `max_x`/`max_y` are exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScissorRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl ScissorRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x.saturating_add(width),
            max_y: y.saturating_add(height),
        }
    }

    /// Rect that never rejects anything
    pub const UNBOUNDED: ScissorRect = ScissorRect {
        min_x: i32::MIN,
        min_y: i32::MIN,
        max_x: i32::MAX,
        max_y: i32::MAX,
    };

    /// Test a (possibly fractional) position
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x as f32 && x < self.max_x as f32 && y >= self.min_y as f32 && y < self.max_y as f32
    }

    pub fn contains_pixel(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// True if the whole `size`x`size` square at (x, y) is inside
    pub fn contains_square(&self, x: i32, y: i32, size: i32) -> bool {
        x >= self.min_x && y >= self.min_y && x.saturating_add(size) <= self.max_x && y.saturating_add(size) <= self.max_y
    }

    pub fn width(&self) -> i32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> i32 {
        self.max_y.saturating_sub(self.min_y)
    }
}

/// Triangle fill strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterMode {
    /// Scanlines above and below the middle vertex
    #[default]
    Span,
    /// 8x8 tiles classified by their corners
    Block,
    /// Block for squarish triangles, span for long thin ones
    Adaptive,
}
