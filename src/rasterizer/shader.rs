//! Pixel shader record and the tile/span fill loops
//!
//! The shader declares which quantities a draw needs interpolated and
//! owns the per-pixel callback. Only the declared quantities are
//! evaluated and stepped.

use std::fmt;

use super::equations::{EdgeData, TriangleEquations};
use super::types::{PixelData, ScissorRect};
use crate::{BLOCK_SIZE, MAX_AVARS, MAX_PVARS};

/// Per-pixel callback
pub type DrawPixelFn<'a> = Box<dyn FnMut(&PixelData) + 'a>;

pub struct PixelShader<'a> {
    /// Interpolate z
    pub interpolate_z: bool,
    /// Interpolate w (implied when any perspective variable is used)
    pub interpolate_w: bool,
    /// Number of affine variables to interpolate
    pub avar_count: usize,
    /// Number of perspective variables to interpolate
    pub pvar_count: usize,
    draw_pixel: Option<DrawPixelFn<'a>>,
}

impl fmt::Debug for PixelShader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelShader")
            .field("interpolate_z", &self.interpolate_z)
            .field("interpolate_w", &self.interpolate_w)
            .field("avar_count", &self.avar_count)
            .field("pvar_count", &self.pvar_count)
            .field("has_callback", &self.draw_pixel.is_some())
            .finish()
    }
}

impl<'a> PixelShader<'a> {
    pub fn new<F>(interpolate_z: bool, interpolate_w: bool, avar_count: usize, pvar_count: usize, callback: F) -> Self
    where
        F: FnMut(&PixelData) + 'a,
    {
        let mut shader = Self::empty(interpolate_z, interpolate_w, avar_count, pvar_count);
        shader.draw_pixel = Some(Box::new(callback));
        shader
    }

    /// Shader with no callback: pixels are interpolated but not delivered
    pub fn empty(interpolate_z: bool, interpolate_w: bool, avar_count: usize, pvar_count: usize) -> Self {
        assert!(avar_count <= MAX_AVARS, "avar_count {} exceeds MAX_AVARS", avar_count);
        assert!(pvar_count <= MAX_PVARS, "pvar_count {} exceeds MAX_PVARS", pvar_count);
        Self {
            interpolate_z,
            interpolate_w,
            avar_count,
            pvar_count,
            draw_pixel: None,
        }
    }

    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&PixelData) + 'a,
    {
        self.draw_pixel = Some(Box::new(callback));
    }

    fn needs_invw(&self) -> bool {
        self.interpolate_w || self.pvar_count > 0
    }

    /// Deliver one pixel to the callback
    #[inline]
    pub fn draw_pixel(&mut self, p: &PixelData) {
        if let Some(cb) = self.draw_pixel.as_mut() {
            cb(p);
        }
    }

    /// Evaluate every declared quantity at (x, y)
    pub fn init_pixel(&self, eqn: &TriangleEquations, x: f32, y: f32) -> PixelData {
        let mut p = PixelData::default();
        if self.interpolate_z {
            p.z = eqn.z.evaluate(x, y);
        }
        if self.needs_invw() {
            p.invw = eqn.invw.evaluate(x, y);
            p.w = 1.0 / p.invw;
        }
        for i in 0..self.avar_count {
            p.avar[i] = eqn.avar[i].evaluate(x, y);
        }
        for i in 0..self.pvar_count {
            p.pvar_temp[i] = eqn.pvar[i].evaluate(x, y);
            p.pvar[i] = p.pvar_temp[i] * p.w;
        }
        p
    }

    #[inline]
    pub fn step_pixel_x(&self, p: &mut PixelData, eqn: &TriangleEquations) {
        if self.interpolate_z {
            p.z = eqn.z.step_x(p.z);
        }
        if self.needs_invw() {
            p.invw = eqn.invw.step_x(p.invw);
            p.w = 1.0 / p.invw;
        }
        for i in 0..self.avar_count {
            p.avar[i] = eqn.avar[i].step_x(p.avar[i]);
        }
        for i in 0..self.pvar_count {
            p.pvar_temp[i] = eqn.pvar[i].step_x(p.pvar_temp[i]);
            p.pvar[i] = p.pvar_temp[i] * p.w;
        }
    }

    #[inline]
    pub fn step_pixel_y(&self, p: &mut PixelData, eqn: &TriangleEquations) {
        if self.interpolate_z {
            p.z = eqn.z.step_y(p.z);
        }
        if self.needs_invw() {
            p.invw = eqn.invw.step_y(p.invw);
            p.w = 1.0 / p.invw;
        }
        for i in 0..self.avar_count {
            p.avar[i] = eqn.avar[i].step_y(p.avar[i]);
        }
        for i in 0..self.pvar_count {
            p.pvar_temp[i] = eqn.pvar[i].step_y(p.pvar_temp[i]);
            p.pvar[i] = p.pvar_temp[i] * p.w;
        }
    }

    /// Shade a BLOCK_SIZE x BLOCK_SIZE tile whose top-left pixel is (x, y).
    ///
    /// `test_edges = false` is only valid when the tile is known to be
    /// fully covered.
    pub fn draw_block(&mut self, eqn: &TriangleEquations, x: i32, y: i32, test_edges: bool) {
        self.draw_block_clipped(eqn, x, y, test_edges, &ScissorRect::UNBOUNDED);
    }

    /// Like [`draw_block`](Self::draw_block), but pixels outside `clip` are
    /// skipped.
    pub fn draw_block_clipped(&mut self, eqn: &TriangleEquations, x: i32, y: i32, test_edges: bool, clip: &ScissorRect) {
        let test_clip = !clip.contains_square(x, y, BLOCK_SIZE);

        let xf = x as f32 + 0.5;
        let yf = y as f32 + 0.5;

        let mut po = self.init_pixel(eqn, xf, yf);
        let mut eo = if test_edges { EdgeData::new(eqn, xf, yf) } else { EdgeData::default() };

        for yy in y..y.saturating_add(BLOCK_SIZE) {
            let mut pi = po;
            let mut ei = eo;

            for xx in x..x.saturating_add(BLOCK_SIZE) {
                if (!test_edges || ei.test(eqn)) && (!test_clip || clip.contains_pixel(xx, yy)) {
                    pi.x = xx;
                    pi.y = yy;
                    self.draw_pixel(&pi);
                }

                self.step_pixel_x(&mut pi, eqn);
                if test_edges {
                    ei.step_x(eqn);
                }
            }

            self.step_pixel_y(&mut po, eqn);
            if test_edges {
                eo.step_y(eqn);
            }
        }
    }

    /// Shade the horizontal run `[x, x2)` on row `y` without edge tests
    pub fn draw_span(&mut self, eqn: &TriangleEquations, x: i32, y: i32, x2: i32) {
        let mut p = self.init_pixel(eqn, x as f32 + 0.5, y as f32 + 0.5);
        p.y = y;

        for xx in x..x2 {
            p.x = xx;
            self.draw_pixel(&p);
            self.step_pixel_x(&mut p, eqn);
        }
    }
}
