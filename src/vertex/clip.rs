//! Homogeneous clipping against the six clip-volume planes
//!
//! A vertex is inside when `-w <= x, y, z <= w`. Each plane is written as
//! `a*x + b*y + c*z + d*w >= 0`.

use bitflags::bitflags;

use super::shader::VertexShaderOutput;

bitflags! {
    /// Clip planes a vertex violates
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ClipMask: u8 {
        const POS_X = 1 << 0;
        const NEG_X = 1 << 1;
        const POS_Y = 1 << 2;
        const NEG_Y = 1 << 3;
        const POS_Z = 1 << 4;
        const NEG_Z = 1 << 5;
    }
}

impl ClipMask {
    /// Mask of planes violated by `v`
    pub fn of(v: &VertexShaderOutput) -> Self {
        let mut mask = ClipMask::empty();
        mask.set(ClipMask::POS_X, v.w - v.x < 0.0);
        mask.set(ClipMask::NEG_X, v.x + v.w < 0.0);
        mask.set(ClipMask::POS_Y, v.w - v.y < 0.0);
        mask.set(ClipMask::NEG_Y, v.y + v.w < 0.0);
        mask.set(ClipMask::POS_Z, v.w - v.z < 0.0);
        mask.set(ClipMask::NEG_Z, v.z + v.w < 0.0);
        mask
    }
}

/// Homogeneous half-space `a*x + b*y + c*z + d*w >= 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl ClipPlane {
    pub const POS_X: ClipPlane = ClipPlane::new(-1.0, 0.0, 0.0, 1.0);
    pub const NEG_X: ClipPlane = ClipPlane::new(1.0, 0.0, 0.0, 1.0);
    pub const POS_Y: ClipPlane = ClipPlane::new(0.0, -1.0, 0.0, 1.0);
    pub const NEG_Y: ClipPlane = ClipPlane::new(0.0, 1.0, 0.0, 1.0);
    pub const POS_Z: ClipPlane = ClipPlane::new(0.0, 0.0, -1.0, 1.0);
    pub const NEG_Z: ClipPlane = ClipPlane::new(0.0, 0.0, 1.0, 1.0);

    /// Every plane with its mask bit, in clipping order
    pub const ALL: [(ClipMask, ClipPlane); 6] = [
        (ClipMask::POS_X, ClipPlane::POS_X),
        (ClipMask::NEG_X, ClipPlane::NEG_X),
        (ClipMask::POS_Y, ClipPlane::POS_Y),
        (ClipMask::NEG_Y, ClipPlane::NEG_Y),
        (ClipMask::POS_Z, ClipPlane::POS_Z),
        (ClipMask::NEG_Z, ClipPlane::NEG_Z),
    ];

    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    /// Signed distance; negative means outside
    #[inline]
    pub fn distance(&self, v: &VertexShaderOutput) -> f32 {
        self.a * v.x + self.b * v.y + self.c * v.z + self.d * v.w
    }

    /// Planes selected by `mask`, in clipping order
    pub fn selected(mask: ClipMask) -> impl Iterator<Item = &'static ClipPlane> {
        static PLANES: [(ClipMask, ClipPlane); 6] = ClipPlane::ALL;
        PLANES.iter().filter(move |(bit, _)| mask.contains(*bit)).map(|(_, plane)| plane)
    }
}

/// Parametric clipper for one segment
#[derive(Debug, Clone, Copy)]
pub struct LineClipper<'v> {
    v0: &'v VertexShaderOutput,
    v1: &'v VertexShaderOutput,
    pub t0: f32,
    pub t1: f32,
    pub fully_clipped: bool,
}

impl<'v> LineClipper<'v> {
    pub fn new(v0: &'v VertexShaderOutput, v1: &'v VertexShaderOutput) -> Self {
        Self {
            v0,
            v1,
            t0: 0.0,
            t1: 1.0,
            fully_clipped: false,
        }
    }

    /// Narrow `[t0, t1]` to the part of the segment inside `plane`
    pub fn clip_to_plane(&mut self, plane: &ClipPlane) {
        if self.fully_clipped {
            return;
        }

        let dp0 = plane.distance(self.v0);
        let dp1 = plane.distance(self.v1);

        let dp0_neg = dp0 < 0.0;
        let dp1_neg = dp1 < 0.0;

        if dp0_neg && dp1_neg {
            self.fully_clipped = true;
            return;
        }

        if dp0_neg {
            self.t0 = self.t0.max(-dp0 / (dp1 - dp0));
        } else if dp1_neg {
            self.t1 = self.t1.min(dp0 / (dp0 - dp1));
        }

        // Two planes cut the segment from opposite ends past each other
        if self.t0 > self.t1 {
            self.fully_clipped = true;
        }
    }

    pub fn clip_to_mask(&mut self, mask: ClipMask) {
        for plane in ClipPlane::selected(mask) {
            self.clip_to_plane(plane);
        }
    }

    /// Clipped endpoints; meaningless once fully clipped
    pub fn endpoints(&self) -> (VertexShaderOutput, VertexShaderOutput) {
        (self.v0.lerp(self.v1, self.t0), self.v0.lerp(self.v1, self.t1))
    }
}

/// Sutherland-Hodgman clipper over indices into a shared vertex buffer.
///
/// Intersection vertices are appended to the buffer passed to
/// [`clip_to_plane`](Self::clip_to_plane); indices already handed out stay
/// valid because the buffer only grows.
#[derive(Debug, Clone, Default)]
pub struct PolyClipper {
    indices_in: Vec<usize>,
    indices_out: Vec<usize>,
}

impl PolyClipper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over with the triangle `(i0, i1, i2)`
    pub fn init(&mut self, i0: usize, i1: usize, i2: usize) {
        self.indices_in.clear();
        self.indices_out.clear();
        self.indices_in.extend_from_slice(&[i0, i1, i2]);
    }

    pub fn fully_clipped(&self) -> bool {
        self.indices_in.len() < 3
    }

    /// Current polygon, in winding order
    pub fn indices(&self) -> &[usize] {
        &self.indices_in
    }

    pub fn clip_to_plane(&mut self, vertices: &mut Vec<VertexShaderOutput>, plane: &ClipPlane) {
        if self.fully_clipped() {
            return;
        }

        self.indices_out.clear();

        let first = self.indices_in[0];
        self.indices_in.push(first);

        let mut idx_prev = first;
        let mut dp_prev = plane.distance(&vertices[idx_prev]);

        for i in 1..self.indices_in.len() {
            let idx = self.indices_in[i];
            let dp = plane.distance(&vertices[idx]);

            if dp_prev >= 0.0 {
                self.indices_out.push(idx_prev);
            }

            if sign(dp) != sign(dp_prev) {
                let t = if dp < 0.0 {
                    dp_prev / (dp_prev - dp)
                } else {
                    -dp_prev / (dp - dp_prev)
                };
                let v = vertices[idx_prev].lerp(&vertices[idx], t);
                vertices.push(v);
                self.indices_out.push(vertices.len() - 1);
            }

            idx_prev = idx;
            dp_prev = dp;
        }

        std::mem::swap(&mut self.indices_in, &mut self.indices_out);
    }

    pub fn clip_to_mask(&mut self, vertices: &mut Vec<VertexShaderOutput>, mask: ClipMask) {
        for plane in ClipPlane::selected(mask) {
            self.clip_to_plane(vertices, plane);
        }
    }
}

fn sign(v: f32) -> i8 {
    (v > 0.0) as i8 - (v < 0.0) as i8
}
