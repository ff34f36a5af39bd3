//! Edge and parameter equations
//!
//! Both are affine functions `a*x + b*y + c` of screen position. Edge
//! equations classify a point against one triangle edge; parameter
//! equations reproduce a per-vertex value anywhere inside the triangle.
//! Stepping by one pixel is a single add, so inner loops never
//! re-evaluate the full function.

use super::types::RasterizerVertex;
use crate::{MAX_AVARS, MAX_PVARS};

/// Signed line equation through two vertices
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeEquation {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    /// Decides points lying exactly on the edge
    pub tie: bool,
}

impl EdgeEquation {
    pub fn new(v0: &RasterizerVertex, v1: &RasterizerVertex) -> Self {
        let a = v0.y - v1.y;
        let b = v1.x - v0.x;
        let c = -(a * (v0.x + v1.x) + b * (v0.y + v1.y)) / 2.0;
        let tie = if a != 0.0 { a > 0.0 } else { b > 0.0 };
        Self { a, b, c, tie }
    }

    #[inline]
    pub fn evaluate(&self, x: f32, y: f32) -> f32 {
        self.a * x + self.b * y + self.c
    }

    /// Inside test for an already evaluated value
    #[inline]
    pub fn test_value(&self, v: f32) -> bool {
        v > 0.0 || (v == 0.0 && self.tie)
    }

    #[inline]
    pub fn test_point(&self, x: f32, y: f32) -> bool {
        self.test_value(self.evaluate(x, y))
    }

    #[inline]
    pub fn step_x(&self, v: f32) -> f32 {
        v + self.a
    }

    #[inline]
    pub fn step_x2(&self, v: f32, step_size: f32) -> f32 {
        v + self.a * step_size
    }

    #[inline]
    pub fn step_y(&self, v: f32) -> f32 {
        v + self.b
    }

    #[inline]
    pub fn step_y2(&self, v: f32, step_size: f32) -> f32 {
        v + self.b * step_size
    }
}

/// Affine function interpolating one quantity across a triangle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterEquation {
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl ParameterEquation {
    /// Fit the plane through values `p0..p2` at the three vertices.
    ///
    /// `e0` is the edge opposite vertex 0 (and so on); `factor` is
    /// `1 / area2`.
    pub fn new(
        p0: f32,
        p1: f32,
        p2: f32,
        e0: &EdgeEquation,
        e1: &EdgeEquation,
        e2: &EdgeEquation,
        factor: f32,
    ) -> Self {
        Self {
            a: factor * (p0 * e0.a + p1 * e1.a + p2 * e2.a),
            b: factor * (p0 * e0.b + p1 * e1.b + p2 * e2.b),
            c: factor * (p0 * e0.c + p1 * e1.c + p2 * e2.c),
        }
    }

    #[inline]
    pub fn evaluate(&self, x: f32, y: f32) -> f32 {
        self.a * x + self.b * y + self.c
    }

    #[inline]
    pub fn step_x(&self, v: f32) -> f32 {
        v + self.a
    }

    #[inline]
    pub fn step_x2(&self, v: f32, step_size: f32) -> f32 {
        v + self.a * step_size
    }

    #[inline]
    pub fn step_y(&self, v: f32) -> f32 {
        v + self.b
    }

    #[inline]
    pub fn step_y2(&self, v: f32, step_size: f32) -> f32 {
        v + self.b * step_size
    }
}

/// Everything needed to rasterize one triangle
#[derive(Debug, Clone)]
pub struct TriangleEquations {
    /// Twice the signed area; always positive once constructed
    pub area2: f32,
    pub e0: EdgeEquation,
    pub e1: EdgeEquation,
    pub e2: EdgeEquation,
    pub z: ParameterEquation,
    pub invw: ParameterEquation,
    pub avar: [ParameterEquation; MAX_AVARS],
    pub pvar: [ParameterEquation; MAX_PVARS],
}

impl TriangleEquations {
    /// Build the equations, or `None` for degenerate and back-facing
    /// triangles (`area2 <= 0`).
    ///
    /// Perspective variables are fitted as `pvar / w` so that dividing the
    /// interpolated value by the interpolated `1 / w` is perspective-correct.
    pub fn new(
        v0: &RasterizerVertex,
        v1: &RasterizerVertex,
        v2: &RasterizerVertex,
        avar_count: usize,
        pvar_count: usize,
    ) -> Option<Self> {
        let e0 = EdgeEquation::new(v1, v2);
        let e1 = EdgeEquation::new(v2, v0);
        let e2 = EdgeEquation::new(v0, v1);

        let area2 = e0.c + e1.c + e2.c;

        // NaN lands here too
        if !(area2 > 0.0) {
            return None;
        }

        let factor = 1.0 / area2;
        let plane = |p0: f32, p1: f32, p2: f32| ParameterEquation::new(p0, p1, p2, &e0, &e1, &e2, factor);

        let invw0 = 1.0 / v0.w;
        let invw1 = 1.0 / v1.w;
        let invw2 = 1.0 / v2.w;

        let mut avar = [ParameterEquation::default(); MAX_AVARS];
        for (i, eq) in avar.iter_mut().enumerate().take(avar_count) {
            *eq = plane(v0.avar[i], v1.avar[i], v2.avar[i]);
        }

        let mut pvar = [ParameterEquation::default(); MAX_PVARS];
        for (i, eq) in pvar.iter_mut().enumerate().take(pvar_count) {
            *eq = plane(v0.pvar[i] * invw0, v1.pvar[i] * invw1, v2.pvar[i] * invw2);
        }

        Some(Self {
            area2,
            z: plane(v0.z, v1.z, v2.z),
            invw: plane(invw0, invw1, invw2),
            avar,
            pvar,
            e0,
            e1,
            e2,
        })
    }

    /// Test a point against all three edges
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.e0.test_point(x, y) && self.e1.test_point(x, y) && self.e2.test_point(x, y)
    }
}

/// Evaluated values of the three edge equations at one sample
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeData {
    pub ev0: f32,
    pub ev1: f32,
    pub ev2: f32,
}

impl EdgeData {
    pub fn new(eqn: &TriangleEquations, x: f32, y: f32) -> Self {
        Self {
            ev0: eqn.e0.evaluate(x, y),
            ev1: eqn.e1.evaluate(x, y),
            ev2: eqn.e2.evaluate(x, y),
        }
    }

    #[inline]
    pub fn step_x(&mut self, eqn: &TriangleEquations) {
        self.ev0 = eqn.e0.step_x(self.ev0);
        self.ev1 = eqn.e1.step_x(self.ev1);
        self.ev2 = eqn.e2.step_x(self.ev2);
    }

    #[inline]
    pub fn step_x2(&mut self, eqn: &TriangleEquations, step_size: f32) {
        self.ev0 = eqn.e0.step_x2(self.ev0, step_size);
        self.ev1 = eqn.e1.step_x2(self.ev1, step_size);
        self.ev2 = eqn.e2.step_x2(self.ev2, step_size);
    }

    #[inline]
    pub fn step_y(&mut self, eqn: &TriangleEquations) {
        self.ev0 = eqn.e0.step_y(self.ev0);
        self.ev1 = eqn.e1.step_y(self.ev1);
        self.ev2 = eqn.e2.step_y(self.ev2);
    }

    #[inline]
    pub fn step_y2(&mut self, eqn: &TriangleEquations, step_size: f32) {
        self.ev0 = eqn.e0.step_y2(self.ev0, step_size);
        self.ev1 = eqn.e1.step_y2(self.ev1, step_size);
        self.ev2 = eqn.e2.step_y2(self.ev2, step_size);
    }

    /// Per-edge pass/fail for this sample
    #[inline]
    pub fn tests(&self, eqn: &TriangleEquations) -> [bool; 3] {
        [
            eqn.e0.test_value(self.ev0),
            eqn.e1.test_value(self.ev1),
            eqn.e2.test_value(self.ev2),
        ]
    }

    /// Triangle containment
    #[inline]
    pub fn test(&self, eqn: &TriangleEquations) -> bool {
        eqn.e0.test_value(self.ev0) && eqn.e1.test_value(self.ev1) && eqn.e2.test_value(self.ev2)
    }
}
