//! Point, line and triangle rasterization
//!
//! Triangles are filled either as scanline spans or as 8x8 tiles; both
//! read the same [`TriangleEquations`], so the choice only affects speed.
//! Each tile and each scanline writes a disjoint set of pixels and only
//! reads the equations, which makes those loops the natural unit of
//! parallel work.

use tracing::trace;

use super::equations::{EdgeData, TriangleEquations};
use super::shader::PixelShader;
use super::types::{PixelData, RasterMode, RasterizerVertex, ScissorRect};
use crate::{BLOCK_SIZE, MAX_AVARS, MAX_PVARS};

/// Bounding boxes with an aspect ratio inside this range use block mode
const ADAPTIVE_BLOCK_RANGE: (f32, f32) = (0.4, 1.6);

/// Converts screen-space primitives into pixel callbacks
#[derive(Debug, Default)]
pub struct Rasterizer<'a> {
    mode: RasterMode,
    scissor: ScissorRect,
    pixel_shader: Option<PixelShader<'a>>,
}

impl<'a> Rasterizer<'a> {
    /// Span mode, empty scissor rect and no pixel shader
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_raster_mode(&mut self, mode: RasterMode) {
        self.mode = mode;
    }

    pub fn raster_mode(&self) -> RasterMode {
        self.mode
    }

    pub fn set_scissor_rect(&mut self, rect: ScissorRect) {
        self.scissor = rect;
    }

    pub fn scissor_rect(&self) -> ScissorRect {
        self.scissor
    }

    pub fn set_pixel_shader(&mut self, shader: PixelShader<'a>) {
        self.pixel_shader = Some(shader);
    }

    pub fn pixel_shader(&self) -> Option<&PixelShader<'a>> {
        self.pixel_shader.as_ref()
    }

    /// Remove and return the bound shader (and whatever its callback owns)
    pub fn take_pixel_shader(&mut self) -> Option<PixelShader<'a>> {
        self.pixel_shader.take()
    }

    pub fn scissor_test(&self, x: f32, y: f32) -> bool {
        self.scissor.contains(x, y)
    }

    // ========================================================================
    // Primitive entry points
    // ========================================================================

    pub fn draw_point(&mut self, v: &RasterizerVertex) {
        if !self.scissor.contains(v.x, v.y) {
            return;
        }
        let Some(shader) = self.pixel_shader.as_mut() else {
            return;
        };
        let p = pixel_data_from_vertex(shader, v);
        shader.draw_pixel(&p);
    }

    /// DDA line; the last endpoint is not drawn
    pub fn draw_line(&mut self, v0: &RasterizerVertex, v1: &RasterizerVertex) {
        let scissor = self.scissor;
        let Some(shader) = self.pixel_shader.as_mut() else {
            return;
        };

        let dx = v1.x.trunc() - v0.x.trunc();
        let dy = v1.y.trunc() - v0.y.trunc();
        let steps = dx.abs().max(dy.abs()) as i64;
        if steps <= 0 {
            return;
        }

        let step = vertex_step(v0, v1, steps as f32, shader);
        let Some((first, last)) = scissor_step_range(&scissor, v0, &step, steps) else {
            return;
        };

        let mut v = *v0;
        if first > 0 {
            v = v0.lerp(v1, (first as f64 / steps as f64) as f32);
            v.x = (v0.x as f64 + step.x as f64 * first as f64) as f32;
            v.y = (v0.y as f64 + step.y as f64 * first as f64) as f32;
        }
        for _ in first..last {
            if scissor.contains(v.x, v.y) {
                let p = pixel_data_from_vertex(shader, &v);
                shader.draw_pixel(&p);
            }
            step_vertex(&mut v, &step, shader);
        }
    }

    pub fn draw_triangle(&mut self, v0: &RasterizerVertex, v1: &RasterizerVertex, v2: &RasterizerVertex) {
        match self.mode {
            RasterMode::Span => self.draw_triangle_span(v0, v1, v2),
            RasterMode::Block => self.draw_triangle_block(v0, v1, v2),
            RasterMode::Adaptive => self.draw_triangle_adaptive(v0, v1, v2),
        }
    }

    /// Draw `vertices[indices[i]]`, skipping discarded (negative) indices
    pub fn draw_point_list(&mut self, vertices: &[RasterizerVertex], indices: &[i32]) {
        for &i in indices {
            if i < 0 {
                continue;
            }
            self.draw_point(&vertices[i as usize]);
        }
    }

    pub fn draw_line_list(&mut self, vertices: &[RasterizerVertex], indices: &[i32]) {
        for pair in indices.chunks_exact(2) {
            if pair.iter().any(|&i| i < 0) {
                continue;
            }
            self.draw_line(&vertices[pair[0] as usize], &vertices[pair[1] as usize]);
        }
    }

    pub fn draw_triangle_list(&mut self, vertices: &[RasterizerVertex], indices: &[i32]) {
        for tri in indices.chunks_exact(3) {
            if tri.iter().any(|&i| i < 0) {
                continue;
            }
            self.draw_triangle(
                &vertices[tri[0] as usize],
                &vertices[tri[1] as usize],
                &vertices[tri[2] as usize],
            );
        }
    }

    // ========================================================================
    // Triangle strategies
    // ========================================================================

    fn equations(&self, v0: &RasterizerVertex, v1: &RasterizerVertex, v2: &RasterizerVertex) -> Option<TriangleEquations> {
        let shader = self.pixel_shader.as_ref()?;
        TriangleEquations::new(v0, v1, v2, shader.avar_count, shader.pvar_count)
    }

    /// Tiled fill with corner classification
    pub fn draw_triangle_block(&mut self, v0: &RasterizerVertex, v1: &RasterizerVertex, v2: &RasterizerVertex) {
        let Some(eqn) = self.equations(v0, v1, v2) else {
            return;
        };
        let scissor = self.scissor;
        let Some(shader) = self.pixel_shader.as_mut() else {
            return;
        };

        let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i32).max(scissor.min_x);
        let max_x = (v0.x.max(v1.x).max(v2.x).floor() as i32).min(scissor.max_x.saturating_sub(1));
        let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i32).max(scissor.min_y);
        let max_y = (v0.y.max(v1.y).max(v2.y).floor() as i32).min(scissor.max_y.saturating_sub(1));
        if max_x < min_x || max_y < min_y {
            return;
        }

        // Round to the block grid
        let min_x = min_x & !(BLOCK_SIZE - 1);
        let max_x = max_x & !(BLOCK_SIZE - 1);
        let min_y = min_y & !(BLOCK_SIZE - 1);
        let max_y = max_y & !(BLOCK_SIZE - 1);

        for y in (min_y..=max_y).step_by(BLOCK_SIZE as usize) {
            for x in (min_x..=max_x).step_by(BLOCK_SIZE as usize) {
                match classify_block(&eqn, x, y) {
                    BlockCoverage::Outside => {}
                    BlockCoverage::Full => shader.draw_block_clipped(&eqn, x, y, false, &scissor),
                    BlockCoverage::Partial => shader.draw_block_clipped(&eqn, x, y, true, &scissor),
                }
            }
        }
    }

    /// Scanline fill over the halves above and below the middle vertex.
    ///
    /// Rows and columns are sampled at pixel centres with half-open bounds:
    /// a centre on a top or left edge is drawn, one on a bottom or right
    /// edge is not.
    pub fn draw_triangle_span(&mut self, v0: &RasterizerVertex, v1: &RasterizerVertex, v2: &RasterizerVertex) {
        let Some(eqn) = self.equations(v0, v1, v2) else {
            return;
        };
        let scissor = self.scissor;
        let Some(shader) = self.pixel_shader.as_mut() else {
            return;
        };

        // Sort top to bottom
        let (mut t, mut m, mut b) = (v0, v1, v2);
        if t.y > m.y {
            std::mem::swap(&mut t, &mut m);
        }
        if m.y > b.y {
            std::mem::swap(&mut m, &mut b);
        }
        if t.y > m.y {
            std::mem::swap(&mut t, &mut m);
        }

        // Split the long edge at the middle vertex's height
        let v4 = t.lerp(b, (m.y - t.y) / (b.y - t.y));
        let middle_left = m.x < v4.x;
        let long = SpanEdge::new(t, b);

        if m.y > t.y {
            let short = SpanEdge::new(t, m);
            let (l, r) = if middle_left { (short, long) } else { (long, short) };
            fill_rows(shader, &scissor, &eqn, t.y, m.y, &l, &r);
        }
        if b.y > m.y {
            let short = SpanEdge::new(m, b);
            let (l, r) = if middle_left { (short, long) } else { (long, short) };
            fill_rows(shader, &scissor, &eqn, m.y, b.y, &l, &r);
        }
    }

    /// Block for squarish bounding boxes, span otherwise
    pub fn draw_triangle_adaptive(&mut self, v0: &RasterizerVertex, v1: &RasterizerVertex, v2: &RasterizerVertex) {
        let width = v0.x.max(v1.x).max(v2.x) - v0.x.min(v1.x).min(v2.x);
        let height = v0.y.max(v1.y).max(v2.y) - v0.y.min(v1.y).min(v2.y);

        let use_block = height > 0.0 && {
            let orient = width / height;
            orient > ADAPTIVE_BLOCK_RANGE.0 && orient < ADAPTIVE_BLOCK_RANGE.1
        };

        trace!(width, height, use_block, "adaptive triangle");
        if use_block {
            self.draw_triangle_block(v0, v1, v2);
        } else {
            self.draw_triangle_span(v0, v1, v2);
        }
    }
}

/// Result of testing a tile's four corner samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCoverage {
    /// Provably disjoint from the triangle
    Outside,
    /// Every sample is inside
    Full,
    /// Needs per-pixel edge tests
    Partial,
}

/// Classify the tile with top-left pixel (x, y).
///
/// The tile's samples form the convex hull of its four corner samples and
/// the edge functions are affine, so a tile passes or fails an edge
/// everywhere as soon as all four corners agree on it.
pub fn classify_block(eqn: &TriangleEquations, x: i32, y: i32) -> BlockCoverage {
    let s = (BLOCK_SIZE - 1) as f32;
    let xf = x as f32 + 0.5;
    let yf = y as f32 + 0.5;

    let e00 = EdgeData::new(eqn, xf, yf);
    let mut e01 = e00;
    e01.step_y2(eqn, s);
    let mut e10 = e00;
    e10.step_x2(eqn, s);
    let mut e11 = e01;
    e11.step_x2(eqn, s);

    let corners = [e00.tests(eqn), e01.tests(eqn), e10.tests(eqn), e11.tests(eqn)];

    let mut all_pass = true;
    for edge in 0..3 {
        let passing = corners.iter().filter(|c| c[edge]).count();
        if passing == 0 {
            return BlockCoverage::Outside;
        }
        if passing != corners.len() {
            all_pass = false;
        }
    }

    if all_pass {
        BlockCoverage::Full
    } else {
        BlockCoverage::Partial
    }
}

/// Triangle edge walked from its upper to its lower vertex
#[derive(Debug, Clone, Copy)]
struct SpanEdge {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl SpanEdge {
    fn new(top: &RasterizerVertex, bottom: &RasterizerVertex) -> Self {
        Self {
            x0: top.x,
            y0: top.y,
            x1: bottom.x,
            y1: bottom.y,
        }
    }

    /// Only called for `y0 < y1`
    #[inline]
    fn x_at(&self, y: f32) -> f32 {
        self.x0 + (self.x1 - self.x0) * (y - self.y0) / (self.y1 - self.y0)
    }
}

/// Shade the rows whose centres lie in `[y_top, y_bottom)`, each from the
/// left edge (inclusive) to the right edge (exclusive)
fn fill_rows(
    shader: &mut PixelShader<'_>,
    scissor: &ScissorRect,
    eqn: &TriangleEquations,
    y_top: f32,
    y_bottom: f32,
    left: &SpanEdge,
    right: &SpanEdge,
) {
    let y_start = ((y_top - 0.5).ceil() as i32).max(scissor.min_y);
    let y_end = ((y_bottom - 0.5).ceil() as i32).min(scissor.max_y);

    for y in y_start..y_end {
        let yc = y as f32 + 0.5;
        let xl = ((left.x_at(yc) - 0.5).ceil() as i32).max(scissor.min_x);
        let xr = ((right.x_at(yc) - 0.5).ceil() as i32).min(scissor.max_x);
        if xl < xr {
            shader.draw_span(eqn, xl, y, xr);
        }
    }
}

fn pixel_data_from_vertex(shader: &PixelShader<'_>, v: &RasterizerVertex) -> PixelData {
    let mut p = PixelData {
        x: v.x as i32,
        y: v.y as i32,
        ..Default::default()
    };
    if shader.interpolate_z {
        p.z = v.z;
    }
    if shader.interpolate_w || shader.pvar_count > 0 {
        p.w = v.w;
        p.invw = 1.0 / v.w;
    }
    p.avar[..shader.avar_count].copy_from_slice(&v.avar[..shader.avar_count]);
    p.pvar[..shader.pvar_count].copy_from_slice(&v.pvar[..shader.pvar_count]);
    p
}

/// Steps `[first, last)` of a line walk that can land inside `scissor`,
/// padded by one step on each side
fn scissor_step_range(scissor: &ScissorRect, v0: &RasterizerVertex, step: &RasterizerVertex, steps: i64) -> Option<(i64, i64)> {
    let mut lo = 0.0f64;
    let mut hi = steps as f64;
    let axes = [
        (v0.x, step.x, scissor.min_x, scissor.max_x),
        (v0.y, step.y, scissor.min_y, scissor.max_y),
    ];
    for (p, d, min, max) in axes {
        let (p, d, min, max) = (p as f64, d as f64, min as f64, max as f64);
        if d == 0.0 {
            if p < min || p >= max {
                return None;
            }
        } else {
            let (a, b) = ((min - p) / d, (max - p) / d);
            lo = lo.max(a.min(b));
            hi = hi.min(a.max(b));
        }
    }

    let first = (lo.floor() as i64 - 1).max(0);
    let last = (hi.ceil() as i64 + 1).min(steps);
    (first < last).then_some((first, last))
}

/// Per-step deltas for a line of `steps` pixels
fn vertex_step(v0: &RasterizerVertex, v1: &RasterizerVertex, steps: f32, shader: &PixelShader<'_>) -> RasterizerVertex {
    let mut step = RasterizerVertex {
        x: (v1.x - v0.x) / steps,
        y: (v1.y - v0.y) / steps,
        z: (v1.z - v0.z) / steps,
        w: (v1.w - v0.w) / steps,
        avar: [0.0; MAX_AVARS],
        pvar: [0.0; MAX_PVARS],
    };
    for i in 0..shader.avar_count {
        step.avar[i] = (v1.avar[i] - v0.avar[i]) / steps;
    }
    for i in 0..shader.pvar_count {
        step.pvar[i] = (v1.pvar[i] - v0.pvar[i]) / steps;
    }
    step
}

fn step_vertex(v: &mut RasterizerVertex, step: &RasterizerVertex, shader: &PixelShader<'_>) {
    v.x += step.x;
    v.y += step.y;
    v.z += step.z;
    v.w += step.w;
    for i in 0..shader.avar_count {
        v.avar[i] += step.avar[i];
    }
    for i in 0..shader.pvar_count {
        v.pvar[i] += step.pvar[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    const VIEW: ScissorRect = ScissorRect { min_x: 0, min_y: 0, max_x: 640, max_y: 480 };

    fn rgb_triangle() -> [RasterizerVertex; 3] {
        [
            RasterizerVertex::at(320.0, 100.0).with_avars(&[1.0, 0.0, 0.0]),
            RasterizerVertex::at(480.0, 200.0).with_avars(&[0.0, 1.0, 0.0]),
            RasterizerVertex::at(120.0, 300.0).with_avars(&[0.0, 0.0, 1.0]),
        ]
    }

    /// Rasterize and collect every shaded pixel with its first three avars
    fn shade(mode: RasterMode, scissor: ScissorRect, tris: &[[RasterizerVertex; 3]]) -> Vec<(i32, i32, [f32; 3])> {
        let mut out = Vec::new();
        {
            let mut r = Rasterizer::new();
            r.set_raster_mode(mode);
            r.set_scissor_rect(scissor);
            r.set_pixel_shader(PixelShader::new(false, false, 3, 0, |p| {
                out.push((p.x, p.y, [p.avar[0], p.avar[1], p.avar[2]]))
            }));
            for [v0, v1, v2] in tris {
                r.draw_triangle(v0, v1, v2);
            }
        }
        out
    }

    fn pixel_set(pixels: &[(i32, i32, [f32; 3])]) -> HashSet<(i32, i32)> {
        pixels.iter().map(|p| (p.0, p.1)).collect()
    }

    /// Pixel centre within rounding distance of one of the triangle's edges
    fn near_edge(tri: &[RasterizerVertex; 3], x: i32, y: i32) -> bool {
        let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
        (0..3).any(|i| {
            let (a, b) = (&tri[i], &tri[(i + 1) % 3]);
            let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
            let len = (bx - ax).hypot(by - ay);
            let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
            len > 0.0 && (cross / len).abs() < 0.02
        })
    }

    #[test]
    fn test_rgb_triangle_area_and_centroid() {
        for mode in [RasterMode::Span, RasterMode::Block, RasterMode::Adaptive] {
            let pixels = shade(mode, VIEW, &[rgb_triangle()]);
            let set = pixel_set(&pixels);
            assert_eq!(set.len(), pixels.len(), "{:?} shaded a pixel twice", mode);

            // area2 = 52000 -> 26000 pixels
            let area = pixels.len() as f32;
            assert!((area - 26000.0).abs() < 26000.0 * 0.02, "{:?}: {} pixels", mode, area);

            // Centroid (306.67, 200) -> colour close to (1/3, 1/3, 1/3)
            let centre = pixels.iter().find(|p| p.0 == 306 && p.1 == 199).unwrap();
            for c in centre.2 {
                assert!((c - 1.0 / 3.0).abs() < 0.02, "{:?}: {:?}", mode, centre.2);
            }
        }
    }

    #[test]
    fn test_rgb_triangle_rows_are_contiguous() {
        let pixels = shade(RasterMode::Block, VIEW, &[rgb_triangle()]);
        let mut rows: HashMap<i32, Vec<i32>> = HashMap::new();
        for p in &pixels {
            rows.entry(p.1).or_default().push(p.0);
        }
        let ys: Vec<i32> = {
            let mut ys: Vec<i32> = rows.keys().copied().collect();
            ys.sort();
            ys
        };
        // No holes between rows or inside a row
        for w in ys.windows(2) {
            assert_eq!(w[1], w[0] + 1);
        }
        for xs in rows.values_mut() {
            xs.sort();
            assert_eq!(xs.len() as i32, xs[xs.len() - 1] - xs[0] + 1);
        }
    }

    #[test]
    fn test_block_matches_reference_coverage() {
        let [v0, v1, v2] = rgb_triangle();
        let eqn = TriangleEquations::new(&v0, &v1, &v2, 0, 0).unwrap();
        let mut expected = HashSet::new();
        for y in 90..310 {
            for x in 110..490 {
                if eqn.contains(x as f32 + 0.5, y as f32 + 0.5) {
                    expected.insert((x, y));
                }
            }
        }
        let got = pixel_set(&shade(RasterMode::Block, VIEW, &[rgb_triangle()]));
        assert_eq!(got, expected);
    }

    #[test]
    fn test_shared_edge_partition() {
        let tl = RasterizerVertex::at(10.0, 10.0);
        let tr = RasterizerVertex::at(50.0, 10.0);
        let br = RasterizerVertex::at(50.0, 50.0);
        let bl = RasterizerVertex::at(10.0, 50.0);
        for mode in [RasterMode::Span, RasterMode::Block, RasterMode::Adaptive] {
            let pixels = shade(mode, VIEW, &[[tl, tr, br], [tl, br, bl]]);

            let set = pixel_set(&pixels);
            assert_eq!(set.len(), pixels.len(), "{:?} shaded a diagonal pixel twice", mode);
            assert_eq!(pixels.len(), 40 * 40, "{:?}", mode);
            assert!(set.iter().all(|&(x, y)| (10..50).contains(&x) && (10..50).contains(&y)));
        }
    }

    #[test]
    fn test_slanted_shared_edge_partition() {
        // Fan of thin triangles around a centre with fractional coordinates
        let c = RasterizerVertex::at(32.3, 29.7);
        let rim: Vec<RasterizerVertex> = (0..12)
            .map(|i| {
                let a = i as f32 / 12.0 * std::f32::consts::TAU;
                RasterizerVertex::at(32.3 + 25.0 * a.cos(), 29.7 + 25.0 * a.sin())
            })
            .collect();
        let tris: Vec<[RasterizerVertex; 3]> = (0..12).map(|i| [c, rim[i], rim[(i + 1) % 12]]).collect();

        let span = shade(RasterMode::Span, VIEW, &tris);
        let block = shade(RasterMode::Block, VIEW, &tris);
        assert_eq!(pixel_set(&span).len(), span.len(), "span shaded a pixel twice");
        assert_eq!(pixel_set(&block).len(), block.len(), "block shaded a pixel twice");
        let (span, block) = (pixel_set(&span), pixel_set(&block));
        assert!(span
            .symmetric_difference(&block)
            .all(|&(x, y)| tris.iter().any(|tri| near_edge(tri, x, y))));
    }

    #[test]
    fn test_top_rows_drawn_at_viewport_edge() {
        // Flat top edges just above the first row's centres
        for top in [0.0, 0.3, 0.5] {
            let tri = [
                RasterizerVertex::at(10.0, top),
                RasterizerVertex::at(60.0, top),
                RasterizerVertex::at(35.0, 40.0),
            ];
            for mode in [RasterMode::Span, RasterMode::Block, RasterMode::Adaptive] {
                let pixels = shade(mode, VIEW, &[tri]);
                let row0 = pixels.iter().filter(|p| p.1 == 0).count();
                assert!((49..=50).contains(&row0), "{:?} top {}: row 0 has {}", mode, top, row0);
            }
            let span = pixel_set(&shade(RasterMode::Span, VIEW, &[tri]));
            let block = pixel_set(&shade(RasterMode::Block, VIEW, &[tri]));
            assert!(span.symmetric_difference(&block).all(|&(x, y)| near_edge(&tri, x, y)), "top {}", top);
        }
    }

    #[test]
    fn test_negative_coordinates_unbounded_scissor() {
        let tri = [
            RasterizerVertex::at(-20.3, -10.7),
            RasterizerVertex::at(-2.2, -15.1),
            RasterizerVertex::at(-9.8, 6.4),
        ];
        let eqn = TriangleEquations::new(&tri[0], &tri[1], &tri[2], 0, 0).unwrap();
        let mut expected = HashSet::new();
        for y in -20..10 {
            for x in -25..5 {
                if eqn.contains(x as f32 + 0.5, y as f32 + 0.5) {
                    expected.insert((x, y));
                }
            }
        }
        assert!(expected.len() > 100);
        for mode in [RasterMode::Span, RasterMode::Block] {
            let got = pixel_set(&shade(mode, ScissorRect::UNBOUNDED, &[tri]));
            assert!(got.symmetric_difference(&expected).all(|&(x, y)| near_edge(&tri, x, y)), "{:?}", mode);
        }
    }

    #[test]
    fn test_degenerate_triangle_draws_nothing() {
        let v0 = RasterizerVertex::at(10.0, 10.0);
        let v1 = RasterizerVertex::at(20.0, 20.0);
        let v2 = RasterizerVertex::at(30.0, 30.0);
        for mode in [RasterMode::Span, RasterMode::Block, RasterMode::Adaptive] {
            assert!(shade(mode, VIEW, &[[v0, v1, v2]]).is_empty());
        }
    }

    #[test]
    fn test_back_facing_draws_nothing() {
        let [v0, v1, v2] = rgb_triangle();
        assert!(shade(RasterMode::Span, VIEW, &[[v0, v2, v1]]).is_empty());
        assert!(shade(RasterMode::Block, VIEW, &[[v0, v2, v1]]).is_empty());
    }

    #[test]
    fn test_scissor_clips_both_modes() {
        let clip = ScissorRect::new(200, 150, 100, 60);
        for mode in [RasterMode::Span, RasterMode::Block] {
            let pixels = shade(mode, clip, &[rgb_triangle()]);
            assert!(!pixels.is_empty());
            assert!(pixels.iter().all(|p| clip.contains_pixel(p.0, p.1)), "{:?} escaped scissor", mode);
        }
    }

    #[test]
    fn test_span_and_block_equivalent() {
        let tri = [
            RasterizerVertex::at(33.37, 12.21),
            RasterizerVertex::at(201.13, 97.77),
            RasterizerVertex::at(61.91, 170.43),
        ];
        let span = pixel_set(&shade(RasterMode::Span, VIEW, &[tri]));
        let block = pixel_set(&shade(RasterMode::Block, VIEW, &[tri]));
        let diff = span.symmetric_difference(&block).count();
        assert!(diff * 100 <= block.len(), "{} differing of {}", diff, block.len());
    }

    #[test]
    fn test_point_scissor_and_data() {
        let mut seen = Vec::new();
        {
            let mut r = Rasterizer::new();
            r.set_scissor_rect(ScissorRect::new(0, 0, 10, 10));
            r.set_pixel_shader(PixelShader::new(true, true, 1, 0, |p| seen.push(*p)));
            let v = RasterizerVertex::new(3.7, 4.2, 0.25, 2.0).with_avars(&[0.5]);
            r.draw_point(&v);
            r.draw_point(&RasterizerVertex::at(12.0, 1.0));
        }
        assert_eq!(seen.len(), 1);
        assert_eq!((seen[0].x, seen[0].y), (3, 4));
        assert!((seen[0].z - 0.25).abs() < 1e-6);
        assert!((seen[0].invw - 0.5).abs() < 1e-6);
        assert!((seen[0].avar[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_line_steps_and_interpolates() {
        let mut seen = Vec::new();
        {
            let mut r = Rasterizer::new();
            r.set_scissor_rect(VIEW);
            r.set_pixel_shader(PixelShader::new(false, false, 1, 0, |p| seen.push((p.x, p.y, p.avar[0]))));
            let v0 = RasterizerVertex::at(10.0, 10.0).with_avars(&[0.0]);
            let v1 = RasterizerVertex::at(20.0, 15.0).with_avars(&[1.0]);
            r.draw_line(&v0, &v1);
        }
        assert_eq!(seen.len(), 10);
        assert_eq!((seen[0].0, seen[0].1), (10, 10));
        assert!(seen.windows(2).all(|w| w[1].0 == w[0].0 + 1));
        assert!((seen[5].2 - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_far_line_walks_only_the_scissor() {
        let mut seen = Vec::new();
        {
            let mut r = Rasterizer::new();
            r.set_scissor_rect(VIEW);
            r.set_pixel_shader(PixelShader::new(false, false, 0, 0, |p| seen.push((p.x, p.y))));
            r.draw_line(&RasterizerVertex::at(-3e9, 10.0), &RasterizerVertex::at(3e9, 10.0));
            r.draw_line(&RasterizerVertex::at(5.0, -3e9), &RasterizerVertex::at(5.0, 3e9));
            // Entirely outside
            r.draw_line(&RasterizerVertex::at(-3e9, -5.0), &RasterizerVertex::at(3e9, -5.0));
        }
        let horizontal: Vec<_> = seen.iter().filter(|p| p.1 == 10 && p.0 != 5).collect();
        assert_eq!(horizontal.len(), 639);
        assert_eq!(seen.iter().filter(|p| p.0 == 5).count(), 480 + 1);
        assert!(seen.iter().all(|&(x, y)| VIEW.contains_pixel(x, y)));
    }

    #[test]
    fn test_zero_length_line_draws_nothing() {
        let mut count = 0;
        {
            let mut r = Rasterizer::new();
            r.set_scissor_rect(VIEW);
            r.set_pixel_shader(PixelShader::new(false, false, 0, 0, |_| count += 1));
            let v = RasterizerVertex::at(5.0, 5.0);
            r.draw_line(&v, &v);
        }
        assert_eq!(count, 0);
    }

    #[test]
    fn test_lists_skip_discarded() {
        let verts = [
            RasterizerVertex::at(1.0, 1.0),
            RasterizerVertex::at(2.0, 2.0),
            RasterizerVertex::at(3.0, 3.0),
        ];
        let mut count = 0;
        {
            let mut r = Rasterizer::new();
            r.set_scissor_rect(VIEW);
            r.set_pixel_shader(PixelShader::new(false, false, 0, 0, |_| count += 1));
            r.draw_point_list(&verts, &[0, -1, 2]);
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_no_shader_is_noop() {
        let mut r = Rasterizer::new();
        r.set_scissor_rect(VIEW);
        let [v0, v1, v2] = rgb_triangle();
        r.draw_triangle(&v0, &v1, &v2);
        r.draw_line(&v0, &v1);
        r.draw_point(&v0);
    }

    #[test]
    fn test_classify_block() {
        let [v0, v1, v2] = rgb_triangle();
        let eqn = TriangleEquations::new(&v0, &v1, &v2, 0, 0).unwrap();
        assert_eq!(classify_block(&eqn, 0, 0), BlockCoverage::Outside);
        assert_eq!(classify_block(&eqn, 304, 192), BlockCoverage::Full);
        // Tile holding the top vertex
        assert_eq!(classify_block(&eqn, 320, 96), BlockCoverage::Partial);
    }

    #[test]
    fn test_thin_sliver_not_dropped() {
        // Sliver crossing a tile between its corner samples
        let tri = [
            RasterizerVertex::at(0.0, 3.9),
            RasterizerVertex::at(64.0, 3.9),
            RasterizerVertex::at(0.0, 4.6),
        ];
        let pixels = shade(RasterMode::Block, VIEW, &[tri]);
        assert!(!pixels.is_empty());
        assert!(pixels.iter().all(|p| p.1 == 4));
    }

    fn coord() -> impl Strategy<Value = f32> {
        prop_oneof![
            (-4i32..68).prop_map(|v| v as f32),
            (-8i32..136).prop_map(|v| v as f32 * 0.5),
            -4.0f32..68.0,
        ]
    }

    proptest! {
        #[test]
        fn prop_span_matches_block_away_from_edges(
            x0 in coord(), y0 in coord(),
            x1 in coord(), y1 in coord(),
            x2 in coord(), y2 in coord(),
        ) {
            let clip = ScissorRect::new(0, 0, 64, 64);
            let tri = [
                RasterizerVertex::at(x0, y0),
                RasterizerVertex::at(x1, y1),
                RasterizerVertex::at(x2, y2),
            ];
            let span = pixel_set(&shade(RasterMode::Span, clip, &[tri]));
            let block = pixel_set(&shade(RasterMode::Block, clip, &[tri]));
            for &(x, y) in span.symmetric_difference(&block) {
                prop_assert!(near_edge(&tri, x, y), "({}, {}) differs in {:?}", x, y, tri);
            }
        }

        #[test]
        fn prop_block_never_underdraws(
            x0 in 0i32..120, y0 in 0i32..120,
            x1 in 0i32..120, y1 in 0i32..120,
            x2 in 0i32..120, y2 in 0i32..120,
        ) {
            let v = [
                RasterizerVertex::at(x0 as f32, y0 as f32),
                RasterizerVertex::at(x1 as f32, y1 as f32),
                RasterizerVertex::at(x2 as f32, y2 as f32),
            ];
            let got = pixel_set(&shade(RasterMode::Block, VIEW, &[v]));
            let mut expected = HashSet::new();
            if let Some(eqn) = TriangleEquations::new(&v[0], &v[1], &v[2], 0, 0) {
                for y in 0..121 {
                    for x in 0..121 {
                        if eqn.contains(x as f32 + 0.5, y as f32 + 0.5) {
                            expected.insert((x, y));
                        }
                    }
                }
            }
            prop_assert_eq!(got, expected);
        }
    }
}
