//! Draw-call orchestration
//!
//! `draw_elements` shades indexed vertices through a small cache into a
//! batch, then clips, transforms, culls and rasterizes the batch. Batches
//! are flushed every `MAX_BATCH_PRIMITIVES` primitives; the split is not
//! observable in the output.

use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::cache::VertexCache;
use super::clip::{ClipMask, LineClipper, PolyClipper};
use super::shader::{Attribute, VertexShader, VertexShaderInput, VertexShaderOutput};
use crate::config::PipelineConfig;
use crate::rasterizer::Rasterizer;
use crate::{DISCARDED_INDEX, MAX_BATCH_PRIMITIVES, MAX_VERTEX_ATTRIBS};

/// Primitive topology of an index list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    Point,
    Line,
    Triangle,
}

impl DrawMode {
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            DrawMode::Point => 1,
            DrawMode::Line => 2,
            DrawMode::Triangle => 3,
        }
    }
}

/// Which screen-space winding gets discarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullMode {
    /// Keep both windings
    None,
    /// Discard counter-clockwise triangles
    Ccw,
    /// Discard clockwise triangles
    #[default]
    Cw,
}

impl CullMode {
    /// None -> Ccw -> Cw -> None
    pub fn next(self) -> Self {
        match self {
            CullMode::None => CullMode::Ccw,
            CullMode::Ccw => CullMode::Cw,
            CullMode::Cw => CullMode::None,
        }
    }
}

/// Window rectangle that normalized device coordinates map onto
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// NDC to window coordinates, flipping y so the origin is top-left
    pub fn to_window(&self, x: f32, y: f32) -> (f32, f32) {
        let px = self.width as f32 / 2.0;
        let py = self.height as f32 / 2.0;
        let ox = self.x as f32 + px;
        let oy = self.y as f32 + py;
        (px * x + ox, py * -y + oy)
    }
}

/// Window depth range that NDC z in [-1, 1] maps onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub near: f32,
    pub far: f32,
}

impl Default for DepthRange {
    fn default() -> Self {
        Self { near: 0.0, far: 1.0 }
    }
}

impl DepthRange {
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    pub fn map(&self, z: f32) -> f32 {
        0.5 * (self.far - self.near) * z + 0.5 * (self.near + self.far)
    }
}

/// Runs draw calls for one rasterizer.
///
/// Not reentrant: batch buffers are reused across draw calls.
#[derive(Debug)]
pub struct VertexProcessor<'a> {
    rasterizer: Rasterizer<'a>,
    vertex_shader: Option<VertexShader<'a>>,
    attributes: [Attribute<'a>; MAX_VERTEX_ATTRIBS],
    viewport: Viewport,
    depth_range: DepthRange,
    cull_mode: CullMode,

    // Per-batch state
    vertices_out: Vec<VertexShaderOutput>,
    indices_out: Vec<i32>,
    clip_mask: Vec<ClipMask>,
    already_processed: Vec<bool>,
    poly_clipper: PolyClipper,
}

impl<'a> VertexProcessor<'a> {
    pub fn new(rasterizer: Rasterizer<'a>) -> Self {
        Self {
            rasterizer,
            vertex_shader: None,
            attributes: [Attribute::default(); MAX_VERTEX_ATTRIBS],
            viewport: Viewport::default(),
            depth_range: DepthRange::default(),
            cull_mode: CullMode::default(),
            vertices_out: Vec::new(),
            indices_out: Vec::new(),
            clip_mask: Vec::new(),
            already_processed: Vec::new(),
            poly_clipper: PolyClipper::new(),
        }
    }

    pub fn rasterizer(&self) -> &Rasterizer<'a> {
        &self.rasterizer
    }

    pub fn rasterizer_mut(&mut self) -> &mut Rasterizer<'a> {
        &mut self.rasterizer
    }

    pub fn into_rasterizer(self) -> Rasterizer<'a> {
        self.rasterizer
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport = Viewport::new(x, y, width, height);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth_range = DepthRange::new(near, far);
    }

    pub fn depth_range(&self) -> DepthRange {
        self.depth_range
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    pub fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    pub fn set_vertex_shader(&mut self, shader: VertexShader<'a>) {
        self.vertex_shader = Some(shader);
    }

    /// Bind attribute `index` to `buffer`, one element every `stride` bytes
    pub fn set_vertex_attrib_pointer(&mut self, index: usize, stride: usize, buffer: &'a [u8]) {
        assert!(index < MAX_VERTEX_ATTRIBS, "attribute index {} out of range", index);
        self.attributes[index] = Attribute { buffer, stride };
    }

    /// Bind attribute `index` to a tightly packed slice of `T`
    pub fn set_vertex_attrib_slice<T: Pod>(&mut self, index: usize, data: &'a [T]) {
        self.set_vertex_attrib_pointer(index, std::mem::size_of::<T>(), bytemuck::cast_slice(data));
    }

    /// Take viewport, depth range, cull mode, raster mode and scissor
    /// from a config
    pub fn apply_config(&mut self, config: &PipelineConfig) {
        self.viewport = config.viewport;
        self.depth_range = config.depth_range;
        self.cull_mode = config.cull_mode;
        self.rasterizer.set_raster_mode(config.raster_mode);
        self.rasterizer.set_scissor_rect(config.scissor);
    }

    /// Output vertices of the current batch
    pub fn vertices_out(&self) -> &[VertexShaderOutput] {
        &self.vertices_out
    }

    /// Output indices of the current batch; discarded primitives hold -1
    pub fn indices_out(&self) -> &[i32] {
        &self.indices_out
    }

    pub fn primitive_count(&self, mode: DrawMode) -> usize {
        self.indices_out.len() / mode.vertices_per_primitive()
    }

    /// Shade, clip, cull and rasterize the primitives in `indices`
    pub fn draw_elements(&mut self, mode: DrawMode, indices: &[i32]) {
        let Some(shader) = self.vertex_shader.take() else {
            warn!("draw_elements called without a vertex shader");
            return;
        };
        debug!(?mode, indices = indices.len(), "draw elements");

        self.vertices_out.clear();
        self.indices_out.clear();

        let attributes = self.attributes;
        let bound = &attributes[..shader.attrib_count()];
        let mut cache = VertexCache::new();
        let mut batches = 0usize;

        for &index in indices {
            if index < 0 {
                self.indices_out.push(DISCARDED_INDEX);
            } else if let Some(output) = cache.lookup(index) {
                self.indices_out.push(output as i32);
            } else {
                let input = VertexShaderInput::new(bound, index as usize);
                let mut v = VertexShaderOutput::default();
                shader.process(&input, &mut v);

                let output = self.vertices_out.len();
                self.vertices_out.push(v);
                self.indices_out.push(output as i32);
                cache.set(index, output);
            }

            if self.primitive_count(mode) >= MAX_BATCH_PRIMITIVES {
                debug!(primitives = self.primitive_count(mode), "flushing full batch");
                self.process_primitives(mode);
                batches += 1;

                self.vertices_out.clear();
                self.indices_out.clear();
                cache.clear();
            }
        }

        self.process_primitives(mode);
        batches += 1;

        self.vertex_shader = Some(shader);
        debug!(batches, "draw elements done");
    }

    /// Clip, transform, cull and rasterize the current batch
    pub fn process_primitives(&mut self, mode: DrawMode) {
        // A trailing partial primitive is never drawn
        let whole = self.primitive_count(mode) * mode.vertices_per_primitive();
        self.indices_out.truncate(whole);

        self.clip_primitives(mode);
        self.transform_vertices();
        self.draw_primitives(mode);
    }

    pub fn clip_primitives(&mut self, mode: DrawMode) {
        match mode {
            DrawMode::Point => self.clip_points(),
            DrawMode::Line => self.clip_lines(),
            DrawMode::Triangle => self.clip_triangles(),
        }
    }

    fn compute_clip_masks(&mut self) {
        self.clip_mask.clear();
        self.clip_mask.extend(self.vertices_out.iter().map(ClipMask::of));
    }

    /// Discard points outside the clip volume
    pub fn clip_points(&mut self) {
        self.compute_clip_masks();

        let mut clipped = 0usize;
        for index in self.indices_out.iter_mut() {
            if *index >= 0 && !self.clip_mask[*index as usize].is_empty() {
                *index = DISCARDED_INDEX;
                clipped += 1;
            }
        }
        trace!(clipped, "clipped points");
    }

    /// Shorten lines to the clip volume, appending new endpoint vertices
    pub fn clip_lines(&mut self) {
        self.compute_clip_masks();

        let mut clipped = 0usize;
        for i in (0..self.indices_out.len() / 2).map(|p| p * 2) {
            let (i0, i1) = (self.indices_out[i], self.indices_out[i + 1]);
            if i0 < 0 || i1 < 0 {
                continue;
            }

            let mask0 = self.clip_mask[i0 as usize];
            let mask1 = self.clip_mask[i1 as usize];
            let mask = mask0 | mask1;
            if mask.is_empty() {
                continue;
            }

            let v0 = self.vertices_out[i0 as usize];
            let v1 = self.vertices_out[i1 as usize];
            let mut clipper = LineClipper::new(&v0, &v1);
            clipper.clip_to_mask(mask);

            if clipper.fully_clipped {
                self.indices_out[i] = DISCARDED_INDEX;
                self.indices_out[i + 1] = DISCARDED_INDEX;
                clipped += 1;
                continue;
            }

            let (p0, p1) = clipper.endpoints();
            if !mask0.is_empty() {
                self.vertices_out.push(p0);
                self.indices_out[i] = (self.vertices_out.len() - 1) as i32;
            }
            if !mask1.is_empty() {
                self.vertices_out.push(p1);
                self.indices_out[i + 1] = (self.vertices_out.len() - 1) as i32;
            }
        }
        trace!(clipped, "clipped lines");
    }

    /// Clip triangles to the clip volume. A clipped polygon replaces its
    /// triangle with the first fan triangle; the rest of the fan is
    /// appended after the batch.
    pub fn clip_triangles(&mut self) {
        self.compute_clip_masks();

        let n = self.indices_out.len() - self.indices_out.len() % 3;
        let mut clipped = 0usize;
        let mut fanned = 0usize;

        for i in (0..n).step_by(3) {
            let tri = [self.indices_out[i], self.indices_out[i + 1], self.indices_out[i + 2]];
            if tri.iter().any(|&idx| idx < 0) {
                continue;
            }

            let mask = tri
                .iter()
                .fold(ClipMask::empty(), |m, &idx| m | self.clip_mask[idx as usize]);
            if mask.is_empty() {
                continue;
            }

            self.poly_clipper.init(tri[0] as usize, tri[1] as usize, tri[2] as usize);
            self.poly_clipper.clip_to_mask(&mut self.vertices_out, mask);

            if self.poly_clipper.fully_clipped() {
                self.indices_out[i..i + 3].fill(DISCARDED_INDEX);
                clipped += 1;
                continue;
            }

            let poly = self.poly_clipper.indices();
            self.indices_out[i] = poly[0] as i32;
            self.indices_out[i + 1] = poly[1] as i32;
            self.indices_out[i + 2] = poly[2] as i32;
            for k in 3..poly.len() {
                self.indices_out
                    .extend_from_slice(&[poly[0] as i32, poly[k - 1] as i32, poly[k] as i32]);
                fanned += 1;
            }
        }
        trace!(clipped, fanned, "clipped triangles");
    }

    /// Perspective divide and viewport transform, once per referenced
    /// vertex
    pub fn transform_vertices(&mut self) {
        self.already_processed.clear();
        self.already_processed.resize(self.vertices_out.len(), false);

        let viewport = self.viewport;
        let depth = self.depth_range;

        for &index in &self.indices_out {
            if index < 0 {
                continue;
            }
            let index = index as usize;
            if self.already_processed[index] {
                continue;
            }

            let v = &mut self.vertices_out[index];
            let inv_w = 1.0 / v.w;
            v.x *= inv_w;
            v.y *= inv_w;
            v.z *= inv_w;

            (v.x, v.y) = viewport.to_window(v.x, v.y);
            v.z = depth.map(v.z);

            self.already_processed[index] = true;
        }
    }

    /// Discard triangles by screen-space winding; kept triangles are
    /// reordered to the winding the rasterizer fills
    pub fn cull_triangles(&mut self) {
        let cull = self.cull_mode;
        let mut culled = 0usize;

        for tri in self.indices_out.chunks_exact_mut(3) {
            if tri.iter().any(|&idx| idx < 0) {
                continue;
            }

            let v0 = &self.vertices_out[tri[0] as usize];
            let v1 = &self.vertices_out[tri[1] as usize];
            let v2 = &self.vertices_out[tri[2] as usize];

            let facing = (v0.x - v1.x) * (v2.y - v1.y) - (v2.x - v1.x) * (v0.y - v1.y);

            if facing < 0.0 {
                if cull == CullMode::Cw {
                    tri.fill(DISCARDED_INDEX);
                    culled += 1;
                }
            } else if cull == CullMode::Ccw {
                tri.fill(DISCARDED_INDEX);
                culled += 1;
            } else {
                tri.swap(0, 2);
            }
        }
        trace!(culled, "culled triangles");
    }

    /// Hand the batch to the rasterizer
    pub fn draw_primitives(&mut self, mode: DrawMode) {
        match mode {
            DrawMode::Triangle => {
                self.cull_triangles();
                self.rasterizer.draw_triangle_list(&self.vertices_out, &self.indices_out);
            }
            DrawMode::Line => self.rasterizer.draw_line_list(&self.vertices_out, &self.indices_out),
            DrawMode::Point => self.rasterizer.draw_point_list(&self.vertices_out, &self.indices_out),
        }
    }
}
