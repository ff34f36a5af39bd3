//! Demo mesh and the shaders that draw it

use bytemuck::{Pod, Zeroable};
use softpipe::{DrawMode, PipelineConfig, PixelShader, Rasterizer, VertexProcessor, VertexShader, VertexShaderOutput};

use crate::framebuffer::Framebuffer;
use crate::math::{Mat4, Vec3};
use crate::texture::Texture;

/// Interleaved vertex layout, bound as four strided attributes
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

const NORMAL_OFFSET: usize = 12;
const COLOR_OFFSET: usize = 24;
const UV_OFFSET: usize = 36;

pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<i32>,
}

impl Mesh {
    /// Unit cube with one color per face, counter-clockwise from outside
    pub fn cube() -> Self {
        // (outward normal, tangent, face color)
        let faces = [
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0), [1.0, 0.3, 0.3]),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::new(-1.0, 0.0, 0.0), [0.3, 1.0, 0.3]),
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), [0.3, 0.3, 1.0]),
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), [1.0, 1.0, 0.3]),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), [0.3, 1.0, 1.0]),
            (Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), [1.0, 0.3, 1.0]),
        ];
        let corners = [(-1.0, -1.0, [0.0, 1.0]), (1.0, -1.0, [1.0, 1.0]), (1.0, 1.0, [1.0, 0.0]), (-1.0, 1.0, [0.0, 0.0])];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, color) in faces {
            let v = normal.cross(u);
            let base = vertices.len() as i32;
            for (su, sv, uv) in corners {
                let p = normal + u * su + v * sv;
                vertices.push(MeshVertex {
                    position: p.to_array(),
                    normal: normal.to_array(),
                    color,
                    uv,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }
}

/// Direction the light comes from, in world space
const LIGHT_DIR: Vec3 = Vec3 { x: 0.4, y: 0.7, z: 0.6 };
const AMBIENT: f32 = 0.25;

/// Draw `mesh` into `fb`: Gouraud-lit vertex colors modulating a
/// perspective-correct texture, depth tested
pub fn render_mesh(fb: &mut Framebuffer, mesh: &Mesh, texture: &Texture, config: &PipelineConfig, model: Mat4, view_proj: Mat4) {
    let mvp = view_proj * model;

    let mut rasterizer = Rasterizer::new();
    rasterizer.set_pixel_shader(PixelShader::new(true, false, 3, 2, |p| {
        let texel = texture.sample(p.pvar[0], p.pvar[1]);
        let color = texel.modulate(p.avar[0], p.avar[1], p.avar[2]);
        fb.set_pixel_with_depth(p.x, p.y, p.z, color);
    }));

    let mut vp = VertexProcessor::new(rasterizer);
    vp.apply_config(config);
    vp.set_vertex_shader(VertexShader::new(4, move |input, out| {
        let position: [f32; 3] = input.read(0);
        let normal: [f32; 3] = input.read(1);
        let color: [f32; 3] = input.read(2);
        let uv: [f32; 2] = input.read(3);

        let [x, y, z, w] = mvp.transform_point(position);
        let n = model.transform_vector(Vec3::new(normal[0], normal[1], normal[2]));
        let light = AMBIENT + (1.0 - AMBIENT) * n.dot(LIGHT_DIR).max(0.0);

        *out = VertexShaderOutput::new(x, y, z, w)
            .with_avars(&[color[0] * light, color[1] * light, color[2] * light])
            .with_pvars(&uv);
    }));

    let bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
    let stride = std::mem::size_of::<MeshVertex>();
    vp.set_vertex_attrib_pointer(0, stride, bytes);
    vp.set_vertex_attrib_pointer(1, stride, &bytes[NORMAL_OFFSET..]);
    vp.set_vertex_attrib_pointer(2, stride, &bytes[COLOR_OFFSET..]);
    vp.set_vertex_attrib_pointer(3, stride, &bytes[UV_OFFSET..]);

    vp.draw_elements(DrawMode::Triangle, &mesh.indices);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Color;
    use softpipe::{CullMode, RasterMode};

    /// Count of pixels differing from `background`
    fn covered_pixels(fb: &Framebuffer, background: Color) -> usize {
        fb.pixels
            .chunks_exact(4)
            .filter(|px| *px != background.to_bytes().as_slice())
            .count()
    }

    fn view_proj() -> Mat4 {
        Mat4::perspective(1.0, 4.0 / 3.0, 0.5, 20.0) * Mat4::translation(Vec3::new(0.0, 0.0, -5.0))
    }

    #[test]
    fn test_cube_layout() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 44);
        // Every face winds counter-clockwise around its outward normal
        for tri in cube.indices.chunks(3) {
            let p = |i: i32| {
                let v = cube.vertices[i as usize].position;
                Vec3::new(v[0], v[1], v[2])
            };
            let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
            let n = (b + a * -1.0).cross(c + a * -1.0);
            let normal = cube.vertices[tri[0] as usize].normal;
            assert!(n.dot(Vec3::new(normal[0], normal[1], normal[2])) > 0.0);
        }
    }

    #[test]
    fn test_modes_agree_on_coverage() {
        let cube = Mesh::cube();
        let texture = Texture::checkerboard(16, 16, Color::WHITE, Color::new(128, 128, 128));
        let model = Mat4::rotation_y(0.6) * Mat4::rotation_x(0.4);

        let mut counts = Vec::new();
        for mode in [RasterMode::Span, RasterMode::Block, RasterMode::Adaptive] {
            let mut config = PipelineConfig::for_target(160, 120);
            config.raster_mode = mode;
            let mut fb = Framebuffer::new(160, 120);
            fb.clear(Color::new(0, 0, 0));
            render_mesh(&mut fb, &cube, &texture, &config, model, view_proj());
            counts.push(covered_pixels(&fb, Color::new(0, 0, 0)));
        }
        assert!(counts[0] > 1000, "{:?}", counts);
        for c in &counts[1..] {
            assert!(c.abs_diff(counts[0]) * 50 < counts[0], "{:?}", counts);
        }
    }

    #[test]
    fn test_culling_hides_back_faces() {
        let cube = Mesh::cube();
        let texture = Texture::checkerboard(16, 16, Color::WHITE, Color::WHITE);
        let model = Mat4::rotation_y(0.6);

        let draw = |cull| {
            let mut config = PipelineConfig::for_target(160, 120);
            config.cull_mode = cull;
            let mut fb = Framebuffer::new(160, 120);
            fb.clear(Color::new(0, 0, 0));
            render_mesh(&mut fb, &cube, &texture, &config, model, view_proj());
            covered_pixels(&fb, Color::new(0, 0, 0))
        };

        // Back faces alone cover the same silhouette as front faces
        let front = draw(CullMode::Cw);
        let back = draw(CullMode::Ccw);
        let both = draw(CullMode::None);
        assert!(front > 1000);
        assert!(back.abs_diff(front) * 20 < front);
        assert!(both.abs_diff(front) * 20 < front);
    }
}
