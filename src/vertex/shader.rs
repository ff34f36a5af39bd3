//! Vertex shader callback and its inputs

use std::fmt;

use bytemuck::Pod;

use crate::rasterizer::RasterizerVertex;
use crate::MAX_VERTEX_ATTRIBS;

/// Clip-space output of the vertex shader; transformed in place to
/// screen space before rasterization
pub type VertexShaderOutput = RasterizerVertex;

/// One bound attribute stream
#[derive(Debug, Clone, Copy, Default)]
pub struct Attribute<'a> {
    pub buffer: &'a [u8],
    pub stride: usize,
}

impl<'a> Attribute<'a> {
    /// Bytes of element `index` onward; empty past the end
    pub fn element(&self, index: usize) -> &'a [u8] {
        self.buffer.get(self.stride * index..).unwrap_or(&[])
    }
}

/// Attribute data for the vertex being shaded
#[derive(Debug, Clone, Copy)]
pub struct VertexShaderInput<'v> {
    attribs: [&'v [u8]; MAX_VERTEX_ATTRIBS],
    count: usize,
}

impl<'v> VertexShaderInput<'v> {
    pub fn new(attributes: &[Attribute<'v>], index: usize) -> Self {
        assert!(attributes.len() <= MAX_VERTEX_ATTRIBS, "too many vertex attributes");
        let mut attribs: [&'v [u8]; MAX_VERTEX_ATTRIBS] = [&[]; MAX_VERTEX_ATTRIBS];
        for (slot, attrib) in attribs.iter_mut().zip(attributes) {
            *slot = attrib.element(index);
        }
        Self {
            attribs,
            count: attributes.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Raw bytes of attribute `i`, starting at this vertex's element
    pub fn attrib(&self, i: usize) -> &'v [u8] {
        assert!(i < self.count, "attribute {} not enabled ({} bound)", i, self.count);
        self.attribs[i]
    }

    /// Decode attribute `i` as a `T` (unaligned read)
    pub fn read<T: Pod>(&self, i: usize) -> T {
        let bytes = self.attrib(i);
        let size = std::mem::size_of::<T>();
        assert!(bytes.len() >= size, "attribute {} buffer too short for element", i);
        bytemuck::pod_read_unaligned(&bytes[..size])
    }
}

/// Shader body: reads the input, writes clip-space position and varyings
pub type VertexShaderFn<'a> = Box<dyn Fn(&VertexShaderInput<'_>, &mut VertexShaderOutput) + 'a>;

/// Vertex shader record.
///
/// The callback must be a pure function of its input: outputs are reused
/// for repeated indices within a batch.
pub struct VertexShader<'a> {
    attrib_count: usize,
    process: VertexShaderFn<'a>,
}

impl fmt::Debug for VertexShader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexShader").field("attrib_count", &self.attrib_count).finish()
    }
}

impl<'a> VertexShader<'a> {
    pub fn new<F>(attrib_count: usize, process: F) -> Self
    where
        F: Fn(&VertexShaderInput<'_>, &mut VertexShaderOutput) + 'a,
    {
        assert!(
            attrib_count <= MAX_VERTEX_ATTRIBS,
            "attrib_count {} exceeds MAX_VERTEX_ATTRIBS",
            attrib_count
        );
        Self {
            attrib_count,
            process: Box::new(process),
        }
    }

    pub fn attrib_count(&self) -> usize {
        self.attrib_count
    }

    #[inline]
    pub fn process(&self, input: &VertexShaderInput<'_>, out: &mut VertexShaderOutput) {
        (self.process)(input, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_reads_strided_elements() {
        let positions: [[f32; 2]; 3] = [[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]];
        let attribs = [Attribute {
            buffer: bytemuck::cast_slice(&positions),
            stride: 8,
        }];
        let input = VertexShaderInput::new(&attribs, 2);
        assert_eq!(input.len(), 1);
        assert_eq!(input.read::<[f32; 2]>(0), [4.0, 5.0]);
    }

    #[test]
    fn test_interleaved_unaligned_read() {
        // u8 tag followed by an f32, packed
        let mut bytes = Vec::new();
        for i in 0..3u8 {
            bytes.push(i);
            bytes.extend_from_slice(&(i as f32 * 1.5).to_ne_bytes());
        }
        let attribs = [
            Attribute { buffer: &bytes, stride: 5 },
            Attribute { buffer: &bytes[1..], stride: 5 },
        ];
        let input = VertexShaderInput::new(&attribs, 1);
        assert_eq!(input.read::<u8>(0), 1);
        assert!((input.read::<f32>(1) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_element_is_empty() {
        let data = [1u8, 2, 3];
        let attrib = Attribute { buffer: &data, stride: 2 };
        assert_eq!(attrib.element(1), &[3]);
        assert!(attrib.element(5).is_empty());
    }

    #[test]
    #[should_panic]
    fn test_unbound_attribute_panics() {
        let input = VertexShaderInput::new(&[], 0);
        let _ = input.attrib(0);
    }

    #[test]
    fn test_shader_runs_callback() {
        let shader = VertexShader::new(0, |_input, out| {
            out.x = 1.0;
            out.avar[0] = 2.0;
        });
        let mut out = VertexShaderOutput::default();
        shader.process(&VertexShaderInput::new(&[], 0), &mut out);
        assert_eq!(out.x, 1.0);
        assert_eq!(out.avar[0], 2.0);
    }

    #[test]
    #[should_panic]
    fn test_too_many_attributes() {
        let _ = VertexShader::new(MAX_VERTEX_ATTRIBS + 1, |_, _| {});
    }
}
