//! Vertex processing: shading, batching, clipping, culling and the
//! viewport transform that feeds the rasterizer

mod cache;
mod clip;
mod processor;
mod shader;

pub use cache::*;
pub use clip::*;
pub use processor::*;
pub use shader::*;
