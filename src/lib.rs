//! softpipe: CPU-side 3D rendering pipeline
//!
//! Turns vertex attribute arrays and index lists into shaded pixels:
//! - Vertex batching with a small direct-mapped vertex cache
//! - Homogeneous clipping of points, lines and triangles
//! - Backface culling and viewport transform
//! - Span (scanline) and block (tiled) triangle rasterization
//! - Perspective-correct attribute interpolation
//!
//! There is no windowing or framebuffer here. Shading is done by
//! caller-supplied callbacks: a vertex shader producing clip-space
//! positions and a pixel callback receiving interpolated [`PixelData`].
//!
//! ```no_run
//! use softpipe::{PixelShader, Rasterizer, RasterizerVertex, ScissorRect};
//!
//! let mut hits = 0;
//! {
//!     let mut r = Rasterizer::new();
//!     r.set_scissor_rect(ScissorRect::new(0, 0, 640, 480));
//!     r.set_pixel_shader(PixelShader::new(false, false, 0, 0, |_p| hits += 1));
//!     r.draw_triangle(
//!         &RasterizerVertex::at(320.0, 100.0),
//!         &RasterizerVertex::at(480.0, 200.0),
//!         &RasterizerVertex::at(120.0, 300.0),
//!     );
//! }
//! assert!(hits > 0);
//! ```

pub mod config;
pub mod rasterizer;
pub mod vertex;

pub use config::*;
pub use rasterizer::*;
pub use vertex::*;

/// Edge length of a square tile in block rasterization (power of two)
pub const BLOCK_SIZE: i32 = 8;

/// Maximum affine variables interpolated across a triangle
pub const MAX_AVARS: usize = 16;

/// Maximum perspective-correct variables interpolated across a triangle
pub const MAX_PVARS: usize = 16;

/// Maximum number of vertex attribute bindings
pub const MAX_VERTEX_ATTRIBS: usize = 8;

/// Number of slots in the direct-mapped vertex cache
pub const VERTEX_CACHE_SIZE: usize = 16;

/// A batch is flushed once it holds this many primitives
pub const MAX_BATCH_PRIMITIVES: usize = 1024;

/// Index value marking a discarded primitive
pub const DISCARDED_INDEX: i32 = -1;
