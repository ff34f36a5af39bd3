//! Screen-space rasterizer
//!
//! Features:
//! - Edge functions with a tie-breaking rule for shared edges
//! - Affine and perspective-correct variable interpolation
//! - Span (scanline) and block (8x8 tile) triangle fill
//! - Adaptive selection between the two per triangle
//! - DDA lines and single-pixel points

mod equations;
mod render;
mod shader;
mod types;

pub use equations::*;
pub use render::*;
pub use shader::*;
pub use types::*;
