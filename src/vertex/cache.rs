//! Direct-mapped vertex cache

use crate::VERTEX_CACHE_SIZE;

/// Maps an input vertex index to the output slot already holding its
/// shaded vertex. A slot is valid only while its stored input index
/// matches the one queried.
#[derive(Debug, Clone)]
pub struct VertexCache {
    input_index: [i32; VERTEX_CACHE_SIZE],
    output_index: [usize; VERTEX_CACHE_SIZE],
}

impl Default for VertexCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexCache {
    pub fn new() -> Self {
        Self {
            input_index: [-1; VERTEX_CACHE_SIZE],
            output_index: [0; VERTEX_CACHE_SIZE],
        }
    }

    pub fn clear(&mut self) {
        self.input_index = [-1; VERTEX_CACHE_SIZE];
    }

    fn slot(index: i32) -> usize {
        index.unsigned_abs() as usize % VERTEX_CACHE_SIZE
    }

    pub fn set(&mut self, input: i32, output: usize) {
        if input < 0 {
            return;
        }
        let slot = Self::slot(input);
        self.input_index[slot] = input;
        self.output_index[slot] = output;
    }

    pub fn lookup(&self, input: i32) -> Option<usize> {
        if input < 0 {
            return None;
        }
        let slot = Self::slot(input);
        (self.input_index[slot] == input).then_some(self.output_index[slot])
    }
}
