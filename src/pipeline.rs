//! Pipeline state: shader contract, vertex bindings, depth/blend modes.
//!
//! Shaped after the original `struct pipeline`/`struct shader`
//! (`rasterizer.h`), with the `DepthMode`-as-named-constants idiom
//! borrowed from the teacher's own `Pipeline` design (`euc`'s
//! `pipeline.rs`, `DepthMode::{LESS_WRITE, ...}`) in place of the
//! original's bare `bool test; bool write;` pair — kept here as two plain
//! `bool`s since that's exactly the spec's data model (spec.md §3).

/// The byte layout of one vertex-shader working-data element to be
/// perspective-interpolated for the fragment shader.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    Byte,
    Float,
}

impl ElementType {
    #[inline]
    pub fn element_stride(self) -> usize {
        match self {
            ElementType::Byte => 1,
            ElementType::Float => core::mem::size_of::<f32>(),
        }
    }
}

/// A declared sub-range of the working-data buffer that the pixel engine
/// perspective-interpolates before invoking the fragment stage.
#[derive(Copy, Clone, Debug)]
pub struct BlendedParameter {
    pub offset: usize,
    pub element_type: ElementType,
    pub count: u32,
}

/// Per-vertex/per-fragment shader invocation context.
///
/// `vertex_index` is meaningful only during the vertex stage; the pixel
/// engine leaves it at its last-set value when invoking the fragment
/// stage, matching spec.md §6 ("vertex_index undefined" in the fragment
/// stage).
pub struct ShaderContext<'a> {
    pub vertex_index: u32,
    pub instance_index: u32,
    pub uniform_data: *const (),
    pub working_data: &'a mut [u8],
}

/// The programmable shader pair plus the inter-stage parameter list.
pub struct Shader {
    /// Bytes of per-vertex scratch the vertex stage may write and the
    /// fragment stage observes (zero-initialized for the fragment
    /// working-data buffer; see spec.md §5).
    pub working_data_size: usize,

    pub vertex_stage: fn(vertex_data: &[*const u8], ctx: &mut ShaderContext, position: &mut [f32; 4]),
    pub fragment_stage: fn(ctx: &ShaderContext) -> u32,

    pub blended_parameters: Vec<BlendedParameter>,
}

impl Shader {
    /// Highest byte offset touched by any declared blended parameter;
    /// `working_data_size` must be at least this (spec.md §3 invariant).
    pub fn touched_byte_range(&self) -> usize {
        self.blended_parameters
            .iter()
            .map(|p| p.offset + p.count as usize * p.element_type.element_stride())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputRate {
    PerVertex,
    PerInstance,
}

#[derive(Copy, Clone, Debug)]
pub struct VertexBinding {
    pub stride: usize,
    pub input_rate: InputRate,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Winding {
    Ccw,
    Cw,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Quads,
}

impl Topology {
    #[inline]
    pub fn vertices_per_face(self) -> u8 {
        match self {
            Topology::Triangles => 3,
            Topology::Quads => 4,
        }
    }
}

/// Whether and how a draw interacts with a bound depth attachment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct DepthMode {
    pub test: bool,
    pub write: bool,
}

impl DepthMode {
    pub const NONE: Self = Self { test: false, write: false };
    pub const TEST_AND_WRITE: Self = Self { test: true, write: true };
    pub const TEST_ONLY: Self = Self { test: true, write: false };
    pub const WRITE_ONLY: Self = Self { test: false, write: true };
}

use crate::blend::BlendAttachment;

/// Immutable-for-the-duration-of-the-draw pipeline state.
pub struct Pipeline {
    pub shader: Shader,
    pub depth: DepthMode,
    pub winding: Winding,
    pub cull_back: bool,
    pub topology: Topology,
    pub bindings: Vec<VertexBinding>,
    pub blend_attachments: Vec<BlendAttachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touched_byte_range_is_max_extent() {
        let shader = Shader {
            working_data_size: 16,
            vertex_stage: |_, _, _| {},
            fragment_stage: |_| 0,
            blended_parameters: vec![
                BlendedParameter { offset: 0, element_type: ElementType::Float, count: 1 },
                BlendedParameter { offset: 4, element_type: ElementType::Float, count: 3 },
            ],
        };
        assert_eq!(shader.touched_byte_range(), 4 + 3 * 4);
        assert!(shader.touched_byte_range() <= shader.working_data_size);
    }

    #[test]
    fn topology_vertex_counts() {
        assert_eq!(Topology::Triangles.vertices_per_face(), 3);
        assert_eq!(Topology::Quads.vertices_per_face(), 4);
    }
}
