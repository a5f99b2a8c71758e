//! Vertex-stage invocation, face assembly, the barycentric coverage
//! test, and scissor derivation.
//!
//! Grounded on `original_source/src/graphics/rasterizer.c`:
//! `process_face_vertices`, `signed_quad_area`, `face_contains_point`,
//! `gen_scissor_rect`. The screen-space barycentric technique in
//! `euc::rasterizer::triangles::Triangles::draw`
//! (`examples/zesterer-euc/src/rasterizer/triangles.rs`) informed the
//! edge-function shape, though that version perspective-divides
//! homogeneous coordinates where this crate's vertex stage is contractually
//! required to have already done so (spec.md §6).

use crate::math;
use crate::pipeline::{InputRate, Pipeline, ShaderContext};

/// Output of one vertex slot: the position the vertex stage wrote, plus
/// the byte range of the working-data slab belonging to this slot.
#[derive(Copy, Clone, Debug)]
pub struct VertexOutput {
    pub position: [f32; 4],
}

/// An axis-aligned pixel rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A raw, unowned view of one bound vertex buffer.
#[derive(Copy, Clone)]
pub struct VertexBufferView<'a> {
    pub data: &'a [u8],
}

/// Run the vertex stage for every vertex slot of one face, writing
/// `outputs[i].position` and the corresponding slice of `working_slab`.
///
/// `working_slab` must be `vertices_per_face * working_data_size` bytes;
/// slot `i` owns `working_slab[i*working_data_size .. (i+1)*working_data_size]`.
#[allow(clippy::too_many_arguments)]
pub fn process_face_vertices(
    pipeline: &Pipeline,
    vertex_buffers: &[VertexBufferView],
    indices: &[u16],
    vertex_offset: u32,
    first_index: u32,
    instance_id: u32,
    face_id: u32,
    vertices_per_face: u8,
    uniform_data: *const (),
    working_slab: &mut [u8],
    outputs: &mut [VertexOutput],
    mut capture: Option<&mut crate::capture::CapturedPrimitive>,
) {
    let working_data_size = pipeline.shader.working_data_size;
    debug_assert_eq!(outputs.len(), vertices_per_face as usize);
    debug_assert_eq!(working_slab.len(), working_data_size * vertices_per_face as usize);

    if let Some(captured) = capture.as_deref_mut() {
        captured.instance_index = instance_id;
        captured.indices = Vec::with_capacity(vertices_per_face as usize);
        captured.working_data = vec![0u8; working_data_size * vertices_per_face as usize];
        captured.vertex_positions = vec![0.0f32; 4 * vertices_per_face as usize];
    }

    for slot in 0..vertices_per_face as usize {
        let index_id = first_index as usize + face_id as usize * vertices_per_face as usize + slot;
        let global_index = vertex_offset + indices[index_id] as u32;

        let mut vertex_data: Vec<*const u8> = Vec::with_capacity(pipeline.bindings.len());
        for (binding, buffer) in pipeline.bindings.iter().zip(vertex_buffers.iter()) {
            let buffer_index = match binding.input_rate {
                InputRate::PerVertex => global_index,
                InputRate::PerInstance => instance_id,
            };
            let offset = buffer_index as usize * binding.stride;
            debug_assert!(offset + binding.stride <= buffer.data.len(), "vertex binding out of bounds");
            vertex_data.push(unsafe { buffer.data.as_ptr().add(offset) });
        }

        let slab_start = slot * working_data_size;
        let working_data = &mut working_slab[slab_start..slab_start + working_data_size];

        let mut position = [0.0f32, 0.0, 0.0, 1.0];
        let mut ctx = ShaderContext {
            vertex_index: global_index,
            instance_index: instance_id,
            uniform_data,
            working_data,
        };
        (pipeline.shader.vertex_stage)(&vertex_data, &mut ctx, &mut position);
        outputs[slot].position = position;

        if let Some(captured) = capture.as_deref_mut() {
            captured.indices.push(global_index);
            let dst = &mut captured.working_data
                [slot * working_data_size..(slot + 1) * working_data_size];
            dst.copy_from_slice(&working_slab[slab_start..slab_start + working_data_size]);
            captured.vertex_positions[slot * 4..slot * 4 + 4].copy_from_slice(&position);
        }
    }
}

/// Signed area of the triangle `(a, b, p)`, positive on the interior side
/// for the configured winding.
#[inline]
fn signed_edge_area(a: [f32; 2], b: [f32; 2], p: [f32; 2], cw: bool) -> f32 {
    let ab = math::sub2(b, a);
    let ab_normal = math::rot90(ab, cw);
    let ap = math::sub2(p, a);
    math::dot2(ap, ab_normal)
}

/// The barycentric coverage test (spec.md §4.3).
///
/// On acceptance, `weights[k]` is vertex `k`'s barycentric weight and
/// `Σ weights ≈ 1`.
pub fn face_contains_point(
    cw: bool,
    cull_back: bool,
    positions: &[[f32; 4]],
    point: [f32; 2],
    weights: &mut [f32],
) -> bool {
    let vertices = positions.len();
    debug_assert_eq!(weights.len(), vertices);

    let mut areas = vec![0.0f32; vertices];
    let mut area_sum = 0.0f32;

    for i in 0..vertices {
        let a = [positions[i][0], positions[i][1]];
        let next = (i + 1) % vertices;
        let b = [positions[next][0], positions[next][1]];

        let area = signed_edge_area(a, b, point, cw);
        if cull_back && area <= 0.0 {
            return false;
        }

        area_sum += area;
        areas[(i + 2) % vertices] = area;
    }

    if area_sum <= 0.0 {
        area_sum = -area_sum;
    }

    let first_out = areas[0] <= 0.0;
    for i in 0..vertices {
        weights[i] = areas[i] / area_sum;

        if i > 0 && !cull_back {
            let current_out = areas[i] <= 0.0;
            if first_out != current_out {
                return false;
            }
        }
    }

    true
}

/// Map one clip-space coordinate to pixel space.
#[inline]
fn map_dimension(value: f32, size: u32) -> f32 {
    if value < -1.0 {
        return 0.0;
    }
    if value > 1.0 {
        return size as f32;
    }
    math::clamp01((value + 1.0) / 2.0) * size as f32
}

/// Derive the tight pixel-space AABB of a face's vertex positions,
/// intersected with an optional user scissor.
///
/// Returns `None` if the intersection is empty.
pub fn derive_scissor(
    positions: &[[f32; 4]],
    fb_width: u32,
    fb_height: u32,
    user_scissor: Option<Rect>,
) -> Option<Rect> {
    let mut x0 = f32::INFINITY;
    let mut y0 = f32::INFINITY;
    let mut x1 = f32::NEG_INFINITY;
    let mut y1 = f32::NEG_INFINITY;

    for position in positions {
        let x = map_dimension(position[0], fb_width);
        let y = map_dimension(position[1], fb_height);

        x0 = x0.min(x.floor());
        y0 = y0.min(y.floor());
        x1 = x1.max(x.ceil());
        y1 = y1.max(y.ceil());
    }

    // Signed intermediate arithmetic avoids the unsigned-underflow hazard
    // spec.md §9 flags when an external scissor lies fully outside the
    // derived AABB.
    let mut ix0 = x0 as i64;
    let mut iy0 = y0 as i64;
    let mut ix1 = x1 as i64;
    let mut iy1 = y1 as i64;

    if let Some(scissor) = user_scissor {
        let sx0 = scissor.x as i64;
        let sy0 = scissor.y as i64;
        let sx1 = sx0 + scissor.width as i64;
        let sy1 = sy0 + scissor.height as i64;

        ix0 = ix0.max(sx0);
        iy0 = iy0.max(sy0);
        ix1 = ix1.min(sx1);
        iy1 = iy1.min(sy1);
    }

    if ix1 <= ix0 || iy1 <= iy0 {
        return None;
    }

    Some(Rect {
        x: ix0.max(0) as u32,
        y: iy0.max(0) as u32,
        width: (ix1 - ix0) as u32,
        height: (iy1 - iy0) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_accepts_interior_rejects_exterior() {
        // CCW triangle, no culling.
        let positions = [
            [-0.75, 0.75, 0.5, 1.0],
            [0.75, 0.75, 0.5, 1.0],
            [0.0, -0.75, 0.5, 1.0],
        ];
        let mut weights = [0.0f32; 3];
        assert!(face_contains_point(false, false, &positions, [0.0, 0.0], &mut weights));
        assert!(!face_contains_point(false, false, &positions, [0.99, 0.99], &mut weights));
    }

    #[test]
    fn barycentric_partition_of_unity() {
        let positions = [
            [-0.75, 0.75, 0.5, 1.0],
            [0.75, 0.75, 0.5, 1.0],
            [0.0, -0.75, 0.5, 1.0],
        ];
        let mut weights = [0.0f32; 3];
        assert!(face_contains_point(false, false, &positions, [0.1, 0.1], &mut weights));
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for w in weights {
            assert!((0.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn scenario_s6_back_face_cull() {
        // Triangle wound CW while pipeline expects CCW + cull_back -> rejected everywhere.
        let positions = [
            [-0.75, 0.75, 0.5, 1.0],
            [0.0, -0.75, 0.5, 1.0],
            [0.75, 0.75, 0.5, 1.0],
        ];
        let mut weights = [0.0f32; 3];
        assert!(!face_contains_point(false, true, &positions, [0.0, 0.0], &mut weights));
    }

    #[test]
    fn scenario_s5_scissor_intersection() {
        let positions = [
            [-1.0, -1.0, 0.5, 1.0],
            [1.0, -1.0, 0.5, 1.0],
            [1.0, 1.0, 0.5, 1.0],
            [-1.0, 1.0, 0.5, 1.0],
        ];
        let user = Rect { x: 2, y: 2, width: 4, height: 4 };
        let scissor = derive_scissor(&positions, 8, 8, Some(user)).unwrap();
        assert_eq!(scissor, Rect { x: 2, y: 2, width: 4, height: 4 });
    }

    #[test]
    fn scissor_fully_outside_user_rect_is_empty() {
        let positions = [
            [-1.0, -1.0, 0.5, 1.0],
            [-0.5, -1.0, 0.5, 1.0],
            [-0.5, -0.5, 0.5, 1.0],
        ];
        let user = Rect { x: 6, y: 6, width: 2, height: 2 };
        assert!(derive_scissor(&positions, 8, 8, Some(user)).is_none());
    }
}
