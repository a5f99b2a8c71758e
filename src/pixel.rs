//! The pixel engine: per-pixel coverage, depth test, perspective-correct
//! attribute blending, fragment invocation, and attachment writeback.
//!
//! Grounded on `original_source/src/graphics/rasterizer.c`'s
//! `render_pixel`, `shader_blend_parameters`, and `pre_fragment_tests`.

use crate::blend::blend_pixel;
use crate::image::{Framebuffer, PixelFormat};
use crate::pipeline::{ElementType, Pipeline, ShaderContext};
use crate::primitive::{face_contains_point, VertexOutput};

/// Everything the pixel engine needs for one face, shared read-only
/// across every scanline worker processing that face.
pub struct RenderContext<'a> {
    pub pipeline: &'a Pipeline,
    pub instance_id: u32,
    pub uniform_data: *const (),
    pub outputs: &'a [VertexOutput],
    pub working_slab: &'a [u8],
}

impl<'a> RenderContext<'a> {
    #[inline]
    fn working_data_for(&self, slot: usize) -> &'a [u8] {
        let size = self.pipeline.shader.working_data_size;
        &self.working_slab[slot * size..(slot + 1) * size]
    }
}

/// Perspective-correct blend of every declared [`BlendedParameter`] into
/// `fragment_working_data`.
fn blend_parameters(rc: &RenderContext, weights: &[f32], depth: f32, fragment_working_data: &mut [u8]) {
    for parameter in &rc.pipeline.shader.blended_parameters {
        let stride = parameter.element_type.element_stride();
        for j in 0..parameter.count as usize {
            let byte_offset = parameter.offset + j * stride;

            let mut result = 0.0f32;
            for (k, output) in rc.outputs.iter().enumerate() {
                let source = rc.working_data_for(k);
                let vertex_value = match parameter.element_type {
                    ElementType::Byte => source[byte_offset] as f32,
                    ElementType::Float => {
                        f32::from_ne_bytes(source[byte_offset..byte_offset + 4].try_into().unwrap())
                    }
                };

                let vertex_z = output.position[2];
                result += vertex_value * weights[k] / vertex_z;
            }

            result *= depth;

            match parameter.element_type {
                ElementType::Byte => {
                    fragment_working_data[byte_offset] = result as u8;
                }
                ElementType::Float => {
                    fragment_working_data[byte_offset..byte_offset + 4]
                        .copy_from_slice(&result.to_ne_bytes());
                }
            }
        }
    }
}

/// Pre-fragment depth test: fails (returns `false`) when a depth
/// attachment is bound, depth testing is enabled, and the incoming
/// fragment is farther than what's stored.
///
/// # Safety
/// The caller must hold exclusive access to `(x, y)` across every bound
/// attachment (see [`crate::image::Image::read_color_exclusive`]).
unsafe fn pre_fragment_test(pipeline: &Pipeline, fb: &Framebuffer, x: u32, y: u32, depth: f32) -> bool {
    if !pipeline.depth.test {
        return true;
    }
    for attachment in fb.attachments() {
        if attachment.format() == PixelFormat::Depth {
            let stored = attachment.read_depth_exclusive(x, y);
            if depth > stored {
                return false;
            }
        }
    }
    true
}

/// Render one covered pixel: coverage test, depth test, attribute blend,
/// fragment invocation, attachment writeback.
///
/// # Safety
/// The caller must guarantee exclusive access to `(x, y)` across every
/// attachment in `fb` — upheld by the scanline scheduler's row-disjoint
/// partitioning (spec.md §5).
pub unsafe fn render_pixel(x: u32, y: u32, rc: &RenderContext, fb: &Framebuffer) {
    let point = [
        (x as f32 + 0.5) / fb.width() as f32 * 2.0 - 1.0,
        (y as f32 + 0.5) / fb.height() as f32 * 2.0 - 1.0,
    ];

    let positions: Vec<[f32; 4]> = rc.outputs.iter().map(|o| o.position).collect();
    let mut weights = vec![0.0f32; positions.len()];

    let cw = rc.pipeline.winding == crate::pipeline::Winding::Cw;
    if !face_contains_point(cw, rc.pipeline.cull_back, &positions, point, &mut weights) {
        return;
    }

    let mut inverse_depth = 0.0f32;
    for (k, output) in rc.outputs.iter().enumerate() {
        inverse_depth += weights[k] / output.position[2];
    }
    let depth = 1.0 / inverse_depth;

    if !pre_fragment_test(rc.pipeline, fb, x, y, depth) {
        return;
    }

    let mut fragment_working_data = vec![0u8; rc.pipeline.shader.working_data_size];
    blend_parameters(rc, &weights, depth, &mut fragment_working_data);

    let ctx = ShaderContext {
        vertex_index: 0, // undefined in the fragment stage, spec.md §6
        instance_index: rc.instance_id,
        uniform_data: rc.uniform_data,
        working_data: &mut fragment_working_data,
    };
    let src_color = (rc.pipeline.shader.fragment_stage)(&ctx);

    let mut blend_index = 0usize;
    for attachment in fb.attachments() {
        match attachment.format() {
            PixelFormat::Color => {
                let dst_color = attachment.read_color_exclusive(x, y);
                let value = if blend_index < rc.pipeline.blend_attachments.len() {
                    let result = blend_pixel(src_color, dst_color, &rc.pipeline.blend_attachments[blend_index]);
                    blend_index += 1;
                    result
                } else {
                    src_color
                };
                attachment.write_color_exclusive(x, y, value);
            }
            PixelFormat::Depth => {
                if rc.pipeline.depth.write {
                    attachment.write_depth_exclusive(x, y, depth);
                }
            }
        }
    }
}
