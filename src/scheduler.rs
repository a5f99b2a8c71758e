//! Scanline dispatch: decomposes one face's scissor rect into
//! row-interleaved jobs, submits them to the [`WorkerPool`], and joins on
//! a [`CountingSemaphore`].
//!
//! The persistent-pool + semaphore shape is grounded on
//! `original_source/src/graphics/rasterizer.c`'s `render_face`/
//! `render_scanline`, which pass a `const struct scanline_job *` — a raw
//! pointer into the calling stack frame — into `thread_worker_push_job`.
//! `SendPtr` below is the same trick made explicit: our jobs are
//! `'static`-bound (the pool is long-lived, unlike the teacher's
//! `euc::pipeline::render_par`, which borrows scoped threads instead), so
//! crossing a borrowed `RenderContext`/`Framebuffer` into them needs an
//! unsafe pointer hop, soundness resting on the same guarantee `euc`
//! documents for `Target::write_exclusive_unchecked`: the orchestrator
//! blocks on the join semaphore before the borrow's lifetime ends, so no
//! worker ever outlives the data it points at.

use crate::image::Framebuffer;
use crate::pixel::{render_pixel, RenderContext};
use crate::primitive::Rect;
use crate::semaphore::CountingSemaphore;
use crate::worker::WorkerPool;

/// A `*const T` wrapper asserting the pointee will outlive every submitted
/// job — upheld by `dispatch`'s semaphore join before returning.
struct SendPtr<T: ?Sized>(*const T);

// Safety: see the module doc comment; `dispatch` never returns before every
// job holding a `SendPtr` has run to completion.
unsafe impl<T: ?Sized> Send for SendPtr<T> {}

impl<T: ?Sized> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        SendPtr(self.0)
    }
}
impl<T: ?Sized> Copy for SendPtr<T> {}

fn render_scanline(rc: &RenderContext, fb: &Framebuffer, scissor: &Rect, row_offset: u32, row_stride: u32) {
    let mut y = scissor.y + row_offset;
    while y < scissor.y + scissor.height {
        for x_offset in 0..scissor.width {
            let x = scissor.x + x_offset;
            // Safety: each worker owns a distinct `row_offset` residue
            // class mod `row_stride`, so no two workers ever touch the
            // same row of `fb` concurrently.
            unsafe {
                render_pixel(x, y, rc, fb);
            }
        }
        y += row_stride;
    }
}

/// Rasterize one face's `scissor` rect, interleaving rows across `pool`'s
/// worker threads and blocking until every row has been rendered.
///
/// With `pool` absent (single-threaded configuration, spec.md §4.1),
/// renders every row on the calling thread directly.
pub fn dispatch(rc: &RenderContext, fb: &Framebuffer, scissor: &Rect, pool: Option<&WorkerPool>) {
    if scissor.is_empty() {
        return;
    }

    let pool = match pool {
        Some(pool) if pool.thread_count() > 1 => pool,
        _ => {
            render_scanline(rc, fb, scissor, 0, 1);
            return;
        }
    };

    // K = min(scissor.height, N_workers), spec.md §4.6.
    let row_stride = scissor.height.min(pool.thread_count() as u32);
    let semaphore = CountingSemaphore::new();

    let rc_ptr = SendPtr(rc as *const RenderContext);
    let fb_ptr = SendPtr(fb as *const Framebuffer);
    let scissor_ptr = SendPtr(scissor as *const Rect);
    let semaphore_ptr = SendPtr(&semaphore as *const CountingSemaphore);

    for row_offset in 0..row_stride {
        let rc_ptr = rc_ptr;
        let fb_ptr = fb_ptr;
        let scissor_ptr = scissor_ptr;
        let semaphore_ptr = semaphore_ptr;
        pool.submit(move || {
            // Safety: see `SendPtr`'s and this module's doc comments.
            unsafe {
                let rc = &*rc_ptr.0;
                let fb = &*fb_ptr.0;
                let scissor = &*scissor_ptr.0;
                let semaphore = &*semaphore_ptr.0;
                render_scanline(rc, fb, scissor, row_offset, row_stride);
                semaphore.signal();
            }
        });
    }

    semaphore.wait_for(row_stride as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Image, PixelFormat};
    use crate::pipeline::{DepthMode, Pipeline, Shader, Topology, VertexBinding, Winding};
    use crate::primitive::VertexOutput;

    fn solid_pipeline() -> Pipeline {
        Pipeline {
            shader: Shader {
                working_data_size: 0,
                vertex_stage: |_, _, _| {},
                fragment_stage: |_| 0x00FF00FFu32,
                blended_parameters: Vec::new(),
            },
            depth: DepthMode::NONE,
            winding: Winding::Ccw,
            cull_back: false,
            topology: Topology::Triangles,
            bindings: Vec::<VertexBinding>::new(),
            blend_attachments: Vec::new(),
        }
    }

    #[test]
    fn dispatch_single_threaded_covers_full_scissor() {
        let pipeline = solid_pipeline();
        let outputs = [
            VertexOutput { position: [-1.0, -1.0, 0.5, 1.0] },
            VertexOutput { position: [1.0, -1.0, 0.5, 1.0] },
            VertexOutput { position: [1.0, 1.0, 0.5, 1.0] },
            VertexOutput { position: [-1.0, 1.0, 0.5, 1.0] },
        ];
        let working_slab: [u8; 0] = [];
        let rc = RenderContext {
            pipeline: &pipeline,
            instance_id: 0,
            uniform_data: std::ptr::null(),
            outputs: &outputs,
            working_slab: &working_slab,
        };
        let mut color = Image::new(4, 4, PixelFormat::Color);
        let fb = Framebuffer::new(vec![&mut color]);
        let scissor = Rect { x: 0, y: 0, width: 4, height: 4 };

        dispatch(&rc, &fb, &scissor, None);

        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(fb.attachment(0).get_color(x, y), 0x00FF00FF);
            }
        }
    }

    #[test]
    fn dispatch_multithreaded_matches_single_threaded() {
        let pipeline = solid_pipeline();
        let outputs = [
            VertexOutput { position: [-1.0, -1.0, 0.5, 1.0] },
            VertexOutput { position: [1.0, -1.0, 0.5, 1.0] },
            VertexOutput { position: [1.0, 1.0, 0.5, 1.0] },
            VertexOutput { position: [-1.0, 1.0, 0.5, 1.0] },
        ];
        let working_slab: [u8; 0] = [];
        let rc = RenderContext {
            pipeline: &pipeline,
            instance_id: 0,
            uniform_data: std::ptr::null(),
            outputs: &outputs,
            working_slab: &working_slab,
        };
        let mut color = Image::new(16, 16, PixelFormat::Color);
        let fb = Framebuffer::new(vec![&mut color]);
        let scissor = Rect { x: 0, y: 0, width: 16, height: 16 };

        let pool = WorkerPool::with_threads(4).unwrap();
        dispatch(&rc, &fb, &scissor, Some(&pool));

        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(fb.attachment(0).get_color(x, y), 0x00FF00FF);
            }
        }
    }
}
