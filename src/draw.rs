//! The public entry point: `Rasterizer`, draw-call description, and the
//! `render_indexed`/`clear_framebuffer` orchestration.
//!
//! Grounded on `original_source/src/graphics/rasterizer.c`'s
//! `rasterizer_create`, `render_indexed`, and `framebuffer_clear`.

use crate::capture::{Capture, CapturedInstance, CapturedPrimitive, CapturedRenderCall, CapturedVertexBuffer};
use crate::image::Framebuffer;
use crate::pipeline::Pipeline;
use crate::pixel::RenderContext;
use crate::primitive::{derive_scissor, process_face_vertices, Rect, VertexBufferView, VertexOutput};
use crate::scheduler::dispatch;
use crate::worker::{WorkerPool, WorkerPoolError};

/// One indexed draw call: the pipeline to run, the bound vertex/index
/// buffers, instancing parameters, and the optional user scissor.
pub struct IndexedDrawCall<'a> {
    pub pipeline: &'a Pipeline,
    pub vertex_buffers: Vec<VertexBufferView<'a>>,
    pub indices: &'a [u16],
    pub vertex_offset: u32,
    pub first_index: u32,
    pub index_count: u32,
    pub instance_count: u32,
    pub uniform_data: *const (),
    pub scissor: Option<Rect>,
}

/// Owns the worker pool (when multithreading is enabled) and, optionally,
/// a capture recorder.
pub struct Rasterizer {
    pool: Option<WorkerPool>,
    capture: Option<Capture>,
}

impl Rasterizer {
    /// Construct a rasterizer. `multithread` selects between a
    /// `num_cpus::get()`-sized worker pool and synchronous, single-threaded
    /// dispatch (spec.md §4.1's configuration surface).
    pub fn new(multithread: bool) -> Result<Self, WorkerPoolError> {
        let pool = if multithread { Some(WorkerPool::new()?) } else { None };
        #[cfg(feature = "logging")]
        log::info!("rasterizer created (multithread={})", multithread);
        Ok(Self { pool, capture: None })
    }

    /// Enable or disable draw capture. Passing `None` disables it and
    /// discards any previously recorded events.
    pub fn set_capture(&mut self, enabled: bool) {
        self.capture = if enabled { Some(Capture::new()) } else { None };
    }

    /// Borrow the capture log, if capture is enabled.
    pub fn capture(&self) -> Option<&Capture> {
        self.capture.as_ref()
    }

    /// Fill every pixel of every bound attachment with `clear_values[i]`
    /// (one `pixel_stride()`-sized value per attachment, in attachment
    /// order).
    pub fn clear_framebuffer(&mut self, framebuffer: &mut Framebuffer, clear_values: &[&[u8]]) {
        debug_assert_eq!(clear_values.len(), framebuffer.attachment_count());

        for (i, value) in clear_values.iter().enumerate() {
            framebuffer.attachment_mut(i).fill_bytes(value);
        }

        if let Some(capture) = self.capture.as_mut() {
            let owned_values: Vec<Vec<u8>> = clear_values.iter().map(|v| v.to_vec()).collect();
            let refs: Vec<&crate::image::Image> = (0..framebuffer.attachment_count())
                .map(|i| framebuffer.attachment(i))
                .collect();
            capture.record_framebuffer_clear(&refs, owned_values);
        }

        #[cfg(feature = "logging")]
        log::trace!("cleared {} attachment(s)", framebuffer.attachment_count());
    }

    /// Execute one indexed draw call against `framebuffer`.
    pub fn render_indexed(&mut self, framebuffer: &Framebuffer, call: &IndexedDrawCall) {
        let pipeline = call.pipeline;
        let vertices_per_face = pipeline.topology.vertices_per_face();
        let working_data_size = pipeline.shader.working_data_size;
        let face_count = call.index_count / vertices_per_face as u32;

        // One contiguous working-data slab allocated once per draw
        // (spec.md §4.7 step 1), sliced per vertex slot and reused,
        // overwritten, across every face.
        let mut working_slab = vec![0u8; working_data_size * vertices_per_face as usize];
        let mut outputs = vec![VertexOutput { position: [0.0; 4] }; vertices_per_face as usize];

        let mut captured_instances: Vec<CapturedInstance> = Vec::new();

        for instance_id in 0..call.instance_count {
            let mut captured_primitives: Vec<CapturedPrimitive> = Vec::new();

            for face_id in 0..face_count {
                let mut captured_primitive = self.capture.as_ref().map(|_| CapturedPrimitive::default());

                process_face_vertices(
                    pipeline,
                    &call.vertex_buffers,
                    call.indices,
                    call.vertex_offset,
                    call.first_index,
                    instance_id,
                    face_id,
                    vertices_per_face,
                    call.uniform_data,
                    &mut working_slab,
                    &mut outputs,
                    captured_primitive.as_mut(),
                );

                let positions: Vec<[f32; 4]> = outputs.iter().map(|o| o.position).collect();
                let scissor = derive_scissor(&positions, framebuffer.width(), framebuffer.height(), call.scissor);

                if let Some(captured) = captured_primitive.as_mut() {
                    captured.scissor = scissor;
                }

                if let Some(scissor) = scissor {
                    let rc = RenderContext {
                        pipeline,
                        instance_id,
                        uniform_data: call.uniform_data,
                        outputs: &outputs,
                        working_slab: &working_slab,
                    };
                    dispatch(&rc, framebuffer, &scissor, self.pool.as_ref());
                }

                if let Some(captured) = captured_primitive {
                    captured_primitives.push(captured);
                }
            }

            if self.capture.is_some() {
                captured_instances.push(CapturedInstance { primitives: captured_primitives });
            }
        }

        if let Some(capture) = self.capture.as_mut() {
            let refs: Vec<&crate::image::Image> = (0..framebuffer.attachment_count())
                .map(|i| framebuffer.attachment(i))
                .collect();
            let vertex_buffers = call
                .vertex_buffers
                .iter()
                .zip(pipeline.bindings.iter())
                .map(|(buffer, binding)| CapturedVertexBuffer {
                    data: buffer.data.to_vec(),
                    stride: binding.stride,
                    input_rate: binding.input_rate,
                })
                .collect();
            capture.record_render_call(
                &refs,
                CapturedRenderCall {
                    vertices_per_primitive: vertices_per_face,
                    working_data_stride: working_data_size,
                    vertex_buffers,
                    instances: captured_instances,
                },
            );
        }

        #[cfg(feature = "logging")]
        log::trace!(
            "render_indexed: {} instance(s) x {} face(s)",
            call.instance_count,
            face_count
        );
    }
}
