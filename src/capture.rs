//! The capture recorder: an append-only log of draw/clear events with
//! per-event attachment snapshots, taken synchronously with submission.
//!
//! Grounded directly on `original_source/src/debug/capture.{h,c}`. The
//! original's manual arena (`struct list` of `mem_alloc`'d
//! `capture_event`s, freed node-by-node in `capture_destroy`) collapses
//! here to a `Vec<CaptureEvent>` whose `Drop` impls do the freeing; the
//! original's comment "capture takes ownership of data! im too lazy to
//! write copying code" becomes literal move semantics — callers cannot
//! retain an alias to what they hand over, by construction.

use crate::image::{Image, PixelFormat};
use crate::pipeline::InputRate;
use crate::primitive::Rect;

/// One vertex buffer as it existed at the moment of a captured draw.
pub struct CapturedVertexBuffer {
    pub data: Vec<u8>,
    pub stride: usize,
    pub input_rate: InputRate,
}

/// One captured primitive (face): the resolved vertex indices, clip-space
/// positions, interpolation working data, and the scissor it rasterized
/// against.
#[derive(Default)]
pub struct CapturedPrimitive {
    pub instance_index: u32,
    pub indices: Vec<u32>,
    pub vertex_positions: Vec<f32>,
    pub working_data: Vec<u8>,
    pub scissor: Option<Rect>,
}

/// All primitives drawn for one instance.
pub struct CapturedInstance {
    pub primitives: Vec<CapturedPrimitive>,
}

/// A fully recorded `render_indexed` call.
pub struct CapturedRenderCall {
    pub vertices_per_primitive: u8,
    pub working_data_stride: usize,
    pub vertex_buffers: Vec<CapturedVertexBuffer>,
    pub instances: Vec<CapturedInstance>,
}

/// A fully recorded `framebuffer_clear` call.
pub struct CapturedFramebufferClear {
    pub clear_values: Vec<Vec<u8>>,
}

pub enum CaptureEventPayload {
    RenderCall(CapturedRenderCall),
    FramebufferClear(CapturedFramebufferClear),
}

/// One entry in a [`Capture`]'s event log.
pub struct CaptureEvent {
    pub payload: CaptureEventPayload,
    /// A byte-identical copy of every framebuffer attachment taken
    /// immediately after the event was applied.
    pub attachment_snapshots: Vec<Image>,
}

/// An append-only, ordered log of draw and clear events.
#[derive(Default)]
pub struct Capture {
    events: Vec<CaptureEvent>,
}

impl Capture {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    fn snapshot_attachments(source: &[&Image]) -> Vec<Image> {
        source
            .iter()
            .map(|attachment| {
                let mut snapshot = Image::new(attachment.width(), attachment.height(), attachment.format());
                snapshot.copy_from(attachment);
                snapshot
            })
            .collect()
    }

    pub(crate) fn record_render_call(&mut self, fb_attachments: &[&Image], data: CapturedRenderCall) {
        let attachment_snapshots = Self::snapshot_attachments(fb_attachments);
        #[cfg(feature = "logging")]
        log::trace!("capture recorded render call ({} instance(s))", data.instances.len());
        self.events.push(CaptureEvent {
            payload: CaptureEventPayload::RenderCall(data),
            attachment_snapshots,
        });
    }

    pub(crate) fn record_framebuffer_clear(&mut self, fb_attachments: &[&Image], clear_values: Vec<Vec<u8>>) {
        let attachment_snapshots = Self::snapshot_attachments(fb_attachments);
        #[cfg(feature = "logging")]
        log::trace!("capture recorded framebuffer clear");
        self.events.push(CaptureEvent {
            payload: CaptureEventPayload::FramebufferClear(CapturedFramebufferClear { clear_values }),
            attachment_snapshots,
        });
    }

    /// Borrowable view of the event log, in insertion order.
    pub fn events(&self) -> &[CaptureEvent] {
        &self.events
    }
}
