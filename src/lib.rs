//! A parallel CPU software rasterizer: indexed triangle/quad draw calls
//! over a programmable vertex/fragment shader contract, with perspective-
//! correct attribute interpolation, depth testing, alpha blending, and an
//! optional draw-capture/replay log.
//!
//! See `SPEC_FULL.md` for the full data model and external API contract.

pub mod blend;
pub mod capture;
pub mod draw;
pub mod image;
pub mod math;
pub mod pipeline;
pub mod pixel;
pub mod primitive;
pub mod scheduler;
pub mod semaphore;
pub mod worker;

pub use crate::blend::{BlendAttachment, BlendFactor, BlendOp, ComponentBlendOp};
pub use crate::capture::{Capture, CaptureEvent, CaptureEventPayload};
pub use crate::draw::{IndexedDrawCall, Rasterizer};
pub use crate::image::{Framebuffer, Image, PixelFormat};
pub use crate::pipeline::{
    BlendedParameter, DepthMode, ElementType, InputRate, Pipeline, Shader, ShaderContext, Topology,
    VertexBinding, Winding,
};
pub use crate::primitive::{Rect, VertexBufferView};
pub use crate::worker::WorkerPoolError;
