//! Minimal end-to-end demo: one CCW triangle, a per-vertex color
//! attribute, perspective-correct interpolation, no depth/blend state.
//!
//! Run with `cargo run --example triangle`, or
//! `cargo run --example triangle --features png-export` to dump the
//! result to `triangle.png`.

use rast::{
    ElementType, Framebuffer, Image, IndexedDrawCall, InputRate, Pipeline, PixelFormat, Rasterizer,
    Shader, ShaderContext, Topology, VertexBinding, VertexBufferView, Winding,
};

#[repr(C)]
struct Vertex {
    position: [f32; 2],
    color: [f32; 3],
}

fn vertex_stage(vertex_data: &[*const u8], ctx: &mut ShaderContext, position: &mut [f32; 4]) {
    let vertex = unsafe { &*(vertex_data[0] as *const Vertex) };
    position[0] = vertex.position[0];
    position[1] = vertex.position[1];
    position[2] = 0.5;
    position[3] = 1.0;
    ctx.working_data[0..12].copy_from_slice(as_bytes(&vertex.color));
}

fn as_bytes(floats: &[f32; 3]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(floats.as_ptr() as *const u8, 12) }
}

fn fragment_stage(ctx: &ShaderContext) -> u32 {
    let r = f32::from_ne_bytes(ctx.working_data[0..4].try_into().unwrap());
    let g = f32::from_ne_bytes(ctx.working_data[4..8].try_into().unwrap());
    let b = f32::from_ne_bytes(ctx.working_data[8..12].try_into().unwrap());
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u32;
    (byte(r) << 24) | (byte(g) << 16) | (byte(b) << 8) | 0xFF
}

fn main() {
    const W: u32 = 640;
    const H: u32 = 480;

    let pipeline = Pipeline {
        shader: Shader {
            working_data_size: 12,
            vertex_stage,
            fragment_stage,
            blended_parameters: vec![rast::BlendedParameter {
                offset: 0,
                element_type: ElementType::Float,
                count: 3,
            }],
        },
        depth: rast::DepthMode::NONE,
        winding: Winding::Ccw,
        cull_back: false,
        topology: Topology::Triangles,
        bindings: vec![VertexBinding { stride: std::mem::size_of::<Vertex>(), input_rate: InputRate::PerVertex }],
        blend_attachments: Vec::new(),
    };

    let vertices = [
        Vertex { position: [-0.8, -0.8], color: [1.0, 0.0, 0.0] },
        Vertex { position: [0.8, -0.8], color: [0.0, 1.0, 0.0] },
        Vertex { position: [0.0, 0.8], color: [0.0, 0.0, 1.0] },
    ];
    let vertex_bytes = unsafe {
        std::slice::from_raw_parts(vertices.as_ptr() as *const u8, vertices.len() * std::mem::size_of::<Vertex>())
    };
    let indices: [u16; 3] = [0, 1, 2];

    let call = IndexedDrawCall {
        pipeline: &pipeline,
        vertex_buffers: vec![VertexBufferView { data: vertex_bytes }],
        indices: &indices,
        vertex_offset: 0,
        first_index: 0,
        index_count: 3,
        instance_count: 1,
        uniform_data: std::ptr::null(),
        scissor: None,
    };

    let mut rasterizer = Rasterizer::new(true).expect("failed to start worker pool");
    let mut color = Image::new(W, H, PixelFormat::Color);
    rasterizer.clear_framebuffer(&mut Framebuffer::new(vec![&mut color]), &[&0x101010FFu32.to_ne_bytes()]);

    let fb = Framebuffer::new(vec![&mut color]);
    rasterizer.render_indexed(&fb, &call);

    #[cfg(feature = "png-export")]
    {
        let mut buf = image_::RgbaImage::new(W, H);
        for y in 0..H {
            for x in 0..W {
                let packed = color.get_color(x, y);
                let bytes = packed.to_be_bytes();
                buf.put_pixel(x, y, image_::Rgba(bytes));
            }
        }
        buf.save("triangle.png").expect("failed to write triangle.png");
        println!("wrote triangle.png");
    }

    #[cfg(not(feature = "png-export"))]
    println!("rendered {}x{} triangle (rebuild with --features png-export to save it)", W, H);
}
