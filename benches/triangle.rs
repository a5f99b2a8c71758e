use criterion::{black_box, criterion_group, criterion_main, Bencher, Criterion};
use rast::{
    ElementType, Framebuffer, Image, IndexedDrawCall, InputRate, Pipeline, PixelFormat, Rasterizer,
    Shader, ShaderContext, Topology, VertexBinding, VertexBufferView, Winding,
};
use std::time::Duration;

fn vertex_stage(vertex_data: &[*const u8], _ctx: &mut ShaderContext, position: &mut [f32; 4]) {
    let xy = unsafe { &*(vertex_data[0] as *const [f32; 2]) };
    position[0] = xy[0];
    position[1] = xy[1];
    position[2] = 0.5;
    position[3] = 1.0;
}

fn fragment_stage(_ctx: &ShaderContext) -> u32 {
    0xFF8040FF
}

fn triangle_benchmark(b: &mut Bencher, &[width, height]: &[u32; 2]) {
    let pipeline = Pipeline {
        shader: Shader {
            working_data_size: 0,
            vertex_stage,
            fragment_stage,
            blended_parameters: Vec::new(),
        },
        depth: rast::DepthMode::NONE,
        winding: Winding::Ccw,
        cull_back: false,
        topology: Topology::Triangles,
        bindings: vec![VertexBinding { stride: 8, input_rate: InputRate::PerVertex }],
        blend_attachments: Vec::new(),
    };

    let vertex_data: [[f32; 2]; 3] = [[-0.8, -0.8], [0.8, -0.8], [0.0, 0.8]];
    let vertex_bytes: Vec<u8> = vertex_data.iter().flat_map(|v| v.iter().flat_map(|f| f.to_ne_bytes())).collect();
    let indices: [u16; 3] = [0, 1, 2];

    let call = IndexedDrawCall {
        pipeline: &pipeline,
        vertex_buffers: vec![VertexBufferView { data: &vertex_bytes }],
        indices: &indices,
        vertex_offset: 0,
        first_index: 0,
        index_count: 3,
        instance_count: 1,
        uniform_data: std::ptr::null(),
        scissor: None,
    };

    let mut rasterizer = Rasterizer::new(true).unwrap();
    let mut color = Image::new(width, height, PixelFormat::Color);

    b.iter(|| {
        rasterizer.clear_framebuffer(&mut Framebuffer::new(vec![&mut color]), &[&0u32.to_ne_bytes()]);
        let fb = Framebuffer::new(vec![&mut color]);
        rasterizer.render_indexed(&fb, &call);
        black_box(&mut color);
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function_over_inputs(
        "triangle",
        |b, &size| triangle_benchmark(b, size),
        &[[1, 1], [32, 32], [640, 480], [1024, 800], [2048, 1600]],
    );
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .warm_up_time(Duration::from_millis(1000));
    targets = criterion_benchmark
}

criterion_main!(benches);
