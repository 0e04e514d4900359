use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

const fn vertex(x: f32, y: f32) -> QuadVertex {
    QuadVertex {
        position: [x, y],
        uv: [x, y],
    }
}

/// Two triangles covering the unit square.
pub(crate) const QUAD_VERTICES: [QuadVertex; 6] = [
    vertex(0.0, 0.0),
    vertex(1.0, 0.0),
    vertex(0.0, 1.0),
    vertex(0.0, 1.0),
    vertex(1.0, 0.0),
    vertex(1.0, 1.0),
];

const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

/// The full-screen quad every pass is drawn with.
#[derive(Debug)]
pub(crate) struct Quad {
    buffer: wgpu::Buffer,
}

impl Quad {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("wgpu-mipmapper-quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { buffer }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }

    /// Draws both triangles. No index buffer is used.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.buffer.slice(..));
        pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}
