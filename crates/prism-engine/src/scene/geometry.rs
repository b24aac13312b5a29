use bytemuck::{Pod, Zeroable};

/// Vertex layout used by the scene pipeline: position only.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle list, counter-clockwise front faces.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Geometry {
    /// Axis-aligned box centered on the origin. Each face has its own four
    /// vertices so per-face attributes can be added later.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);

        // (normal axis, four corners in CCW order seen from outside)
        let faces: [[[f32; 3]; 4]; 6] = [
            [[x, -y, z], [x, -y, -z], [x, y, -z], [x, y, z]],     // +X
            [[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]], // -X
            [[-x, y, z], [x, y, z], [x, y, -z], [-x, y, -z]],     // +Y
            [[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]], // -Y
            [[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]],     // +Z
            [[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]], // -Z
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for corners in faces {
            let base = vertices.len() as u16;
            vertices.extend(corners.map(|position| Vertex { position }));
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices }
    }
}
