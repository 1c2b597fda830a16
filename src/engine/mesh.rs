// Textured cube mesh shared by every voxel in the scene.
//
// One unit cube lives in the vertex/index buffers; instances scale, rotate and
// place it. Each face has its own four vertices so normals stay flat and every
// face gets a full 0..1 UV square.

use glam::{Vec2, Vec3};

/// Face ids, in the order the block textures are assigned.
pub const FACE_FRONT: u32 = 0;
pub const FACE_BACK: u32 = 1;
pub const FACE_BOTTOM: u32 = 2;
pub const FACE_TOP: u32 = 3;
pub const FACE_RIGHT: u32 = 4;
pub const FACE_LEFT: u32 = 5;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex:
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
///   @location(2) uv:       vec2<f32>
///   @location(3) face:     u32
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
    pub uv:       [f32; 2],
    pub face:     u32,
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2, 3 => Uint32];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// Upload vertex_bytes() to a VERTEX buffer, index_bytes() to an INDEX buffer (Uint32).
pub struct RenderMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices:  Vec<u32>,
}

impl RenderMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize  { self.indices.len() }
}

// ============================================================================
// UNIT CUBE
// ============================================================================

/// (face id, outward normal, u axis, v axis) with u × v = normal, so
/// corners walked -u-v → +u-v → +u+v → -u+v are CCW seen from outside.
const FACES: [(u32, Vec3, Vec3, Vec3); 6] = [
    (FACE_FRONT,  Vec3::Z,     Vec3::X,     Vec3::Y),
    (FACE_BACK,   Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (FACE_BOTTOM, Vec3::NEG_Y, Vec3::X,     Vec3::Z),
    (FACE_TOP,    Vec3::Y,     Vec3::X,     Vec3::NEG_Z),
    (FACE_RIGHT,  Vec3::X,     Vec3::NEG_Z, Vec3::Y),
    (FACE_LEFT,   Vec3::NEG_X, Vec3::Z,     Vec3::Y),
];

/// Unit cube centred on the origin (half-extent 0.5): 24 vertices, 36 indices.
pub fn unit_cube() -> RenderMesh {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    // Texture origin is top-left, so v grows downward on screen.
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    for (face, normal, u, v) in FACES {
        let base = vertices.len() as u32;
        for (s, t) in corners {
            let position = normal * 0.5 + u * (0.5 * s) + v * (0.5 * t);
            let uv = Vec2::new((s + 1.0) * 0.5, (1.0 - t) * 0.5);
            vertices.push(GpuVertex {
                position: position.to_array(),
                normal:   normal.to_array(),
                uv:       uv.to_array(),
                face,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    RenderMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(v: &GpuVertex) -> Vec3 { Vec3::from_array(v.position) }

    #[test]
    fn cube_has_flat_faces() {
        let mesh = unit_cube();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.vertex_bytes().len(), 24 * 36);
        assert_eq!(mesh.index_bytes().len(), 36 * 4);

        for face in 0..6u32 {
            let verts: Vec<_> = mesh.vertices.iter().filter(|v| v.face == face).collect();
            assert_eq!(verts.len(), 4);
            let n = Vec3::from_array(verts[0].normal);
            for v in &verts {
                assert_eq!(Vec3::from_array(v.normal), n);
                // Every corner of the face lies on its plane.
                assert!((pos(v).dot(n) - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn triangles_wind_ccw_from_outside() {
        let mesh = unit_cube();
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| &mesh.vertices[i as usize]);
            let winding = (pos(b) - pos(a)).cross(pos(c) - pos(a));
            assert!(winding.dot(Vec3::from_array(a.normal)) > 0.0);
        }
    }

    #[test]
    fn top_face_points_up() {
        let mesh = unit_cube();
        let top: Vec<_> = mesh.vertices.iter().filter(|v| v.face == FACE_TOP).collect();
        assert!(top.iter().all(|v| v.normal == [0.0, 1.0, 0.0] && v.position[1] == 0.5));
    }

    #[test]
    fn every_face_covers_the_full_uv_square() {
        let mesh = unit_cube();
        for face in 0..6u32 {
            let mut uvs: Vec<[f32; 2]> = mesh.vertices.iter()
                .filter(|v| v.face == face)
                .map(|v| v.uv)
                .collect();
            uvs.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(uvs, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]);
        }
    }
}
