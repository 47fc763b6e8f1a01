//! Mesh and bone data as handed over by the scene importer

use glam::{Mat4, Vec2, Vec3};

/// Influence of one bone on one vertex, stored on the bone
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct VertexWeight {
    /// Index of the influenced vertex in the mesh
    pub vertex: u32,
    /// Blend weight (not required to sum to 1 across bones)
    pub weight: f32,
}

/// Influence of one bone on one vertex, seen from the vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneInfluence {
    /// Index into [`Mesh::bones`]
    pub bone: usize,
    /// Blend weight
    pub weight: f32,
}

/// A bone binding a mesh to a scene node
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Bone {
    /// Name of the node carrying this bone's current transform
    pub name: String,
    /// Inverse bind pose: mesh space to bone space
    pub offset: Mat4,
    /// Vertices moved by this bone
    pub weights: Vec<VertexWeight>,
}

impl Bone {
    /// Create a bone without any vertex weights
    pub fn new(name: impl Into<String>, offset: Mat4) -> Self {
        Self {
            name: name.into(),
            offset,
            weights: Vec::new(),
        }
    }

    /// Builder-style helper to add a vertex weight
    pub fn with_weight(mut self, vertex: u32, weight: f32) -> Self {
        self.weights.push(VertexWeight { vertex, weight });
        self
    }
}

/// Triangle mesh with optional bone influences
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Mesh {
    /// Mesh name
    pub name: String,
    /// Bind pose vertex positions
    pub positions: Vec<Vec3>,
    /// Bind pose vertex normals
    pub normals: Vec<Vec3>,
    /// Texture coordinates (may be empty)
    pub tex_coords: Vec<Vec2>,
    /// Triangle list indices
    pub indices: Vec<u32>,
    /// Bones deforming this mesh (empty for rigid meshes)
    pub bones: Vec<Bone>,
}

impl Mesh {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh is deformed by bones
    pub fn is_skinned(&self) -> bool {
        !self.bones.is_empty()
    }

    /// Regroup the per-bone weight lists into per-vertex influence lists
    ///
    /// Weights pointing past the last vertex are dropped here; see
    /// [`crate::model::AnimatedModel::validate`] for reporting them.
    pub fn vertex_influences(&self) -> Vec<Vec<BoneInfluence>> {
        let mut influences = vec![Vec::new(); self.vertex_count()];
        for (bone_index, bone) in self.bones.iter().enumerate() {
            for w in &bone.weights {
                if let Some(list) = influences.get_mut(w.vertex as usize) {
                    list.push(BoneInfluence {
                        bone: bone_index,
                        weight: w.weight,
                    });
                }
            }
        }
        influences
    }
}

/// Placement of one mesh inside shared vertex and index buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshEntry {
    /// First vertex of the mesh in the shared vertex buffer
    pub base_vertex: usize,
    /// First index of the mesh in the shared index buffer
    pub base_index: usize,
    /// Number of vertices
    pub vertex_count: usize,
    /// Number of indices
    pub index_count: usize,
}

/// Packing of several meshes into one vertex and one index buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshLayout {
    entries: Vec<MeshEntry>,
    total_vertices: usize,
    total_indices: usize,
}

impl MeshLayout {
    /// Lay the meshes out back to back in declaration order
    pub fn new(meshes: &[Mesh]) -> Self {
        let mut entries = Vec::with_capacity(meshes.len());
        let mut total_vertices = 0;
        let mut total_indices = 0;

        for mesh in meshes {
            entries.push(MeshEntry {
                base_vertex: total_vertices,
                base_index: total_indices,
                vertex_count: mesh.vertex_count(),
                index_count: mesh.indices.len(),
            });
            total_vertices += mesh.vertex_count();
            total_indices += mesh.indices.len();
        }

        Self {
            entries,
            total_vertices,
            total_indices,
        }
    }

    /// Entry for a mesh
    pub fn entry(&self, mesh: usize) -> Option<&MeshEntry> {
        self.entries.get(mesh)
    }

    /// All entries in mesh order
    pub fn entries(&self) -> &[MeshEntry] {
        &self.entries
    }

    /// Vertex count of the shared vertex buffer
    pub fn total_vertices(&self) -> usize {
        self.total_vertices
    }

    /// Index count of the shared index buffer
    pub fn total_indices(&self) -> usize {
        self.total_indices
    }

    /// Concatenate the bind pose positions and normals of all meshes
    pub fn pack_vertices(&self, meshes: &[Mesh]) -> (Vec<Vec3>, Vec<Vec3>) {
        let mut positions = Vec::with_capacity(self.total_vertices);
        let mut normals = Vec::with_capacity(self.total_vertices);
        for mesh in meshes {
            positions.extend_from_slice(&mesh.positions);
            normals.extend_from_slice(&mesh.normals);
        }
        (positions, normals)
    }

    /// Concatenate the index lists of all meshes
    ///
    /// Indices stay relative to each mesh; draw calls add `base_vertex`.
    pub fn pack_indices(&self, meshes: &[Mesh]) -> Vec<u32> {
        let mut indices = Vec::with_capacity(self.total_indices);
        for mesh in meshes {
            indices.extend_from_slice(&mesh.indices);
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(name: &str) -> Mesh {
        Mesh {
            name: name.to_string(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE],
            normals: vec![Vec3::Z; 4],
            tex_coords: Vec::new(),
            indices: vec![0, 1, 2, 1, 3, 2],
            bones: Vec::new(),
        }
    }

    #[test]
    fn test_vertex_influences_group_by_vertex() {
        let mut mesh = quad("quad");
        mesh.bones = vec![
            Bone::new("a", Mat4::IDENTITY)
                .with_weight(0, 1.0)
                .with_weight(1, 0.25),
            Bone::new("b", Mat4::IDENTITY).with_weight(1, 0.75),
        ];

        let influences = mesh.vertex_influences();
        assert_eq!(influences.len(), 4);
        assert_eq!(
            influences[1],
            vec![
                BoneInfluence {
                    bone: 0,
                    weight: 0.25
                },
                BoneInfluence {
                    bone: 1,
                    weight: 0.75
                },
            ]
        );
        assert!(influences[2].is_empty());
        assert!(mesh.is_skinned());
    }

    #[test]
    fn test_layout_offsets() {
        let meshes = vec![quad("a"), quad("b"), quad("c")];
        let layout = MeshLayout::new(&meshes);

        assert_eq!(layout.total_vertices(), 12);
        assert_eq!(layout.total_indices(), 18);
        let entry = layout.entry(2).unwrap();
        assert_eq!(entry.base_vertex, 8);
        assert_eq!(entry.base_index, 12);
        assert_eq!(entry.index_count, 6);

        let (positions, normals) = layout.pack_vertices(&meshes);
        assert_eq!(positions.len(), 12);
        assert_eq!(normals.len(), 12);
        assert_eq!(layout.pack_indices(&meshes).len(), 18);
    }
}
