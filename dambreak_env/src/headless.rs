//! In-memory scene host.
//!
//! `HeadlessScene` is the "real" host used when there is no renderer: the
//! replay harness, exporters and every test in the workspace run against it.
//! It stores exactly what a renderer would receive and counts the calls so
//! callers can assert on upload traffic.

use crate::error::EnvError;
use crate::scene::SceneHost;
use crate::types::{EntityId, MeshId};
use nalgebra::Vector3;

/// A point entity as stored by the headless host.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessEntity {
    /// Display label
    pub name: String,

    /// Current world-space position
    pub position: Vector3<f32>,
}

/// A mesh as stored by the headless host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessMesh {
    /// Display label
    pub name: String,

    /// Vertex positions
    pub vertices: Vec<Vector3<f32>>,

    /// Flattened triangle indices
    pub indices: Vec<u32>,

    /// Per-vertex unit normals (empty until first recompute)
    pub normals: Vec<Vector3<f32>>,
}

/// Scene host that keeps all state in memory.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    entities: Vec<HeadlessEntity>,
    meshes: Vec<HeadlessMesh>,

    /// Number of `set_entity_position` calls
    position_writes: u64,

    /// Number of `set_mesh_vertices` calls
    vertex_uploads: u64,

    /// Number of `recompute_normals` calls
    normal_recomputes: u64,
}

impl HeadlessScene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entities created so far.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns an entity by handle.
    pub fn entity(&self, id: EntityId) -> Option<&HeadlessEntity> {
        self.entities.get(id.0 as usize)
    }

    /// Returns the position of an entity.
    pub fn position(&self, id: EntityId) -> Option<Vector3<f32>> {
        self.entity(id).map(|e| e.position)
    }

    /// Returns all entity positions in creation order.
    pub fn positions(&self) -> Vec<Vector3<f32>> {
        self.entities.iter().map(|e| e.position).collect()
    }

    /// Returns a mesh by handle.
    pub fn mesh(&self, id: MeshId) -> Option<&HeadlessMesh> {
        self.meshes.get(id.0 as usize)
    }

    /// Returns the number of meshes created so far.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn position_writes(&self) -> u64 {
        self.position_writes
    }

    pub fn vertex_uploads(&self) -> u64 {
        self.vertex_uploads
    }

    pub fn normal_recomputes(&self) -> u64 {
        self.normal_recomputes
    }

    fn mesh_mut(&mut self, id: MeshId) -> Result<&mut HeadlessMesh, EnvError> {
        self.meshes
            .get_mut(id.0 as usize)
            .ok_or_else(|| EnvError::unknown_mesh(id))
    }
}

impl SceneHost for HeadlessScene {
    fn create_entity(&mut self, name: &str) -> Result<EntityId, EnvError> {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(HeadlessEntity {
            name: name.to_string(),
            position: Vector3::zeros(),
        });
        Ok(id)
    }

    fn set_entity_position(&mut self, entity: EntityId, position: Vector3<f32>) -> Result<(), EnvError> {
        let slot = self
            .entities
            .get_mut(entity.0 as usize)
            .ok_or_else(|| EnvError::unknown_entity(entity))?;
        slot.position = position;
        self.position_writes += 1;
        Ok(())
    }

    fn create_mesh(&mut self, name: &str) -> Result<MeshId, EnvError> {
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(HeadlessMesh {
            name: name.to_string(),
            ..Default::default()
        });
        Ok(id)
    }

    fn set_mesh_vertices(&mut self, mesh: MeshId, vertices: &[Vector3<f32>]) -> Result<(), EnvError> {
        let slot = self.mesh_mut(mesh)?;
        slot.vertices.clear();
        slot.vertices.extend_from_slice(vertices);
        self.vertex_uploads += 1;
        Ok(())
    }

    fn set_mesh_indices(&mut self, mesh: MeshId, indices: &[u32]) -> Result<(), EnvError> {
        if indices.len() % 3 != 0 {
            return Err(EnvError::RaggedIndexBuffer(indices.len()));
        }
        let slot = self.mesh_mut(mesh)?;
        slot.indices.clear();
        slot.indices.extend_from_slice(indices);
        Ok(())
    }

    fn recompute_normals(&mut self, mesh: MeshId) -> Result<(), EnvError> {
        let slot = self.mesh_mut(mesh)?;
        slot.normals = compute_smooth_normals(&slot.vertices, &slot.indices);
        self.normal_recomputes += 1;
        Ok(())
    }
}

/// Computes area-weighted smooth vertex normals for a triangle list.
///
/// Each face normal (unnormalized cross product, so larger faces weigh more)
/// is added to its three corners, then every sum is normalized. Degenerate
/// faces and triangles referencing missing vertices are skipped. Vertices
/// touched by no valid face get a zero normal.
pub fn compute_smooth_normals(vertices: &[Vector3<f32>], indices: &[u32]) -> Vec<Vector3<f32>> {
    let mut normals = vec![Vector3::<f32>::zeros(); vertices.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }

        let e1 = vertices[i1] - vertices[i0];
        let e2 = vertices[i2] - vertices[i0];
        let n = e1.cross(&e2);
        if n.norm_squared() <= 1.0e-20 {
            continue;
        }

        normals[i0] += n;
        normals[i1] += n;
        normals[i2] += n;
    }

    for n in normals.iter_mut() {
        *n = n.try_normalize(1.0e-12).unwrap_or_else(Vector3::zeros);
    }
    normals
}
