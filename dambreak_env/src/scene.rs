//! Render host trait consumed by the playback engine.

use crate::error::EnvError;
use crate::types::{EntityId, MeshId};
use nalgebra::Vector3;

/// Abstraction over the scene graph that replayed frames are written into.
///
/// The playback engine is a pure producer: nothing in this trait reads scene
/// state back. All calls happen on the thread that owns the scene, inside the
/// host's per-tick callback.
///
/// # Call Order
///
/// ```text
/// startup:   create_entity x N, create_mesh, set_mesh_vertices, set_mesh_indices, recompute_normals
/// per frame: set_entity_position x N, set_mesh_vertices, recompute_normals
/// ```
pub trait SceneHost {
    /// Creates a new point entity and returns its handle.
    ///
    /// `name` is a display label only (the particle's pool index).
    fn create_entity(&mut self, name: &str) -> Result<EntityId, EnvError>;

    /// Moves an entity to a new world-space position.
    fn set_entity_position(&mut self, entity: EntityId, position: Vector3<f32>) -> Result<(), EnvError>;

    /// Creates an empty mesh with 32-bit indices.
    fn create_mesh(&mut self, name: &str) -> Result<MeshId, EnvError>;

    /// Replaces the mesh's vertex positions wholesale.
    fn set_mesh_vertices(&mut self, mesh: MeshId, vertices: &[Vector3<f32>]) -> Result<(), EnvError>;

    /// Replaces the mesh's triangle index buffer (3 indices per triangle).
    fn set_mesh_indices(&mut self, mesh: MeshId, indices: &[u32]) -> Result<(), EnvError>;

    /// Recomputes shading normals from the current vertices and indices.
    fn recompute_normals(&mut self, mesh: MeshId) -> Result<(), EnvError>;
}
