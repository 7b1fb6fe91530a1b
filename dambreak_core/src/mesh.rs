//! Deforming mesh playback.
//!
//! The topology file is loaded once. After that only vertex positions change:
//! each advance from frame 2 on replaces the vertex buffer wholesale and asks
//! the host for fresh normals. The index buffer is uploaded exactly once.
//!
//! Frames 0 and 1 both show the topology file's vertices. The producer never
//! writes `Mesh1.txt`, so frame 1 is not read (see [`FIRST_MESH_FRAME`]).
//! When playback loops back below frame 2 the kept rest pose is uploaded
//! again, so the mesh never lingers on the last vertex frame.

use crate::clock::FrameCursor;
use crate::error::PlayerError;
use crate::prefetch::FrameFeed;
use crate::source::{FrameSource, FIRST_MESH_FRAME};
use dambreak_env::{MeshId, SceneHost};
use nalgebra::Vector3;
use tracing::debug;

/// Name given to the host mesh.
pub const MESH_NAME: &str = "terrain";

/// Replays vertex frames into a single host mesh.
pub struct MeshPlayer {
    feed: FrameFeed,
    mesh: Option<MeshId>,
    vertices: Vec<Vector3<f32>>,

    /// Topology vertices, shown for frames 0 and 1
    rest_pose: Vec<Vector3<f32>>,
    indices: Vec<u32>,
    last_applied: Option<u32>,
}

impl MeshPlayer {
    /// Creates an uninitialized player reading from `source`.
    pub fn new(source: FrameSource) -> Self {
        Self {
            feed: FrameFeed::Blocking(source),
            mesh: None,
            vertices: Vec::new(),
            rest_pose: Vec::new(),
            indices: Vec::new(),
            last_applied: None,
        }
    }

    /// Reads vertex frames one ahead on a worker thread.
    pub fn enable_prefetch(&mut self) -> Result<(), PlayerError> {
        self.feed.enable_prefetch()?;
        Ok(())
    }

    /// Loads the topology file and uploads the initial mesh.
    pub fn initialize<H: SceneHost>(&mut self, host: &mut H) -> Result<(), PlayerError> {
        if self.mesh.is_some() {
            return Err(PlayerError::AlreadyInitialized);
        }

        let topology = self.feed.source().load_topology()?;
        let indices = topology.index_buffer();

        let mesh = host.create_mesh(MESH_NAME)?;
        host.set_mesh_vertices(mesh, &topology.vertices)?;
        host.set_mesh_indices(mesh, &indices)?;
        host.recompute_normals(mesh)?;

        debug!(
            "Mesh topology ready: {} vertices, {} triangles",
            topology.vertex_count(),
            topology.triangle_count()
        );

        self.mesh = Some(mesh);
        self.rest_pose = topology.vertices.clone();
        self.vertices = topology.vertices;
        self.indices = indices;
        self.last_applied = Some(0);
        Ok(())
    }

    /// Applies vertex frame `cursor.index` when `advance` is set.
    ///
    /// Frames below [`FIRST_MESH_FRAME`] are covered by the topology load:
    /// nothing is read, and the rest pose is re-uploaded only if a vertex
    /// frame is currently shown. Returns whether the host mesh changed.
    pub fn tick<H: SceneHost>(
        &mut self,
        host: &mut H,
        advance: bool,
        cursor: &FrameCursor,
    ) -> Result<bool, PlayerError> {
        if !advance {
            return Ok(false);
        }
        let mesh = self.mesh.ok_or(PlayerError::NotInitialized)?;
        if cursor.index < FIRST_MESH_FRAME {
            if self.last_applied.map_or(true, |last| last < FIRST_MESH_FRAME) {
                return Ok(false);
            }
            host.set_mesh_vertices(mesh, &self.rest_pose)?;
            host.recompute_normals(mesh)?;
            self.vertices.clone_from(&self.rest_pose);
            self.last_applied = Some(cursor.index);
            debug!("Mesh restored to rest pose for frame {}", cursor.index);
            return Ok(true);
        }

        let next = cursor.next.filter(|n| *n >= FIRST_MESH_FRAME);
        let text = self.feed.fetch(cursor.index, next)?;
        let vertices = self
            .feed
            .source()
            .decode_positions(cursor.index, &text, Some(self.vertices.len()))?;

        host.set_mesh_vertices(mesh, &vertices)?;
        host.recompute_normals(mesh)?;

        self.vertices = vertices;
        self.last_applied = Some(cursor.index);
        Ok(true)
    }

    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    /// Current vertex positions.
    pub fn vertices(&self) -> &[Vector3<f32>] {
        &self.vertices
    }

    /// Flattened triangle indices, fixed after initialization.
    pub fn index_buffer(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_initialized(&self) -> bool {
        self.mesh.is_some()
    }

    /// Index of the last frame uploaded (0 after the topology load).
    pub fn last_applied(&self) -> Option<u32> {
        self.last_applied
    }

    pub fn source(&self) -> &FrameSource {
        self.feed.source()
    }
}
