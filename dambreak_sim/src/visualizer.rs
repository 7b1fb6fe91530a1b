//! Rerun visualization for replay runs.
//!
//! `RerunScene` is a `SceneHost` that keeps the scene in a `HeadlessScene`
//! and, on every `flush`, streams its current contents to a Rerun viewer.
//! Visualization is optional and only available with the `visualization`
//! feature; without it the scene behaves exactly like `HeadlessScene`.
//!
//! # What Gets Logged
//!
//! - Particle entities as blue points under `world/particles`
//! - Each mesh as a `Mesh3D` under `world/mesh/<name>`
//! - Host time on the `sim_time` timeline

use dambreak_env::{EntityId, EnvError, HeadlessScene, MeshId, SceneHost};
use nalgebra::Vector3;
#[cfg(feature = "visualization")]
use rerun::{Color, Mesh3D, Points3D, Radius, RecordingStream};

/// Scene host that mirrors its state into Rerun.
pub struct RerunScene {
    scene: HeadlessScene,

    #[cfg(feature = "visualization")]
    rec: Option<RecordingStream>,

    /// Whether visualization is enabled
    enabled: bool,
}

impl RerunScene {
    /// Creates a scene with visualization disabled.
    pub fn disabled() -> Self {
        Self {
            scene: HeadlessScene::new(),
            #[cfg(feature = "visualization")]
            rec: None,
            enabled: false,
        }
    }

    /// Creates a scene streaming to a spawned Rerun viewer.
    #[cfg(feature = "visualization")]
    pub fn new(name: &str) -> Self {
        match rerun::RecordingStreamBuilder::new(name).spawn() {
            Ok(rec) => {
                tracing::info!("Rerun visualization enabled - open Rerun Viewer to watch playback");
                Self {
                    scene: HeadlessScene::new(),
                    rec: Some(rec),
                    enabled: true,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to initialize Rerun: {:?}", e);
                Self::disabled()
            }
        }
    }

    /// Creates a scene - returns disabled if visualization feature not enabled.
    #[cfg(not(feature = "visualization"))]
    pub fn new(_name: &str) -> Self {
        tracing::info!("Rerun visualization not available (compile with --features visualization)");
        Self::disabled()
    }

    /// Returns whether visualization is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The in-memory scene backing this host.
    pub fn inner(&self) -> &HeadlessScene {
        &self.scene
    }

    /// Logs the current scene at `time_secs`.
    #[cfg(feature = "visualization")]
    pub fn flush(&self, time_secs: f64) {
        let Some(ref rec) = self.rec else {
            return;
        };
        rec.set_time_seconds("sim_time", time_secs);

        let points: Vec<[f32; 3]> = self.scene.positions().iter().map(to_array).collect();
        let _ = rec.log(
            "world/particles",
            &Points3D::new(points)
                .with_colors([Color::from_rgb(60, 140, 255)])
                .with_radii([Radius::new_scene_units(0.05)]),
        );

        for i in 0..self.scene.mesh_count() {
            let Some(mesh) = self.scene.mesh(MeshId(i as u32)) else {
                continue;
            };
            let triangles: Vec<[u32; 3]> = mesh.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();
            let mut archetype = Mesh3D::new(mesh.vertices.iter().map(to_array).collect::<Vec<_>>())
                .with_triangle_indices(triangles);
            if mesh.normals.len() == mesh.vertices.len() {
                archetype = archetype.with_vertex_normals(mesh.normals.iter().map(to_array).collect::<Vec<_>>());
            }
            let _ = rec.log(format!("world/mesh/{}", mesh.name), &archetype);
        }
    }

    #[cfg(not(feature = "visualization"))]
    pub fn flush(&self, _time_secs: f64) {}
}

#[cfg(feature = "visualization")]
fn to_array(v: &Vector3<f32>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

impl SceneHost for RerunScene {
    fn create_entity(&mut self, name: &str) -> Result<EntityId, EnvError> {
        self.scene.create_entity(name)
    }

    fn set_entity_position(&mut self, entity: EntityId, position: Vector3<f32>) -> Result<(), EnvError> {
        self.scene.set_entity_position(entity, position)
    }

    fn create_mesh(&mut self, name: &str) -> Result<MeshId, EnvError> {
        self.scene.create_mesh(name)
    }

    fn set_mesh_vertices(&mut self, mesh: MeshId, vertices: &[Vector3<f32>]) -> Result<(), EnvError> {
        self.scene.set_mesh_vertices(mesh, vertices)
    }

    fn set_mesh_indices(&mut self, mesh: MeshId, indices: &[u32]) -> Result<(), EnvError> {
        self.scene.set_mesh_indices(mesh, indices)
    }

    fn recompute_normals(&mut self, mesh: MeshId) -> Result<(), EnvError> {
        self.scene.recompute_normals(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_scene_forwards_to_headless() {
        let mut scene = RerunScene::disabled();
        assert!(!scene.is_enabled());

        let id = scene.create_entity("0").unwrap();
        scene.set_entity_position(id, Vector3::new(1.0, 2.0, 3.0)).unwrap();
        scene.flush(0.0);

        assert_eq!(scene.inner().position(id), Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(scene.inner().position_writes(), 1);
    }
}
