//! JSON exporter for replay runs.
//!
//! Records what the scene looked like after every frame advance so a run can
//! be diffed against another seed or plotted offline.

use dambreak_core::{PlaybackController, TickReport};
use dambreak_env::HeadlessScene;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single recorded advance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Frame index that was applied
    pub index: u32,

    /// Simulated time of the frame (index * tick interval)
    pub time_sec: f64,

    /// Host wall-clock time when it was applied
    pub host_time_sec: f64,

    /// Particle positions in pool order
    pub particles: Vec<ParticlePosition>,

    /// Mesh vertices, when the mesh player is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh_vertices: Option<Vec<[f32; 3]>>,

    /// Players that applied this frame
    pub applied: Vec<String>,
}

/// Position of one pooled particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticlePosition {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ParticlePosition {
    pub fn new(id: u32, pos: Vector3<f32>) -> Self {
        Self {
            id,
            x: pos.x,
            y: pos.y,
            z: pos.z,
        }
    }
}

impl ReplayFrame {
    /// Captures the scene after an advance.
    pub fn capture(
        scene: &HeadlessScene,
        controller: &PlaybackController,
        report: &TickReport,
        host_time_sec: f64,
    ) -> Option<Self> {
        let index = report.frame?;
        let interval = controller.clock().interval().as_secs_f64();

        let particles = controller
            .particles()
            .map(|p| {
                p.pool()
                    .iter()
                    .filter_map(|id| scene.position(*id).map(|pos| ParticlePosition::new(id.raw(), pos)))
                    .collect()
            })
            .unwrap_or_default();

        let mesh_vertices = controller
            .mesh()
            .map(|m| m.vertices().iter().map(|v| [v.x, v.y, v.z]).collect());

        Some(Self {
            index,
            time_sec: index as f64 * interval,
            host_time_sec,
            particles,
            mesh_vertices,
            applied: report.applied.iter().map(|k| k.to_string()).collect(),
        })
    }
}

/// Complete replay export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayExport {
    /// Directory the frames were read from
    pub base_path: String,

    /// Host jitter seed
    pub seed: u64,

    /// Frame bound
    pub total_frames: u32,

    /// Seconds between advances
    pub tick_interval_secs: f64,

    /// Host time covered by the run
    pub duration_sec: f64,

    /// All recorded advances
    pub frames: Vec<ReplayFrame>,

    /// No player failed
    pub passed: bool,

    /// Player failures, formatted
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<String>,
}

impl ReplayExport {
    /// Creates a new export container.
    pub fn new(base_path: &str, seed: u64, total_frames: u32, tick_interval_secs: f64) -> Self {
        Self {
            base_path: base_path.to_string(),
            seed,
            total_frames,
            tick_interval_secs,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failures: Vec::new(),
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: ReplayFrame) {
        self.duration_sec = frame.host_time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, duration_sec: f64, failures: Vec<String>) {
        self.duration_sec = duration_sec;
        self.passed = failures.is_empty();
        self.failures = failures;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Reads an export back from a JSON file.
    pub fn read_from_file(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
