//! Frame-set validation.
//!
//! Decodes every frame a playback session would touch, up front, so a bad
//! file is found before the scene starts instead of halting a player halfway
//! through the run.

use dambreak_core::source::FIRST_MESH_FRAME;
use dambreak_core::{FrameError, FrameReader, FrameSource, PlaybackConfig};
use std::sync::Arc;
use tracing::debug;

/// Outcome of a validation pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Particle frames decoded successfully
    pub particle_frames_ok: u32,

    /// Mesh files decoded successfully (topology included)
    pub mesh_frames_ok: u32,

    /// Every failure, in frame order (particles first)
    pub errors: Vec<FrameError>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decodes every frame file named by `config`.
///
/// Particle frames `0..total` must hold exactly `pool_size` vectors. With the
/// mesh player active, the topology file must decode and mesh frames
/// `2..total` must hold exactly its vertex count.
pub fn validate_frame_set(config: &PlaybackConfig, reader: Arc<dyn FrameReader>) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.players.particles() {
        let source = FrameSource::particles(&config.base_path).with_reader(reader.clone());
        for index in 0..config.total_frames {
            match source.load_positions(index, Some(config.pool_size)) {
                Ok(_) => report.particle_frames_ok += 1,
                Err(e) => report.errors.push(e),
            }
        }
        debug!("Checked {} particle frames", config.total_frames);
    }

    if config.players.mesh() {
        let source = FrameSource::mesh(&config.base_path).with_reader(reader);
        match source.load_topology() {
            Ok(topology) => {
                report.mesh_frames_ok += 1;
                for index in FIRST_MESH_FRAME..config.total_frames {
                    match source.load_positions(index, Some(topology.vertex_count())) {
                        Ok(_) => report.mesh_frames_ok += 1,
                        Err(e) => report.errors.push(e),
                    }
                }
            }
            // Without topology the vertex count is unknown
            Err(e) => report.errors.push(e),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use dambreak_core::{ActivePlayers, MemoryReader};

    fn config(players: ActivePlayers) -> PlaybackConfig {
        PlaybackConfig::default()
            .with_pool_size(1)
            .with_total_frames(4)
            .with_base_path("data")
            .with_players(players)
    }

    #[test]
    fn test_complete_set_passes() {
        let reader = MemoryReader::shared();
        reader.insert("data/Mesh.txt", "1,0,0,0,0");
        for i in 0..4 {
            reader.insert(format!("data/DamBreak{}.txt", i), "0,0,0,");
        }
        for i in 2..4 {
            reader.insert(format!("data/Mesh{}.txt", i), "0,1,0");
        }

        let report = validate_frame_set(&config(ActivePlayers::Both), reader);
        assert!(report.passed(), "{:?}", report.errors);
        assert_eq!(report.particle_frames_ok, 4);
        assert_eq!(report.mesh_frames_ok, 3);
    }

    #[test]
    fn test_reports_every_bad_frame() {
        let reader = MemoryReader::shared();
        reader.insert("data/DamBreak0.txt", "0,0,0");
        reader.insert("data/DamBreak1.txt", "0,0");
        reader.insert("data/DamBreak3.txt", "0,0,0,1,1,1");

        let report = validate_frame_set(&config(ActivePlayers::Particles), reader);
        assert_eq!(report.particle_frames_ok, 1);
        let bad: Vec<_> = report.errors.iter().filter_map(|e| e.index()).collect();
        assert_eq!(bad, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_topology_stops_mesh_checks() {
        let report = validate_frame_set(&config(ActivePlayers::Mesh), MemoryReader::shared());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.mesh_frames_ok, 0);
    }
}
