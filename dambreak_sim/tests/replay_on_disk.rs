//! Replays frame sets written to real temp directories.

use dambreak_core::{
    ActivePlayers, DiskReader, EndBehavior, FrameError, PlaybackConfig, PlaybackController, PlayerKind,
};
use dambreak_env::HeadlessScene;
use dambreak_sim::{validate_frame_set, ReplayExport, ReplayOptions, ReplayRunner};
use nalgebra::Vector3;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Temp directory removed on drop.
struct FrameDir {
    path: PathBuf,
}

impl FrameDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("dambreak-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn write(&self, name: &str, contents: &str) {
        fs::write(self.path.join(name), contents).unwrap();
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FrameDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn two_frame_set() -> FrameDir {
    let dir = FrameDir::new();
    dir.write("DamBreak0.txt", "0,0,0,1,1,1,2,2,2,3,3,3");
    dir.write("DamBreak1.txt", "4,4,4,5,5,5,6,6,6,7,7,7");
    dir
}

/// Writes a 4-vertex quad: topology plus frames 2..total with every
/// vertex raised by the frame index.
fn mesh_set(dir: &FrameDir, total: u32) {
    // 4 vertices, 2 triangles
    dir.write("Mesh.txt", "4,2,0,0,0,1,0,0,0,0,1,1,0,1,0,1,2,1,3,2");
    for i in 2..total {
        let y = i as f32;
        let text: String = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
            .iter()
            .map(|(x, z)| format!("{},{},{},", x, y, z))
            .collect();
        dir.write(&format!("Mesh{}.txt", i), &text);
    }
}

fn splat(v: f32) -> Vector3<f32> {
    Vector3::new(v, v, v)
}

#[test]
fn test_two_frame_loop_from_disk() {
    let dir = two_frame_set();
    let config = PlaybackConfig::default()
        .with_pool_size(4)
        .with_total_frames(2)
        .with_tick_interval(0.04)
        .with_base_path(dir.path());

    let mut scene = HeadlessScene::new();
    let mut controller = PlaybackController::new(config).unwrap();
    controller.start(&mut scene).unwrap();

    let report = controller.update(&mut scene, Duration::from_millis(50));
    assert_eq!(report.frame, Some(0));
    assert_eq!(scene.positions(), vec![splat(0.0), splat(1.0), splat(2.0), splat(3.0)]);
    assert_eq!(controller.current_index(), 1);

    let report = controller.update(&mut scene, Duration::from_millis(50));
    assert_eq!(report.frame, Some(1));
    assert!(report.looped);
    assert_eq!(scene.positions(), vec![splat(4.0), splat(5.0), splat(6.0), splat(7.0)]);
    assert_eq!(controller.current_index(), 1);
}

#[test]
fn test_stop_at_end_from_disk() {
    let dir = two_frame_set();
    let config = PlaybackConfig::default()
        .with_pool_size(4)
        .with_total_frames(2)
        .with_tick_interval(0.04)
        .with_base_path(dir.path())
        .with_end_behavior(EndBehavior::Stop);

    let options = ReplayOptions {
        render_hz: 50.0,
        duration_secs: 5.0,
        ..Default::default()
    };
    let result = ReplayRunner::new(config, options).run().unwrap();

    assert!(result.finished);
    assert!(result.passed());
    assert_eq!(result.advances, 2);
    assert_eq!(result.final_index, 1);
}

#[test]
fn test_particles_and_mesh_together() {
    let dir = two_frame_set();
    dir.write("DamBreak2.txt", "8,8,8,9,9,9,10,10,10,11,11,11,");
    dir.write("DamBreak3.txt", "12,12,12,13,13,13,14,14,14,15,15,15,");
    mesh_set(&dir, 4);

    let config = PlaybackConfig::default()
        .with_pool_size(4)
        .with_total_frames(4)
        .with_tick_interval(0.04)
        .with_base_path(dir.path())
        .with_players(ActivePlayers::Both)
        .with_end_behavior(EndBehavior::Stop);

    let mut scene = HeadlessScene::new();
    let mut controller = PlaybackController::new(config).unwrap();
    controller.start(&mut scene).unwrap();

    let mesh = controller.mesh().unwrap();
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.index_buffer(), &[0, 1, 2, 1, 3, 2]);
    let mesh_id = mesh.mesh().unwrap();

    // Frames 0 and 1 leave the mesh at its topology pose
    for _ in 0..2 {
        let report = controller.update(&mut scene, Duration::from_millis(40));
        assert_eq!(report.applied, vec![PlayerKind::Particles]);
    }
    assert_eq!(scene.mesh(mesh_id).unwrap().vertices[3], Vector3::new(1.0, 0.0, 1.0));

    let report = controller.update(&mut scene, Duration::from_millis(40));
    assert_eq!(report.frame, Some(2));
    assert_eq!(report.applied, vec![PlayerKind::Particles, PlayerKind::Mesh]);
    assert_eq!(scene.positions()[0], splat(8.0));

    let stored = scene.mesh(mesh_id).unwrap();
    assert!(stored.vertices.iter().all(|v| v.y == 2.0));
    assert_eq!(stored.normals.len(), 4);
    for n in &stored.normals {
        approx::assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);
    }

    let report = controller.update(&mut scene, Duration::from_millis(40));
    assert_eq!(report.frame, Some(3));
    assert!(report.finished);
    assert!(scene.mesh(mesh_id).unwrap().vertices.iter().all(|v| v.y == 3.0));
}

#[test]
fn test_truncated_frame_halts_particles_only() {
    let dir = two_frame_set();
    dir.write("DamBreak2.txt", "8,8,8,9,9,9,10,10,10,11,11");
    dir.write("DamBreak3.txt", "12,12,12,13,13,13,14,14,14,15,15,15");
    mesh_set(&dir, 4);

    let config = PlaybackConfig::default()
        .with_pool_size(4)
        .with_total_frames(4)
        .with_tick_interval(0.04)
        .with_base_path(dir.path())
        .with_players(ActivePlayers::Both)
        .with_end_behavior(EndBehavior::Stop);

    let options = ReplayOptions {
        render_hz: 25.0,
        duration_secs: 1.0,
        ..Default::default()
    };
    let result = ReplayRunner::new(config, options).run().unwrap();

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].player, "particles");
    assert_eq!(result.failures[0].frame, 2);
    assert!(result.finished);
}

#[test]
fn test_validate_reports_bad_files() {
    let dir = two_frame_set();
    dir.write("DamBreak2.txt", "not,a,number,0,0,0,0,0,0,0,0,0");

    let config = PlaybackConfig::default()
        .with_pool_size(4)
        .with_total_frames(4)
        .with_base_path(dir.path());

    let report = validate_frame_set(&config, Arc::new(DiskReader));
    assert!(!report.passed());
    assert_eq!(report.particle_frames_ok, 2);
    assert!(matches!(report.errors[0], FrameError::Malformed { index: 2, .. }));
    assert!(matches!(report.errors[1], FrameError::Missing { index: 3, .. }));
    assert_eq!(report.errors[1].path(), Some(dir.path().join("DamBreak3.txt").as_path()));
}

#[test]
fn test_export_round_trip() {
    let dir = two_frame_set();
    let config = PlaybackConfig::default()
        .with_pool_size(4)
        .with_total_frames(2)
        .with_tick_interval(0.04)
        .with_base_path(dir.path());

    let options = ReplayOptions {
        render_hz: 25.0,
        duration_secs: 0.2,
        record: true,
        ..Default::default()
    };
    let result = ReplayRunner::new(config, options).run().unwrap();
    let export = result.export.unwrap();

    let out = dir.path().join("export.json");
    export.write_to_file(out.to_str().unwrap()).unwrap();
    let back = ReplayExport::read_from_file(out.to_str().unwrap()).unwrap();

    assert!(back.passed);
    assert_eq!(back.frames.len(), export.frames.len());
    assert_eq!(back.frames[0].index, 0);
    assert_eq!(back.frames[1].particles[3].z, 7.0);
    assert!(back.frames.iter().skip(1).all(|f| f.index == 1));
}
