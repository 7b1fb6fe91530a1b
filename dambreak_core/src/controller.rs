//! Playback controller.
//!
//! Drives the particle and mesh players from one shared clock. Per host tick:
//!
//! ```text
//! clock.accumulate(dt)
//! if clock.advance_check():
//!     cursor = (pre-increment index, successor, interval)
//!     particles.tick(cursor); mesh.tick(cursor)     (active, non-halted only)
//!     if index == total_frames: loop to restart index, or hold and finish
//! ```
//!
//! A player whose frame fails to load is halted: its entities stay on the last
//! good frame while the other player keeps going.

use crate::clock::{FrameCursor, PlaybackClock};
use crate::config::{EndBehavior, PlaybackConfig};
use crate::error::{ConfigError, PlayerError};
use crate::mesh::MeshPlayer;
use crate::particles::ParticlePlayer;
use crate::source::{DiskReader, FrameReader, FrameSource};
use dambreak_env::SceneHost;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Player identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerKind {
    Particles,
    Mesh,
}

impl std::fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerKind::Particles => write!(f, "particles"),
            PlayerKind::Mesh => write!(f, "mesh"),
        }
    }
}

/// Run state of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Ticked on every advance
    Active,

    /// Skipped until re-enabled
    Disabled,

    /// Stopped after a failed frame; stays on its last good frame
    Halted,
}

/// A player failure observed during one host tick.
#[derive(Debug)]
pub struct PlayerFailure {
    pub player: PlayerKind,
    pub frame: u32,
    pub error: PlayerError,
}

/// What happened during one `update` call.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Frame applied on this tick, if the clock advanced
    pub frame: Option<u32>,

    /// Players that applied the frame
    pub applied: Vec<PlayerKind>,

    /// Players halted on this tick
    pub failures: Vec<PlayerFailure>,

    /// Index wrapped to the loop restart
    pub looped: bool,

    /// Playback reached the bound with `EndBehavior::Stop`
    pub finished: bool,
}

impl TickReport {
    pub fn advanced(&self) -> bool {
        self.frame.is_some()
    }
}

struct Slot<P> {
    player: P,
    state: PlayerState,
}

impl<P> Slot<P> {
    fn new(player: P) -> Self {
        Self {
            player,
            state: PlayerState::Active,
        }
    }
}

/// Composes the players under one clock and frame bound.
pub struct PlaybackController {
    config: PlaybackConfig,
    clock: PlaybackClock,
    particles: Option<Slot<ParticlePlayer>>,
    mesh: Option<Slot<MeshPlayer>>,
    started: bool,
    finished: bool,
    advances: u64,
    loops: u64,
}

impl PlaybackController {
    /// Creates a controller reading frames from disk.
    pub fn new(config: PlaybackConfig) -> Result<Self, ConfigError> {
        Self::with_reader(config, Arc::new(DiskReader))
    }

    /// Creates a controller with a custom frame reader.
    pub fn with_reader(config: PlaybackConfig, reader: Arc<dyn FrameReader>) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = PlaybackClock::new(config.tick_interval()?, config.total_frames);

        let particles = config.players.particles().then(|| {
            Slot::new(ParticlePlayer::new(
                FrameSource::particles(&config.base_path).with_reader(reader.clone()),
            ))
        });
        let mesh = config.players.mesh().then(|| {
            Slot::new(MeshPlayer::new(
                FrameSource::mesh(&config.base_path).with_reader(reader.clone()),
            ))
        });

        Ok(Self {
            config,
            clock,
            particles,
            mesh,
            started: false,
            finished: false,
            advances: 0,
            loops: 0,
        })
    }

    /// Initializes every configured player.
    ///
    /// Any failure here is a startup failure: nothing has been shown yet, so
    /// there is no last good frame to hold.
    pub fn start<H: SceneHost>(&mut self, host: &mut H) -> Result<(), PlayerError> {
        if self.started {
            return Err(PlayerError::AlreadyInitialized);
        }

        if let Some(slot) = self.particles.as_mut() {
            if self.config.prefetch {
                slot.player.enable_prefetch()?;
            }
            slot.player.initialize(host, self.config.pool_size)?;
        }
        if let Some(slot) = self.mesh.as_mut() {
            if self.config.prefetch {
                slot.player.enable_prefetch()?;
            }
            slot.player.initialize(host)?;
        }

        self.started = true;
        info!(
            "Playback started: {} frames every {:?} from {} ({:?})",
            self.config.total_frames,
            self.clock.interval(),
            self.config.base_path.display(),
            self.config.players
        );
        Ok(())
    }

    /// Feeds one host tick of elapsed time.
    pub fn update<H: SceneHost>(&mut self, host: &mut H, delta: Duration) -> TickReport {
        let mut report = TickReport::default();
        if !self.started {
            debug!("Ignoring host tick before start");
            return report;
        }
        if self.finished {
            report.finished = true;
            return report;
        }

        self.clock.accumulate(delta);
        let current = self.clock.index();
        if !self.clock.advance_check() {
            return report;
        }

        let cursor = FrameCursor::new(current, self.successor(current), self.clock.interval());
        report.frame = Some(current);
        self.advances += 1;

        if let Some(slot) = self.particles.as_mut() {
            if slot.state == PlayerState::Active {
                match slot.player.tick(host, true, &cursor) {
                    Ok(true) => report.applied.push(PlayerKind::Particles),
                    Ok(false) => {}
                    Err(e) => {
                        slot.state = PlayerState::Halted;
                        report_failure(&mut report, PlayerKind::Particles, current, e);
                    }
                }
            }
        }
        if let Some(slot) = self.mesh.as_mut() {
            if slot.state == PlayerState::Active {
                match slot.player.tick(host, true, &cursor) {
                    Ok(true) => report.applied.push(PlayerKind::Mesh),
                    Ok(false) => {}
                    Err(e) => {
                        slot.state = PlayerState::Halted;
                        report_failure(&mut report, PlayerKind::Mesh, current, e);
                    }
                }
            }
        }

        debug!("Advanced frame {} ({:?})", current, report.applied);

        if self.clock.at_bound() {
            match self.config.end_behavior {
                EndBehavior::Loop { restart_index } => {
                    self.clock.set_index(restart_index);
                    self.loops += 1;
                    report.looped = true;
                    info!(
                        "Reached frame bound {}, looping to frame {}",
                        self.clock.total_frames(),
                        restart_index
                    );
                }
                EndBehavior::Stop => {
                    self.clock.set_index(self.clock.total_frames() - 1);
                    self.finished = true;
                    report.finished = true;
                    info!("Reached frame bound {}, playback stopped", self.clock.total_frames());
                }
            }
        }

        report
    }

    /// Frame the advance after `index` will apply.
    fn successor(&self, index: u32) -> Option<u32> {
        let next = index + 1;
        if next < self.clock.total_frames() {
            return Some(next);
        }
        match self.config.end_behavior {
            EndBehavior::Loop { restart_index } => Some(restart_index),
            EndBehavior::Stop => None,
        }
    }

    /// Enables or disables a player. Halted players stay halted.
    ///
    /// Returns false if the player is not configured or is halted.
    pub fn set_enabled(&mut self, kind: PlayerKind, enabled: bool) -> bool {
        let state = match kind {
            PlayerKind::Particles => self.particles.as_mut().map(|s| &mut s.state),
            PlayerKind::Mesh => self.mesh.as_mut().map(|s| &mut s.state),
        };
        match state {
            Some(state) if *state != PlayerState::Halted => {
                *state = if enabled {
                    PlayerState::Active
                } else {
                    warn!("Player {} disabled at frame {}", kind, self.clock.index());
                    PlayerState::Disabled
                };
                true
            }
            _ => false,
        }
    }

    /// Run state of a player, or None if it is not configured.
    pub fn player_state(&self, kind: PlayerKind) -> Option<PlayerState> {
        match kind {
            PlayerKind::Particles => self.particles.as_ref().map(|s| s.state),
            PlayerKind::Mesh => self.mesh.as_ref().map(|s| s.state),
        }
    }

    pub fn is_enabled(&self, kind: PlayerKind) -> bool {
        self.player_state(kind) == Some(PlayerState::Active)
    }

    pub fn particles(&self) -> Option<&ParticlePlayer> {
        self.particles.as_ref().map(|s| &s.player)
    }

    pub fn mesh(&self) -> Option<&MeshPlayer> {
        self.mesh.as_ref().map(|s| &s.player)
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Frame the next advance will apply.
    pub fn current_index(&self) -> u32 {
        self.clock.index()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances since start.
    pub fn advances(&self) -> u64 {
        self.advances
    }

    /// Times the index wrapped to the loop restart.
    pub fn loops(&self) -> u64 {
        self.loops
    }
}

fn report_failure(report: &mut TickReport, player: PlayerKind, frame: u32, error: PlayerError) {
    error!("Player {} halted at frame {}: {}", player, frame, error);
    report.failures.push(PlayerFailure { player, frame, error });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActivePlayers;
    use crate::error::FrameError;
    use crate::source::MemoryReader;
    use dambreak_env::HeadlessScene;
    use nalgebra::Vector3;

    const DT: Duration = Duration::from_millis(50);

    fn two_frame_reader() -> Arc<MemoryReader> {
        let reader = MemoryReader::shared();
        reader.insert("data/DamBreak0.txt", "0,0,0,1,1,1,2,2,2,3,3,3");
        reader.insert("data/DamBreak1.txt", "4,4,4,5,5,5,6,6,6,7,7,7");
        reader
    }

    fn config() -> PlaybackConfig {
        PlaybackConfig::default()
            .with_pool_size(4)
            .with_total_frames(2)
            .with_tick_interval(0.04)
            .with_base_path("data")
    }

    fn uniform(scene: &HeadlessScene, values: [f32; 4]) -> bool {
        scene
            .positions()
            .iter()
            .zip(values)
            .all(|(p, v)| *p == Vector3::new(v, v, v))
    }

    #[test]
    fn test_two_frame_loop_scenario() {
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(config(), two_frame_reader()).unwrap();
        controller.start(&mut scene).unwrap();

        let report = controller.update(&mut scene, DT);
        assert_eq!(report.frame, Some(0));
        assert!(uniform(&scene, [0.0, 1.0, 2.0, 3.0]));
        assert_eq!(controller.current_index(), 1);

        let report = controller.update(&mut scene, DT);
        assert_eq!(report.frame, Some(1));
        assert!(report.looped);
        assert!(uniform(&scene, [4.0, 5.0, 6.0, 7.0]));
        // Default policy loops to frame 1, never sits on total_frames
        assert_eq!(controller.current_index(), 1);

        let report = controller.update(&mut scene, DT);
        assert_eq!(report.frame, Some(1));
        assert_eq!(controller.loops(), 2);
    }

    #[test]
    fn test_stop_holds_last_frame() {
        let mut scene = HeadlessScene::new();
        let config = config().with_end_behavior(EndBehavior::Stop);
        let mut controller = PlaybackController::with_reader(config, two_frame_reader()).unwrap();
        controller.start(&mut scene).unwrap();

        controller.update(&mut scene, DT);
        let report = controller.update(&mut scene, DT);
        assert!(report.finished);
        assert_eq!(controller.current_index(), 1);

        let writes = scene.position_writes();
        let report = controller.update(&mut scene, DT);
        assert!(report.finished);
        assert!(!report.advanced());
        assert_eq!(scene.position_writes(), writes);
        assert!(uniform(&scene, [4.0, 5.0, 6.0, 7.0]));
    }

    #[test]
    fn test_short_ticks_accumulate() {
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(config(), two_frame_reader()).unwrap();
        controller.start(&mut scene).unwrap();

        assert!(!controller.update(&mut scene, Duration::from_millis(20)).advanced());
        assert_eq!(scene.position_writes(), 0);
        assert!(controller.update(&mut scene, Duration::from_millis(20)).advanced());
        assert_eq!(controller.current_index(), 1);
    }

    #[test]
    fn test_malformed_frame_halts_player() {
        let reader = two_frame_reader();
        reader.insert("data/DamBreak1.txt", "4,4,4,5,5,5,6,6,6,7,7");
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(config(), reader).unwrap();
        controller.start(&mut scene).unwrap();

        controller.update(&mut scene, DT);
        let report = controller.update(&mut scene, DT);

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.player, PlayerKind::Particles);
        assert_eq!(failure.frame, 1);
        assert!(matches!(failure.error, PlayerError::Frame(FrameError::Malformed { .. })));
        assert_eq!(controller.player_state(PlayerKind::Particles), Some(PlayerState::Halted));
        assert!(uniform(&scene, [0.0, 1.0, 2.0, 3.0]));

        // Halted players are skipped and cannot be re-enabled
        assert!(!controller.set_enabled(PlayerKind::Particles, true));
        let report = controller.update(&mut scene, DT);
        assert!(report.advanced());
        assert!(report.applied.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_mesh_failure_does_not_stop_particles() {
        let reader = MemoryReader::shared();
        reader.insert("data/Mesh.txt", "3,1,0,0,0,1,0,0,0,0,1,0,1,2");
        for i in 0..4 {
            reader.insert(format!("data/DamBreak{}.txt", i), format!("{},0,0", i));
        }
        // No Mesh2.txt on disk
        let config = PlaybackConfig::default()
            .with_pool_size(1)
            .with_total_frames(4)
            .with_tick_interval(0.04)
            .with_base_path("data")
            .with_players(ActivePlayers::Both);
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(config, reader).unwrap();
        controller.start(&mut scene).unwrap();

        controller.update(&mut scene, DT);
        controller.update(&mut scene, DT);
        let report = controller.update(&mut scene, DT);
        assert_eq!(report.frame, Some(2));
        assert_eq!(report.applied, vec![PlayerKind::Particles]);
        assert_eq!(report.failures[0].player, PlayerKind::Mesh);

        let report = controller.update(&mut scene, DT);
        assert_eq!(report.applied, vec![PlayerKind::Particles]);
        assert_eq!(scene.positions()[0], Vector3::new(3.0, 0.0, 0.0));
        assert_eq!(controller.player_state(PlayerKind::Mesh), Some(PlayerState::Halted));
    }

    #[test]
    fn test_mesh_returns_to_rest_pose_after_loop() {
        let reader = MemoryReader::shared();
        reader.insert("data/Mesh.txt", "3,1,0,0,0,1,0,0,0,0,1,0,1,2");
        reader.insert("data/Mesh2.txt", "0,9,0,1,9,0,0,9,1");
        for i in 0..3 {
            reader.insert(format!("data/DamBreak{}.txt", i), format!("{},0,0", i));
        }
        let config = PlaybackConfig::default()
            .with_pool_size(1)
            .with_total_frames(3)
            .with_tick_interval(0.04)
            .with_base_path("data")
            .with_players(ActivePlayers::Both);
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(config, reader).unwrap();
        controller.start(&mut scene).unwrap();
        let mesh_id = controller.mesh().and_then(|m| m.mesh()).unwrap();

        for _ in 0..3 {
            controller.update(&mut scene, DT);
        }
        assert_eq!(scene.mesh(mesh_id).unwrap().vertices[0], Vector3::new(0.0, 9.0, 0.0));

        // Looped back to frame 1: both players show frame 1
        let report = controller.update(&mut scene, DT);
        assert_eq!(report.frame, Some(1));
        assert_eq!(report.applied, vec![PlayerKind::Particles, PlayerKind::Mesh]);
        assert_eq!(scene.positions()[0], Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(scene.mesh(mesh_id).unwrap().vertices[0], Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_update_before_start_is_ignored() {
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(config(), two_frame_reader()).unwrap();

        let report = controller.update(&mut scene, DT);
        assert!(!report.advanced());
        assert!(report.failures.is_empty());
        assert_eq!(controller.current_index(), 0);

        controller.start(&mut scene).unwrap();
        assert_eq!(controller.player_state(PlayerKind::Particles), Some(PlayerState::Active));
        let report = controller.update(&mut scene, DT);
        assert_eq!(report.frame, Some(0));
        assert_eq!(report.applied, vec![PlayerKind::Particles]);
    }

    #[test]
    fn test_disabled_player_skips_frames() {
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(config(), two_frame_reader()).unwrap();
        controller.start(&mut scene).unwrap();

        assert!(controller.set_enabled(PlayerKind::Particles, false));
        let report = controller.update(&mut scene, DT);
        assert!(report.advanced());
        assert!(report.applied.is_empty());
        assert_eq!(scene.position_writes(), 0);

        assert!(controller.set_enabled(PlayerKind::Particles, true));
        let report = controller.update(&mut scene, DT);
        assert_eq!(report.applied, vec![PlayerKind::Particles]);
        assert!(uniform(&scene, [4.0, 5.0, 6.0, 7.0]));

        assert!(!controller.set_enabled(PlayerKind::Mesh, true));
    }

    #[test]
    fn test_startup_failure_on_missing_topology() {
        let config = config().with_players(ActivePlayers::Mesh);
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(config, two_frame_reader()).unwrap();
        assert!(controller.start(&mut scene).is_err());
        assert!(!controller.is_started());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = config().with_pool_size(0);
        assert!(matches!(
            PlaybackController::with_reader(config, MemoryReader::shared()),
            Err(ConfigError::ZeroPoolSize)
        ));
    }

    #[test]
    fn test_prefetch_playback_matches_blocking() {
        let reader = MemoryReader::shared();
        for i in 0..5 {
            reader.insert(format!("data/DamBreak{}.txt", i), format!("{},{},{}", i, i * 2, i * 3));
        }
        let base = PlaybackConfig::default()
            .with_pool_size(1)
            .with_total_frames(5)
            .with_tick_interval(0.04)
            .with_base_path("data");

        let mut blocking_scene = HeadlessScene::new();
        let mut prefetch_scene = HeadlessScene::new();
        let mut blocking = PlaybackController::with_reader(base.clone(), reader.clone()).unwrap();
        let mut prefetch = PlaybackController::with_reader(base.with_prefetch(true), reader).unwrap();
        blocking.start(&mut blocking_scene).unwrap();
        prefetch.start(&mut prefetch_scene).unwrap();

        for _ in 0..12 {
            let a = blocking.update(&mut blocking_scene, DT);
            let b = prefetch.update(&mut prefetch_scene, DT);
            assert_eq!(a.frame, b.frame);
            assert_eq!(blocking_scene.positions(), prefetch_scene.positions());
        }
    }
}
