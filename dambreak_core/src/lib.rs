//! DamBreak Core - Offline Frame Playback Engine
//!
//! Replays a precomputed dam-break SPH run (particle positions plus a
//! deforming terrain mesh) from per-frame text files, at a fixed cadence that
//! does not depend on the host's render rate.
//!
//! # Data Flow
//!
//! ```text
//! FrameSource ──> decoder ──> ParticlePlayer ──> SceneHost::set_entity_position
//!                         └─> MeshPlayer     ──> SceneHost::set_mesh_vertices
//!                                   ▲
//!                 PlaybackController (PlaybackClock, frame bound, end behavior)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use dambreak_core::{PlaybackConfig, PlaybackController};
//! use dambreak_env::HeadlessScene;
//!
//! let mut scene = HeadlessScene::new();
//! let mut controller = PlaybackController::new(PlaybackConfig::default())?;
//! controller.start(&mut scene)?;
//!
//! loop {
//!     let report = controller.update(&mut scene, frame_delta);
//!     // render
//! }
//! ```

pub mod clock;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod mesh;
pub mod particles;
pub mod prefetch;
pub mod source;

// Re-export key types for convenience
pub use clock::{FrameCursor, PlaybackClock};
pub use config::{ActivePlayers, EndBehavior, PlaybackConfig};
pub use controller::{PlaybackController, PlayerFailure, PlayerKind, PlayerState, TickReport};
pub use decoder::{decode_positions, decode_topology, MeshTopology};
pub use error::{ConfigError, DecodeError, FrameError, PlayerError};
pub use mesh::MeshPlayer;
pub use particles::ParticlePlayer;
pub use prefetch::{FrameFeed, Prefetcher};
pub use source::{DiskReader, FrameKind, FrameReader, FrameSource, MemoryReader};
