//! DamBreak Replay Harness
//!
//! Drives the playback engine the way a render loop would, but under full
//! control: host ticks come from a seeded virtual clock, frames land in an
//! in-memory scene, and every advance can be recorded for export.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     ReplayRunner                     │
//! │  ┌───────────────┐   delta   ┌────────────────────┐  │
//! │  │ SimHostClock  │──────────►│ PlaybackController │  │
//! │  │ (ChaCha8 seed)│           └─────────┬──────────┘  │
//! │  └───────────────┘                     │             │
//! │                              ┌─────────▼──────────┐  │
//! │                              │ HeadlessScene /    │  │
//! │                              │ RerunScene         │  │
//! │                              └─────────┬──────────┘  │
//! │                                        ▼             │
//! │                               ReplayExport (JSON)    │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use dambreak_core::PlaybackConfig;
//! use dambreak_sim::{ReplayOptions, ReplayRunner};
//!
//! let options = ReplayOptions {
//!     render_hz: 144.0,
//!     jitter: 0.2,
//!     ..Default::default()
//! };
//!
//! let result = ReplayRunner::new(PlaybackConfig::default(), options).run()?;
//! assert!(result.passed());
//! ```

mod exporter;
mod host_clock;
mod runner;
mod validate;
pub mod visualizer;

pub use exporter::{ParticlePosition, ReplayExport, ReplayFrame};
pub use host_clock::{SimHostClock, MAX_JITTER};
pub use runner::{FailureRecord, ReplayError, ReplayOptions, ReplayResult, ReplayRunner};
pub use validate::{validate_frame_set, ValidationReport};
pub use visualizer::RerunScene;
