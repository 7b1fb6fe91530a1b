//! DamBreak Scene Host Abstraction
//!
//! This crate describes the render host that replayed frames are applied to.
//! The playback engine never talks to a renderer directly: it only creates
//! entities and meshes through [`SceneHost`] and then pushes positions,
//! vertex buffers and index buffers into them.
//!
//! # Implementations
//!
//! - **Headless**: [`HeadlessScene`] keeps everything in memory and computes
//!   smooth normals itself. Used by the replay harness and by tests.
//! - **Viewer**: `RerunScene` in `dambreak_sim` (feature `visualization`).
//!
//! # Example
//!
//! ```ignore
//! use dambreak_env::{HeadlessScene, SceneHost};
//! use nalgebra::Vector3;
//!
//! let mut scene = HeadlessScene::new();
//! let particle = scene.create_entity("0")?;
//! scene.set_entity_position(particle, Vector3::new(0.0, 1.0, 0.0))?;
//! ```

mod error;
mod headless;
mod scene;
mod types;

pub use error::EnvError;
pub use headless::{compute_smooth_normals, HeadlessScene};
pub use scene::SceneHost;
pub use types::{EntityId, MeshId};
