//! Error types for the playback engine.
//!
//! Decode errors describe what is wrong with a payload. Frame errors attach
//! the frame index and file path so the diagnostic can name the file. Player
//! errors are what the controller sees and acts on (halt the player).

use dambreak_env::EnvError;
use std::path::PathBuf;
use thiserror::Error;

/// A frame payload could not be decoded.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// Payload had no fields at all
    #[error("Empty frame payload")]
    Empty,

    /// Field count cannot be grouped into 3-vectors
    #[error("Field count {fields} is not a multiple of 3")]
    RaggedFields { fields: usize },

    /// A field is not a finite floating-point literal
    #[error("Field {position} is not a valid number: {field:?}")]
    InvalidNumber { position: usize, field: String },

    /// A topology header field is not a non-negative integer
    #[error("Header field {position} is not a valid count: {field:?}")]
    InvalidHeader { position: usize, field: String },

    /// Topology header counts disagree with the payload length
    #[error("Header declares {vertices} vertices and {triangles} triangles ({expected} fields) but {found} fields follow")]
    HeaderMismatch {
        vertices: usize,
        triangles: usize,
        expected: usize,
        found: usize,
    },

    /// Decoded vector count differs from the required count
    #[error("Expected {expected} vectors, found {found}")]
    CountMismatch { expected: usize, found: usize },

    /// Triangle component is not a whole number in `u32` range
    #[error("Triangle {triangle} has invalid vertex index {value}")]
    NonIntegralIndex { triangle: usize, value: f32 },

    /// Triangle references a vertex past the end of the vertex block
    #[error("Triangle {triangle} references vertex {index} but only {vertex_count} exist")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// A frame file could not be loaded.
#[derive(Debug, Error)]
pub enum FrameError {
    /// File absent or unreadable
    #[error("Frame {index} could not be read from {}: {source}", path.display())]
    Missing {
        index: u32,
        path: PathBuf,
        source: std::io::Error,
    },

    /// File read but contents are malformed
    #[error("Frame {index} in {} is malformed: {source}", path.display())]
    Malformed {
        index: u32,
        path: PathBuf,
        source: DecodeError,
    },

    /// Background prefetch worker is gone or could not start
    #[error("Prefetch worker failed: {0}")]
    Worker(String),
}

impl FrameError {
    /// Returns the frame index this error refers to, if any.
    pub fn index(&self) -> Option<u32> {
        match self {
            FrameError::Missing { index, .. } | FrameError::Malformed { index, .. } => Some(*index),
            FrameError::Worker(_) => None,
        }
    }

    /// Returns the file path this error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            FrameError::Missing { path, .. } | FrameError::Malformed { path, .. } => Some(path),
            FrameError::Worker(_) => None,
        }
    }
}

/// Startup configuration was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Particle pool size must be greater than zero")]
    ZeroPoolSize,

    #[error("Total frame count must be greater than zero")]
    ZeroFrames,

    #[error("Tick interval must be a positive, finite number of seconds (got {0})")]
    InvalidInterval(f64),

    #[error("Loop restart index {restart} is outside 0..{total}")]
    RestartOutOfRange { restart: u32, total: u32 },

    #[error("Could not read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A player failed to initialize or to apply a frame.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Scene host rejected update: {0}")]
    Host(#[from] EnvError),

    #[error("Player ticked before initialize()")]
    NotInitialized,

    #[error("Player initialized twice")]
    AlreadyInitialized,

    #[error("Particle pool size must be greater than zero")]
    EmptyPool,
}
