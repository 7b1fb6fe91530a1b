//! Error types for the scene host abstraction.

use thiserror::Error;

/// Errors raised by a [`SceneHost`](crate::SceneHost) implementation.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Entity handle was never created by this host
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Mesh handle was never created by this host
    #[error("Unknown mesh: {0}")]
    UnknownMesh(String),

    /// Index buffer is not a whole number of triangles
    #[error("Index buffer length {0} is not a multiple of 3")]
    RaggedIndexBuffer(usize),

    /// Backend-specific failure (viewer disconnected, upload failed, etc.)
    #[error("Host error: {0}")]
    Backend(String),
}

impl EnvError {
    /// Creates an unknown-entity error.
    pub fn unknown_entity(id: impl std::fmt::Display) -> Self {
        Self::UnknownEntity(id.to_string())
    }

    /// Creates an unknown-mesh error.
    pub fn unknown_mesh(id: impl std::fmt::Display) -> Self {
        Self::UnknownMesh(id.to_string())
    }

    /// Creates a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
