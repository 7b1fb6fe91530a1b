//! Frame file naming and reading.
//!
//! Every frame lives in its own file under a base directory:
//!
//! ```text
//! <base>/DamBreak0.txt, DamBreak1.txt, ...   particle frames
//! <base>/Mesh.txt                             mesh topology (frame 0)
//! <base>/Mesh2.txt, Mesh3.txt, ...           mesh vertex frames
//! ```
//!
//! There is no `Mesh1.txt`: the producer's mesh numbering skips frame 1, and
//! the topology load stands in for both frame 0 and frame 1.

use crate::decoder::{self, MeshTopology};
use crate::error::FrameError;
use nalgebra::Vector3;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// File name prefix of particle frames.
pub const PARTICLE_PREFIX: &str = "DamBreak";

/// File name prefix of mesh frames and the topology file.
pub const MESH_PREFIX: &str = "Mesh";

/// Extension shared by every frame file.
pub const FRAME_EXTENSION: &str = "txt";

/// First mesh frame stored as its own file.
pub const FIRST_MESH_FRAME: u32 = 2;

/// Reads raw frame text by path.
///
/// # Implementations
///
/// - **Disk**: [`DiskReader`] wraps `std::fs`
/// - **Memory**: [`MemoryReader`] serves a path → text map
pub trait FrameReader: Send + Sync + 'static {
    /// Reads the whole file at `path` as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads frames from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskReader;

impl FrameReader for DiskReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves frames from memory.
///
/// Files can be added or replaced after the reader is shared.
#[derive(Debug, Default)]
pub struct MemoryReader {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped reader for sharing between sources.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(path.into(), text.into());
    }

    /// Removes a file, returning its previous contents.
    pub fn remove(&self, path: &Path) -> Option<String> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameReader for MemoryReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }
}

/// Which frame family a source reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `DamBreak<i>.txt`, every index from 0
    Particles,

    /// `Mesh.txt` topology plus `Mesh<i>.txt` for i >= 2
    Mesh,
}

impl FrameKind {
    /// Returns the file name prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            FrameKind::Particles => PARTICLE_PREFIX,
            FrameKind::Mesh => MESH_PREFIX,
        }
    }
}

/// Resolves frame indices to files and reads them.
#[derive(Clone)]
pub struct FrameSource {
    base: PathBuf,
    kind: FrameKind,
    reader: Arc<dyn FrameReader>,
}

impl FrameSource {
    /// Creates a disk-backed source of the given kind.
    pub fn new(base: impl Into<PathBuf>, kind: FrameKind) -> Self {
        Self {
            base: base.into(),
            kind,
            reader: Arc::new(DiskReader),
        }
    }

    /// Disk-backed particle source.
    pub fn particles(base: impl Into<PathBuf>) -> Self {
        Self::new(base, FrameKind::Particles)
    }

    /// Disk-backed mesh source.
    pub fn mesh(base: impl Into<PathBuf>) -> Self {
        Self::new(base, FrameKind::Mesh)
    }

    /// Replaces the reader.
    pub fn with_reader(mut self, reader: Arc<dyn FrameReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `<base>/<prefix><index>.txt`
    pub fn path_for(&self, index: u32) -> PathBuf {
        self.base
            .join(format!("{}{}.{}", self.kind.prefix(), index, FRAME_EXTENSION))
    }

    /// `<base>/<prefix>.txt`, the unindexed topology file.
    pub fn topology_path(&self) -> PathBuf {
        self.base
            .join(format!("{}.{}", self.kind.prefix(), FRAME_EXTENSION))
    }

    /// Reads the raw text of an indexed frame.
    pub fn read_frame(&self, index: u32) -> Result<String, FrameError> {
        let path = self.path_for(index);
        self.read_path(index, path)
    }

    /// Reads the raw text of the topology file (reported as frame 0).
    pub fn read_topology(&self) -> Result<String, FrameError> {
        let path = self.topology_path();
        self.read_path(0, path)
    }

    fn read_path(&self, index: u32, path: PathBuf) -> Result<String, FrameError> {
        match self.reader.read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(source) => Err(FrameError::Missing { index, path, source }),
        }
    }

    /// Decodes already-read frame text, attaching index and path on failure.
    pub fn decode_positions(
        &self,
        index: u32,
        text: &str,
        expected: Option<usize>,
    ) -> Result<Vec<Vector3<f32>>, FrameError> {
        decoder::decode_positions(text, expected).map_err(|source| FrameError::Malformed {
            index,
            path: self.path_for(index),
            source,
        })
    }

    /// Reads and decodes an indexed frame of 3-vectors.
    pub fn load_positions(&self, index: u32, expected: Option<usize>) -> Result<Vec<Vector3<f32>>, FrameError> {
        let text = self.read_frame(index)?;
        self.decode_positions(index, &text, expected)
    }

    /// Reads and decodes the topology file.
    pub fn load_topology(&self) -> Result<MeshTopology, FrameError> {
        let text = self.read_topology()?;
        decoder::decode_topology(&text).map_err(|source| FrameError::Malformed {
            index: 0,
            path: self.topology_path(),
            source,
        })
    }
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("base", &self.base)
            .field("kind", &self.kind)
            .finish()
    }
}
