//! Particle playback.
//!
//! Owns a fixed pool of point entities. Entity `i` always shows record `i` of
//! the current particle frame: the pool is created once, never resized and
//! never reordered.

use crate::clock::FrameCursor;
use crate::error::PlayerError;
use crate::prefetch::FrameFeed;
use crate::source::FrameSource;
use dambreak_env::{EntityId, SceneHost};
use tracing::debug;

/// Writes particle frames into a pool of scene entities.
pub struct ParticlePlayer {
    feed: FrameFeed,
    pool: Vec<EntityId>,
    last_applied: Option<u32>,
}

impl ParticlePlayer {
    /// Creates an uninitialized player reading from `source`.
    pub fn new(source: FrameSource) -> Self {
        Self {
            feed: FrameFeed::Blocking(source),
            pool: Vec::new(),
            last_applied: None,
        }
    }

    /// Reads frames one ahead on a worker thread.
    pub fn enable_prefetch(&mut self) -> Result<(), PlayerError> {
        self.feed.enable_prefetch()?;
        Ok(())
    }

    /// Creates `pool_size` entities, named by pool index.
    ///
    /// Must be called exactly once before the first tick.
    pub fn initialize<H: SceneHost>(&mut self, host: &mut H, pool_size: usize) -> Result<(), PlayerError> {
        if !self.pool.is_empty() {
            return Err(PlayerError::AlreadyInitialized);
        }
        if pool_size == 0 {
            return Err(PlayerError::EmptyPool);
        }

        let mut pool = Vec::with_capacity(pool_size);
        for i in 0..pool_size {
            pool.push(host.create_entity(&i.to_string())?);
        }
        self.pool = pool;

        debug!("Particle pool ready: {} entities", pool_size);
        Ok(())
    }

    /// Applies frame `cursor.index` when `advance` is set.
    ///
    /// The whole frame is decoded before the first entity moves, so a
    /// malformed frame leaves every position as it was. Returns whether a
    /// frame was applied.
    pub fn tick<H: SceneHost>(
        &mut self,
        host: &mut H,
        advance: bool,
        cursor: &FrameCursor,
    ) -> Result<bool, PlayerError> {
        if !advance {
            return Ok(false);
        }
        if self.pool.is_empty() {
            return Err(PlayerError::NotInitialized);
        }

        let text = self.feed.fetch(cursor.index, cursor.next)?;
        let positions = self
            .feed
            .source()
            .decode_positions(cursor.index, &text, Some(self.pool.len()))?;

        for (entity, position) in self.pool.iter().zip(positions) {
            host.set_entity_position(*entity, position)?;
        }

        self.last_applied = Some(cursor.index);
        Ok(true)
    }

    pub fn pool(&self) -> &[EntityId] {
        &self.pool
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn is_initialized(&self) -> bool {
        !self.pool.is_empty()
    }

    /// Index of the last frame written to the pool.
    pub fn last_applied(&self) -> Option<u32> {
        self.last_applied
    }

    pub fn source(&self) -> &FrameSource {
        self.feed.source()
    }
}
