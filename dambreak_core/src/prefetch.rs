//! Frame text delivery, blocking or prefetched.
//!
//! By default a player reads its frame file inside the host tick. With
//! prefetch enabled, a worker thread reads the *next* frame while the current
//! one is being applied and hands it over through a single-slot channel.
//!
//! ```text
//!   player                      worker
//!     |-- request(next) -------->|
//!     |                          |-- read_frame(next)
//!     |<------- (next, text) ----|        [slot: capacity 1]
//!     |   take on next advance
//! ```
//!
//! Each handed-over frame is consumed exactly once. If the frame that arrives
//! is not the one being asked for (loop restart, player re-enabled), it is
//! dropped and the requested frame is read synchronously, so ordering is
//! never affected.

use crate::error::FrameError;
use crate::source::FrameSource;
use crossbeam::channel::{bounded, Receiver, Sender};
use std::thread::JoinHandle;
use tracing::debug;

type Delivery = (u32, Result<String, FrameError>);

/// Background reader with a single-slot handoff.
pub struct Prefetcher {
    source: FrameSource,
    requests: Option<Sender<u32>>,
    ready: Receiver<Delivery>,
    pending: Option<u32>,
    worker: Option<JoinHandle<()>>,
    hits: u64,
    misses: u64,
}

impl Prefetcher {
    /// Starts the worker thread for `source`.
    pub fn spawn(source: FrameSource) -> Result<Self, FrameError> {
        let (request_tx, request_rx) = bounded::<u32>(1);
        let (ready_tx, ready_rx) = bounded::<Delivery>(1);
        let worker_source = source.clone();

        let worker = std::thread::Builder::new()
            .name(format!("prefetch-{}", source.kind().prefix()))
            .spawn(move || {
                for index in request_rx.iter() {
                    let result = worker_source.read_frame(index);
                    if ready_tx.send((index, result)).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| FrameError::Worker(e.to_string()))?;

        Ok(Self {
            source,
            requests: Some(request_tx),
            ready: ready_rx,
            pending: None,
            worker: Some(worker),
            hits: 0,
            misses: 0,
        })
    }

    pub fn source(&self) -> &FrameSource {
        &self.source
    }

    /// Returns the text of frame `index` and schedules `next` in the background.
    pub fn fetch(&mut self, index: u32, next: Option<u32>) -> Result<String, FrameError> {
        let result = match self.pending.take() {
            Some(_) => {
                let (got, result) = self
                    .ready
                    .recv()
                    .map_err(|_| FrameError::Worker("prefetch worker disconnected".to_string()))?;
                if got == index {
                    self.hits += 1;
                    result
                } else {
                    debug!("Discarding prefetched frame {} (wanted {})", got, index);
                    self.misses += 1;
                    self.source.read_frame(index)
                }
            }
            None => {
                self.misses += 1;
                self.source.read_frame(index)
            }
        };

        if let (Some(next), Some(requests)) = (next, self.requests.as_ref()) {
            if requests.send(next).is_ok() {
                self.pending = Some(next);
            }
        }

        result
    }

    /// Frames served from the background slot.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Frames read synchronously (cold start or wrong frame prefetched).
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Where a player gets frame text from.
pub enum FrameFeed {
    /// Read inside the tick
    Blocking(FrameSource),

    /// Read one frame ahead on a worker thread
    Prefetch(Prefetcher),
}

impl FrameFeed {
    pub fn source(&self) -> &FrameSource {
        match self {
            FrameFeed::Blocking(source) => source,
            FrameFeed::Prefetch(prefetcher) => prefetcher.source(),
        }
    }

    /// Reads frame `index`; `next` is a hint for prefetching.
    pub fn fetch(&mut self, index: u32, next: Option<u32>) -> Result<String, FrameError> {
        match self {
            FrameFeed::Blocking(source) => source.read_frame(index),
            FrameFeed::Prefetch(prefetcher) => prefetcher.fetch(index, next),
        }
    }

    /// Switches a blocking feed to a prefetching one. No-op if already prefetching.
    pub fn enable_prefetch(&mut self) -> Result<(), FrameError> {
        if let FrameFeed::Blocking(source) = self {
            let prefetcher = Prefetcher::spawn(source.clone())?;
            *self = FrameFeed::Prefetch(prefetcher);
        }
        Ok(())
    }

    pub fn is_prefetching(&self) -> bool {
        matches!(self, FrameFeed::Prefetch(_))
    }
}
