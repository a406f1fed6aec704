//! # Scratch Allocator
//!
//! A pool of non-relocatable word buffers for job-local scratch data.
//!
//! Unlike the [`Arena`](super::Arena), buffers handed out here never move:
//! a worker can hold a `&mut [u64]` into one for the whole job without any
//! handle resolution. Released buffers go back to an idle pool and are
//! reused by later requests of equal or smaller size.
//!
//! # Thread Safety
//!
//! `ScratchArena` is `Sync`; the idle pool sits behind a `parking_lot`
//! mutex that is only touched on acquire/release, never while a buffer is
//! in use.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::config::StorageConfig;

/// Pool of non-relocatable scratch buffers.
///
/// # Example
///
/// ```rust,ignore
/// let scratch = ScratchArena::new(64);
///
/// let mut buf = scratch.alloc_words(16); // zeroed
/// buf[0] = 0xFF;
/// buf.release(); // back to the pool
/// ```
pub struct ScratchArena {
    /// Idle buffers, reused before allocating.
    idle: Mutex<Vec<Box<[u64]>>>,
    /// Maximum number of idle buffers retained.
    pool_limit: usize,
    /// Buffers currently handed out.
    outstanding: AtomicUsize,
}

impl ScratchArena {
    /// Creates a scratch arena that keeps at most `pool_limit` idle buffers.
    #[must_use]
    pub fn new(pool_limit: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(pool_limit)),
            pool_limit,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Creates a scratch arena sized from `config`.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.scratch_pool_limit)
    }

    /// Hands out a zeroed buffer of exactly `words` words.
    pub fn alloc_words(&self, words: usize) -> ScratchBuf<'_> {
        let reused = {
            let mut idle = self.idle.lock();
            // Smallest idle buffer that fits.
            let best = idle
                .iter()
                .enumerate()
                .filter(|(_, buf)| buf.len() >= words)
                .min_by_key(|(_, buf)| buf.len())
                .map(|(i, _)| i);
            best.map(|i| idle.swap_remove(i))
        };

        let storage = match reused {
            Some(mut buf) => {
                buf[..words].fill(0);
                buf
            }
            None => vec![0u64; words.max(1).next_power_of_two()].into_boxed_slice(),
        };

        self.outstanding.fetch_add(1, Ordering::Relaxed);
        ScratchBuf {
            storage: Some(storage),
            len: words,
            owner: self,
        }
    }

    /// Number of idle buffers held for reuse.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Number of buffers currently handed out.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    fn give_back(&self, storage: Box<[u64]>) {
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        let mut idle = self.idle.lock();
        if idle.len() < self.pool_limit {
            idle.push(storage);
        }
    }
}

impl Default for ScratchArena {
    fn default() -> Self {
        Self::from_config(&StorageConfig::default())
    }
}

/// A scratch word buffer borrowed from a [`ScratchArena`].
///
/// Release it with [`release`](Self::release) when the job is done; dropping
/// it has the same effect.
pub struct ScratchBuf<'a> {
    storage: Option<Box<[u64]>>,
    len: usize,
    owner: &'a ScratchArena,
}

impl ScratchBuf<'_> {
    /// Returns the buffer to its arena.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for ScratchBuf<'_> {
    type Target = [u64];

    #[inline]
    fn deref(&self) -> &[u64] {
        match &self.storage {
            Some(buf) => &buf[..self.len],
            None => &[],
        }
    }
}

impl DerefMut for ScratchBuf<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u64] {
        match &mut self.storage {
            Some(buf) => &mut buf[..self.len],
            None => &mut [],
        }
    }
}

impl Drop for ScratchBuf<'_> {
    fn drop(&mut self) {
        if let Some(storage) = self.storage.take() {
            self.owner.give_back(storage);
        }
    }
}
