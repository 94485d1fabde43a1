//! Reusable big-integer temporaries for output calculations
//!
//! Idle slots sit in a bounded channel. Taking a slot is a `try_recv` and
//! returning one is a `try_send`, so neither side ever waits: an empty pool
//! hands out a fresh slot and a full pool drops the returned one.

use crossbeam_channel::{bounded, Receiver, Sender};
use num_bigint::BigInt;
use std::ops::{Deref, DerefMut};

/// Idle slots kept by [`crate::V2Math::new`]
pub const DEFAULT_SCRATCH_CAPACITY: usize = 64;

/// Temporaries for a single calculation. Every field is overwritten before
/// it is read.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    pub effective_in: BigInt,
    pub numerator: BigInt,
    pub denominator: BigInt,
}

#[derive(Debug)]
pub struct ScratchPool {
    idle_tx: Sender<Scratch>,
    idle_rx: Receiver<Scratch>,
}

impl ScratchPool {
    pub fn new(capacity: usize) -> Self {
        let (idle_tx, idle_rx) = bounded(capacity);
        Self { idle_tx, idle_rx }
    }

    /// Number of slots currently waiting for reuse
    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    pub(crate) fn acquire(&self) -> ScratchGuard<'_> {
        let scratch = self.idle_rx.try_recv().unwrap_or_default();
        ScratchGuard {
            pool: self,
            scratch: Some(scratch),
        }
    }

    fn release(&self, scratch: Scratch) {
        // full (or zero-capacity) pool: let the slot drop
        let _ = self.idle_tx.try_send(scratch);
    }
}

/// Slot on loan from a [`ScratchPool`], returned on drop
pub(crate) struct ScratchGuard<'a> {
    pool: &'a ScratchPool,
    scratch: Option<Scratch>,
}

impl Deref for ScratchGuard<'_> {
    type Target = Scratch;

    fn deref(&self) -> &Scratch {
        self.scratch.as_ref().expect("scratch present until drop")
    }
}

impl DerefMut for ScratchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Scratch {
        self.scratch.as_mut().expect("scratch present until drop")
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            self.pool.release(scratch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_allocates() {
        let pool = ScratchPool::new(4);
        assert_eq!(pool.idle(), 0);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_full_pool_drops_extra_slots() {
        let pool = ScratchPool::new(1);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            let _c = pool.acquire();
        }
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_zero_capacity_never_blocks() {
        let pool = ScratchPool::new(0);
        for _ in 0..3 {
            let mut slot = pool.acquire();
            slot.numerator = BigInt::from(7);
        }
        assert_eq!(pool.idle(), 0);
    }
}
