//! # Cross-Boundary Buffers
//!
//! A buffer handed across the trust boundary stays allocated in the arena of
//! the domain that produced it. The receiving domain copies it out and then
//! releases it through that same arena. Release consumes the buffer handle,
//! so one allocation is released at most once.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use crate::domain::BoundaryStatus;

/// Side of the trust boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Host side: talks to the chain source.
    Untrusted,
    /// Verifier side.
    Trusted,
}

/// Handle to bytes allocated by the producing domain.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a cross-boundary buffer must be released through its arena"]
pub struct CrossBoundaryBuffer {
    id: u64,
    len: usize,
    origin: Domain,
}

impl CrossBoundaryBuffer {
    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Domain that allocated the payload.
    pub fn origin(&self) -> Domain {
        self.origin
    }
}

/// Allocation arena owned by one domain.
pub struct BufferArena {
    domain: Domain,
    slots: Mutex<HashMap<u64, Box<[u8]>>>,
    next_id: AtomicU64,
    allocated: AtomicU64,
    released: AtomicU64,
}

impl BufferArena {
    /// Empty arena for `domain`.
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            slots: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            allocated: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Domain owning this arena.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Move `bytes` into the arena and hand out a buffer for the other side.
    pub fn allocate(&self, bytes: Vec<u8>) -> CrossBoundaryBuffer {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let len = bytes.len();
        self.slots.lock().insert(id, bytes.into_boxed_slice());
        self.allocated.fetch_add(1, Ordering::Relaxed);
        CrossBoundaryBuffer {
            id,
            len,
            origin: self.domain,
        }
    }

    /// Copy the payload of `buffer` into memory owned by the caller.
    pub fn copy_out(&self, buffer: &CrossBoundaryBuffer) -> Result<Vec<u8>, BoundaryStatus> {
        if buffer.origin != self.domain {
            return Err(BoundaryStatus::InvalidParameter);
        }
        self.slots
            .lock()
            .get(&buffer.id)
            .map(|bytes| bytes.to_vec())
            .ok_or(BoundaryStatus::InvalidParameter)
    }

    /// Release `buffer` on behalf of `releaser`, which must be the domain
    /// that did not allocate it.
    pub fn release(&self, buffer: CrossBoundaryBuffer, releaser: Domain) -> BoundaryStatus {
        if buffer.origin != self.domain || releaser == self.domain {
            warn!(
                "[boundary] Rejected release of buffer {} ({:?} arena, released by {:?})",
                buffer.id, self.domain, releaser
            );
            return BoundaryStatus::InvalidParameter;
        }
        match self.slots.lock().remove(&buffer.id) {
            Some(_) => {
                self.released.fetch_add(1, Ordering::Relaxed);
                BoundaryStatus::Success
            }
            None => BoundaryStatus::InvalidParameter,
        }
    }

    /// Copy then release: the receiving side's half of every buffer hand-off.
    pub fn take(
        &self,
        buffer: CrossBoundaryBuffer,
        releaser: Domain,
    ) -> Result<Vec<u8>, BoundaryStatus> {
        let bytes = self.copy_out(&buffer)?;
        self.release(buffer, releaser).into_result()?;
        Ok(bytes)
    }

    /// Buffers allocated and not yet released.
    pub fn outstanding(&self) -> usize {
        self.slots.lock().len()
    }

    /// Total allocations.
    pub fn allocations(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Total releases.
    pub fn releases(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_byte_identical() {
        let arena = BufferArena::new(Domain::Untrusted);
        let payload = vec![0xde, 0xad, 0xbe, 0xef];
        let buffer = arena.allocate(payload.clone());
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.origin(), Domain::Untrusted);

        let received = arena.take(buffer, Domain::Trusted).unwrap();
        assert_eq!(received, payload);
        assert_eq!(arena.allocations(), 1);
        assert_eq!(arena.releases(), 1);
        assert_eq!(arena.outstanding(), 0);
    }

    #[test]
    fn test_producer_cannot_release_own_buffer() {
        let arena = BufferArena::new(Domain::Untrusted);
        let buffer = arena.allocate(vec![1, 2, 3]);
        assert_eq!(
            arena.release(buffer, Domain::Untrusted),
            BoundaryStatus::InvalidParameter
        );
        assert_eq!(arena.releases(), 0);
        assert_eq!(arena.outstanding(), 1);
    }

    #[test]
    fn test_foreign_buffer_rejected() {
        let host = BufferArena::new(Domain::Untrusted);
        let enclave = BufferArena::new(Domain::Trusted);
        let buffer = host.allocate(vec![7]);
        assert_eq!(enclave.copy_out(&buffer), Err(BoundaryStatus::InvalidParameter));
        assert_eq!(host.take(buffer, Domain::Trusted).unwrap(), vec![7]);
    }

    #[test]
    fn test_empty_payload() {
        let arena = BufferArena::new(Domain::Trusted);
        let buffer = arena.allocate(Vec::new());
        assert!(buffer.is_empty());
        assert!(arena.take(buffer, Domain::Untrusted).unwrap().is_empty());
    }

    #[test]
    fn test_each_allocation_released_once() {
        let arena = BufferArena::new(Domain::Untrusted);
        let buffers: Vec<_> = (0..10u8).map(|i| arena.allocate(vec![i; 3])).collect();
        assert_eq!(arena.outstanding(), 10);
        for (i, buffer) in buffers.into_iter().enumerate() {
            assert_eq!(arena.take(buffer, Domain::Trusted).unwrap(), vec![i as u8; 3]);
        }
        assert_eq!(arena.allocations(), arena.releases());
        assert_eq!(arena.outstanding(), 0);
    }
}
