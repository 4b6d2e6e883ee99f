//! Lock-free fixed-capacity object pool with ABA-safe free list.
//!
//! Adapted from the execution pipeline's pool allocator: slots are indexed,
//! not pointer-linked, and the free-list head packs a generation counter
//! into the high bits of a `usize` so a CAS that observes the same index
//! twice (the classic ABA failure) still fails if another thread recycled
//! that slot in between.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const INDEX_BITS: u32 = 32;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;
const NIL: usize = INDEX_MASK;

#[inline]
fn pack(generation: usize, index: usize) -> usize {
    (generation << INDEX_BITS) | (index & INDEX_MASK)
}

#[inline]
fn unpack(tagged: usize) -> (usize, usize) {
    (tagged >> INDEX_BITS, tagged & INDEX_MASK)
}

struct Slot<T> {
    value: UnsafeCell<MaybeUninit<T>>,
    next_free: AtomicUsize,
}

struct PoolInner<T> {
    slots: Box<[Slot<T>]>,
    free_head: AtomicUsize,
    in_use: AtomicUsize,
}

// SAFETY: slot ownership is established by the CAS free-list protocol: a
// slot is reachable from at most one thread between acquire and release.
unsafe impl<T: Send> Sync for PoolInner<T> {}

/// Fixed-capacity lock-free pool of pre-allocated `T` slots.
pub struct ObjectPool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for ObjectPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ObjectPool<T> {
    /// Build a pool with `capacity` pre-allocated, uninitialized slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "pool capacity must be nonzero");
        assert!(capacity < NIL, "pool capacity exceeds index space");
        let slots: Box<[Slot<T>]> = (0..capacity)
            .map(|i| Slot {
                value: UnsafeCell::new(MaybeUninit::uninit()),
                next_free: AtomicUsize::new(if i + 1 == capacity { NIL } else { i + 1 }),
            })
            .collect();
        Self {
            inner: Arc::new(PoolInner {
                slots,
                free_head: AtomicUsize::new(pack(0, 0)),
                in_use: AtomicUsize::new(0),
            }),
        }
    }

    /// Total slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.slots.len()
    }

    /// Slots currently checked out.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::Relaxed)
    }

    /// Acquire a slot, initialize it with `init`, and return an RAII handle
    /// that returns the slot to the pool on drop. `None` if exhausted.
    pub fn acquire(&self, init: T) -> Option<PoolRef<T>> {
        loop {
            let tagged = self.inner.free_head.load(Ordering::Acquire);
            let (generation, index) = unpack(tagged);
            if index == NIL {
                return None;
            }
            let slot = &self.inner.slots[index];
            let next = slot.next_free.load(Ordering::Acquire);
            let new_tagged = pack(generation.wrapping_add(1), next);
            if self
                .inner
                .free_head
                .compare_exchange_weak(
                    tagged,
                    new_tagged,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                unsafe { (*slot.value.get()).write(init) };
                self.inner.in_use.fetch_add(1, Ordering::Relaxed);
                return Some(PoolRef {
                    pool: self.clone(),
                    index,
                });
            }
        }
    }

    fn release(&self, index: usize) {
        let slot = &self.inner.slots[index];
        unsafe { std::ptr::drop_in_place((*slot.value.get()).as_mut_ptr()) };
        loop {
            let tagged = self.inner.free_head.load(Ordering::Acquire);
            let (generation, head_index) = unpack(tagged);
            slot.next_free.store(head_index, Ordering::Release);
            let new_tagged = pack(generation.wrapping_add(1), index);
            if self
                .inner
                .free_head
                .compare_exchange_weak(
                    tagged,
                    new_tagged,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                self.inner.in_use.fetch_sub(1, Ordering::Relaxed);
                return;
            }
        }
    }
}

/// RAII handle to a pool-owned `T`. Returns its slot to the pool on drop.
pub struct PoolRef<T> {
    pool: ObjectPool<T>,
    index: usize,
}

impl<T> PoolRef<T> {
    /// The slot index this handle occupies, stable for the handle's
    /// lifetime. Callers that need their own direct-indexed table keyed by
    /// the same identity the pool already assigns can reuse this instead
    /// of minting a second ID scheme.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl<T> std::ops::Deref for PoolRef<T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { (*self.pool.inner.slots[self.index].value.get()).assume_init_ref() }
    }
}

impl<T> std::ops::DerefMut for PoolRef<T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { (*self.pool.inner.slots[self.index].value.get()).assume_init_mut() }
    }
}

impl<T> Drop for PoolRef<T> {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_round_trips() {
        let pool: ObjectPool<u64> = ObjectPool::new(4);
        let handle = pool.acquire(42).unwrap();
        assert_eq!(*handle, 42);
        assert_eq!(pool.in_use(), 1);
        drop(handle);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn exhausts_then_recovers_after_release() {
        let pool: ObjectPool<u64> = ObjectPool::new(2);
        let a = pool.acquire(1).unwrap();
        let b = pool.acquire(2).unwrap();
        assert!(pool.acquire(3).is_none());
        drop(a);
        let c = pool.acquire(3).unwrap();
        assert_eq!(*c, 3);
        drop(b);
        drop(c);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn mutation_through_deref_mut_is_visible() {
        let pool: ObjectPool<Vec<u8>> = ObjectPool::new(1);
        let mut handle = pool.acquire(Vec::new()).unwrap();
        handle.push(1);
        handle.push(2);
        assert_eq!(*handle, vec![1, 2]);
    }

    #[test]
    fn concurrent_acquire_release_never_double_hands_out_a_slot() {
        use std::sync::atomic::AtomicUsize as Counter;
        use std::thread;

        let pool: ObjectPool<Counter> = ObjectPool::new(16);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    if let Some(h) = pool.acquire(Counter::new(0)) {
                        h.fetch_add(1, Ordering::Relaxed);
                        drop(h);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(pool.in_use(), 0);
    }
}
