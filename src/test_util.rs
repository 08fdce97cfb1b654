//! Instrumented allocator and element types shared by the unit tests.

use alloc::rc::Rc;
use core::alloc::Layout;
use core::cell::Cell;
use core::hash::Hasher;
use core::ptr::NonNull;

use rand::TryRngCore;
use rand::rngs::OsRng;
use siphasher::sip::SipHasher;

use crate::allocator::Allocator;
use crate::allocator::Global;
use crate::copy_from::CopyFrom;
use crate::error::AllocError;

#[derive(Debug, Default)]
struct Counters {
    allocations: Cell<usize>,
    frees: Cell<usize>,
    fail_next: Cell<bool>,
}

/// Forwards to [`Global`] and counts calls. Clones share their counters and
/// compare equal; independently constructed values do not.
#[derive(Debug, Clone, Default)]
pub(crate) struct CountingAllocator {
    counters: Rc<Counters>,
}

impl CountingAllocator {
    pub(crate) fn allocations(&self) -> usize {
        self.counters.allocations.get()
    }

    pub(crate) fn frees(&self) -> usize {
        self.counters.frees.get()
    }

    pub(crate) fn fail_next(&self) {
        self.counters.fail_next.set(true);
    }
}

impl PartialEq for CountingAllocator {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.counters, &other.counters)
    }
}

// SAFETY: Forwards to `Global`.
unsafe impl Allocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if self.counters.fail_next.replace(false) {
            return Err(AllocError);
        }
        self.counters
            .allocations
            .set(self.counters.allocations.get() + 1);
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.counters.frees.set(self.counters.frees.get() + 1);
        // SAFETY: Every block handed out came from `Global`.
        unsafe { Global.deallocate(ptr, layout) }
    }
}

/// A value whose copies and drops are counted.
#[derive(Debug)]
pub(crate) struct Tracked {
    pub(crate) value: u64,
    copies: Rc<Cell<usize>>,
    drops: Rc<Cell<usize>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TrackedCounters {
    copies: Rc<Cell<usize>>,
    drops: Rc<Cell<usize>>,
}

impl TrackedCounters {
    pub(crate) fn make(&self, value: u64) -> Tracked {
        Tracked {
            value,
            copies: self.copies.clone(),
            drops: self.drops.clone(),
        }
    }

    pub(crate) fn copies(&self) -> usize {
        self.copies.get()
    }

    pub(crate) fn drops(&self) -> usize {
        self.drops.get()
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

// SAFETY: Leaves `BITWISE` false.
unsafe impl CopyFrom<Tracked> for Tracked {
    fn copy_from(src: &Tracked) -> Self {
        src.copies.set(src.copies.get() + 1);
        Tracked {
            value: src.value,
            copies: src.copies.clone(),
            drops: src.drops.clone(),
        }
    }
}

pub(crate) struct HashState {
    k0: u64,
    k1: u64,
}

impl HashState {
    pub(crate) fn random() -> Self {
        let mut rng = OsRng;
        Self {
            k0: rng.try_next_u64().unwrap(),
            k1: rng.try_next_u64().unwrap(),
        }
    }

    pub(crate) fn hash_u64(&self, key: u64) -> u64 {
        let mut h = SipHasher::new_with_keys(self.k0, self.k1);
        h.write_u64(key);
        h.finish()
    }

    pub(crate) fn hash_str(&self, key: &str) -> u64 {
        let mut h = SipHasher::new_with_keys(self.k0, self.k1);
        h.write(key.as_bytes());
        h.finish()
    }
}
