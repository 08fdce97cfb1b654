#![allow(dead_code)]

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use alloc_hash::CopyFrom;
use alloc_hash::Global;
use alloc_hash::allocator::Allocator;
use alloc_hash::error::AllocError;

#[derive(Debug, Default)]
struct Counts {
    allocations: Cell<usize>,
    frees: Cell<usize>,
    live_bytes: Cell<usize>,
}

/// An allocator that forwards to [`Global`] and records every call.
///
/// Clones share counters and compare equal to each other.
#[derive(Debug, Clone, Default)]
pub struct CountingAllocator {
    counts: Rc<Counts>,
}

impl CountingAllocator {
    pub fn allocations(&self) -> usize {
        self.counts.allocations.get()
    }

    pub fn frees(&self) -> usize {
        self.counts.frees.get()
    }

    pub fn live_bytes(&self) -> usize {
        self.counts.live_bytes.get()
    }
}

impl PartialEq for CountingAllocator {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.counts, &other.counts)
    }
}

unsafe impl Allocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let counts = &self.counts;
        counts.allocations.set(counts.allocations.get() + 1);
        counts.live_bytes.set(counts.live_bytes.get() + layout.size());
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let counts = &self.counts;
        counts.frees.set(counts.frees.get() + 1);
        counts.live_bytes.set(counts.live_bytes.get() - layout.size());
        unsafe { Global.deallocate(ptr, layout) }
    }
}

/// A key or value that counts how often it is copy-constructed and dropped.
#[derive(Debug)]
pub struct Instrumented {
    pub id: u32,
    copies: Rc<Cell<usize>>,
    drops: Rc<Cell<usize>>,
}

impl Instrumented {
    pub fn copies(&self) -> usize {
        self.copies.get()
    }
}

impl PartialEq for Instrumented {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Instrumented {}

impl std::hash::Hash for Instrumented {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Drop for Instrumented {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

unsafe impl CopyFrom<Instrumented> for Instrumented {
    fn copy_from(src: &Instrumented) -> Self {
        src.copies.set(src.copies.get() + 1);
        Instrumented {
            id: src.id,
            copies: src.copies.clone(),
            drops: src.drops.clone(),
        }
    }
}

/// Hands out [`Instrumented`] values sharing one pair of counters.
#[derive(Debug, Clone, Default)]
pub struct Instruments {
    copies: Rc<Cell<usize>>,
    drops: Rc<Cell<usize>>,
}

impl Instruments {
    pub fn make(&self, id: u32) -> Instrumented {
        Instrumented {
            id,
            copies: self.copies.clone(),
            drops: self.drops.clone(),
        }
    }

    pub fn copies(&self) -> usize {
        self.copies.get()
    }

    pub fn drops(&self) -> usize {
        self.drops.get()
    }
}
