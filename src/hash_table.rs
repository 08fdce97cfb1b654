//! The raw table underneath [`HashMap`] and [`HashSet`].
//!
//! [`HashMap`]: crate::HashMap
//! [`HashSet`]: crate::HashSet

use alloc::alloc::handle_alloc_error;
use core::alloc::Layout;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;
use core::mem::ManuallyDrop;
use core::ptr;
use core::ptr::NonNull;

use crate::allocator::Allocator;
use crate::allocator::Global;
use crate::capacity;
use crate::capacity::capacity_overflow;
use crate::copy_from::CopyFrom;
use crate::copy_from::bitwise_relocatable;
use crate::error::TryReserveError;

/// Index slot that has never held an entry. All bits set, so a fresh index can
/// be initialized with `write_bytes(0xFF)`.
const EMPTY: usize = usize::MAX;

/// Index slot whose entry was removed. Probes continue past it.
const TOMBSTONE: usize = usize::MAX - 1;

/// One key-value pair stored in a table.
///
/// The layout is fixed (`repr(C)`, key then value) so that buckets holding
/// layout-identical key and value types can be block-copied into each other.
#[repr(C)]
pub struct Bucket<K, V> {
    key: K,
    value: V,
}

impl<K, V> Bucket<K, V> {
    /// Returns the key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the value mutably. Keys are never handed out mutably.
    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    #[inline]
    pub(crate) fn pair(&self) -> (&K, &V) {
        (&self.key, &self.value)
    }

    #[inline]
    pub(crate) fn pair_mut(&mut self) -> (&K, &mut V) {
        (&self.key, &mut self.value)
    }

    #[inline]
    pub(crate) fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: Debug, V: Debug> Debug for Bucket<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Bucket")
            .field(&self.key)
            .field(&self.value)
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
struct DataLayout {
    layout: Layout,
    hashes_offset: usize,
    buckets_offset: usize,
}

impl DataLayout {
    fn empty() -> Self {
        DataLayout {
            layout: Layout::new::<()>(),
            hashes_offset: 0,
            buckets_offset: 0,
        }
    }

    fn new<K, V>(max_count: usize) -> Result<Self, TryReserveError> {
        let overflow = |_| TryReserveError::CapacityOverflow;

        let slots_layout =
            Layout::array::<usize>(capacity::slots_for(max_count)).map_err(overflow)?;
        let hashes_layout = Layout::array::<u64>(max_count).map_err(overflow)?;
        let buckets_layout = Layout::array::<Bucket<K, V>>(max_count).map_err(overflow)?;

        let (layout, hashes_offset) = slots_layout.extend(hashes_layout).map_err(overflow)?;
        let (layout, buckets_offset) = layout.extend(buckets_layout).map_err(overflow)?;

        Ok(DataLayout {
            layout,
            hashes_offset,
            buckets_offset,
        })
    }
}

/// Turns a reservation error into the fail-fast behavior of the infallible
/// API.
#[inline]
fn handle_reserve(result: Result<(), TryReserveError>) {
    match result {
        Ok(()) => {}
        Err(TryReserveError::CapacityOverflow) => capacity_overflow(),
        Err(TryReserveError::AllocError { layout }) => handle_alloc_error(layout),
    }
}

/// Debug statistics for hash table analysis.
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Number of buckets allocated (`max_count`)
    pub capacity: usize,
    /// Number of probe slots in the index
    pub index_slots: usize,
    /// Number of index slots holding a tombstone
    pub tombstones: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Index utilization ((populated + tombstones) / index_slots)
    pub index_utilization: f64,
    /// Total memory in bytes used by the table
    pub total_bytes: usize,
    /// Estimated wasted memory in bytes
    pub wasted_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Index Usage: {}+{} tombstones/{} ({:.2}% utilization)",
            self.populated,
            self.tombstones,
            self.index_slots,
            self.index_utilization * 100.0
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// Histogram of probe distances, bin `i` counting entries that sit `i` slots
/// past their home slot.
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    bins: alloc::vec::Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Entry counts per probe distance.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// Longest probe distance of any entry, or `None` for an empty table.
    pub fn max_probe(&self) -> Option<usize> {
        self.bins.iter().rposition(|&count| count != 0)
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = *self.bins.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "probe histogram ({} entries):",
            self.bins.iter().sum::<usize>()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if units % 8 > 0 {
                bar.push(partial[units % 8 - 1]);
            }
            bar
        };

        for (distance, &count) in self.bins.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }
}

/// An open-addressing hash table with an owned allocator.
///
/// `HashTable<K, V, A>` stores key-value [`Bucket`]s densely and keeps a
/// separate linear-probing index over them. The table never hashes or compares
/// keys itself: every operation takes the key's hash and an equality predicate
/// from the caller. [`HashMap`] supplies both from its hash and equality
/// functors.
///
/// ## Storage
///
/// A table sized for `max_count` elements performs a single allocation holding
/// `2 * max_count` index slots, `max_count` cached hashes and `max_count`
/// buckets. Nothing is allocated until the first insertion or reservation.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hasher;
/// #
/// # use alloc_hash::hash_table::Entry;
/// # use alloc_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     hasher.write_u64(id);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::new();
/// let hash = hash_id(123);
///
/// match table.entry(hash, |&id: &u64| id == 123) {
///     Entry::Vacant(entry) => {
///         entry.insert(123, "Alice".to_string());
///     }
///     Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
/// assert_eq!(table.len(), 1);
/// ```
///
/// [`HashMap`]: crate::HashMap
pub struct HashTable<K, V, A: Allocator = Global> {
    layout: DataLayout,
    alloc: NonNull<u8>,

    max_count: usize,
    populated: usize,
    tombstones: usize,

    allocator: A,
    _phantom: PhantomData<Bucket<K, V>>,
}

// SAFETY: The table owns its buckets like a `Vec` would; shared access only
// reads.
unsafe impl<K: Send, V: Send, A: Allocator + Send> Send for HashTable<K, V, A> {}
// SAFETY: As above.
unsafe impl<K: Sync, V: Sync, A: Allocator + Sync> Sync for HashTable<K, V, A> {}

impl<K, V, A: Allocator> Debug for HashTable<K, V, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::vec::Vec;

        if self.max_count == 0 {
            return f
                .debug_struct("HashTable")
                .field("index", &"unallocated")
                .field("populated", &self.populated)
                .field("max_count", &self.max_count)
                .finish();
        }

        let index = self
            .index()
            .chunks(16)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|&slot| match slot {
                        EMPTY => String::from("..."),
                        TOMBSTONE => String::from("xxx"),
                        index => format!("{index:03}"),
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect::<Vec<_>>();

        f.debug_struct("HashTable")
            .field("index", &index)
            .field("populated", &self.populated)
            .field("tombstones", &self.tombstones)
            .field("max_count", &self.max_count)
            .finish()
    }
}

impl<K, V, A> Clone for HashTable<K, V, A>
where
    K: CopyFrom<K>,
    V: CopyFrom<V>,
    A: Allocator + Clone,
{
    fn clone(&self) -> Self {
        // Same key type, same hashes.
        Self::copy_impl(self, 0, self.allocator.clone(), |_, hash| hash)
    }
}

impl<K, V, A: Allocator> Drop for HashTable<K, V, A> {
    fn drop(&mut self) {
        // SAFETY: Buckets `0..populated` are initialized. The storage was
        // allocated by `self.allocator` with `self.layout` when non-empty.
        unsafe {
            if mem::needs_drop::<Bucket<K, V>>() && self.populated > 0 {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                    self.buckets_ptr(),
                    self.populated,
                ));
            }

            if self.layout.layout.size() != 0 {
                self.allocator.deallocate(self.alloc, self.layout.layout);
            }
        }
    }
}

impl<K, V> HashTable<K, V, Global> {
    /// Creates an empty table backed by the global allocator.
    ///
    /// Does not allocate.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates a table able to hold `n` elements without reallocating.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u32, String> = HashTable::with_capacity(100);
    /// assert!(table.max_count() >= 100);
    /// ```
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_in(n, Global)
    }
}

impl<K, V> Default for HashTable<K, V, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A: Allocator> HashTable<K, V, A> {
    /// Creates an empty table that will allocate from `allocator`.
    ///
    /// Does not allocate.
    pub fn new_in(allocator: A) -> Self {
        Self {
            layout: DataLayout::empty(),
            alloc: NonNull::dangling(),
            max_count: 0,
            populated: 0,
            tombstones: 0,
            allocator,
            _phantom: PhantomData,
        }
    }

    /// Creates a table able to hold `n` elements, allocating from
    /// `allocator`.
    pub fn with_capacity_in(n: usize, allocator: A) -> Self {
        let mut table = Self::new_in(allocator);
        table.reserve(n);
        table
    }

    /// Returns the allocator backing this table.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of allocated buckets.
    ///
    /// This is how many elements the table holds before it reallocates. It is
    /// zero exactly when the table owns no storage.
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Returns `max_count() - len()`.
    pub fn slack(&self) -> usize {
        self.max_count - self.populated
    }

    #[inline]
    fn slot_count(&self) -> usize {
        capacity::slots_for(self.max_count)
    }

    #[inline]
    fn slots_ptr(&self) -> *mut usize {
        if self.max_count == 0 {
            return NonNull::dangling().as_ptr();
        }
        self.alloc.as_ptr().cast()
    }

    #[inline]
    fn hashes_ptr(&self) -> *mut u64 {
        if self.max_count == 0 {
            return NonNull::dangling().as_ptr();
        }
        // SAFETY: The offset lies within the live allocation.
        unsafe { self.alloc.as_ptr().add(self.layout.hashes_offset).cast() }
    }

    #[inline]
    fn buckets_ptr(&self) -> *mut Bucket<K, V> {
        if self.max_count == 0 {
            return NonNull::dangling().as_ptr();
        }
        // SAFETY: The offset lies within the live allocation.
        unsafe { self.alloc.as_ptr().add(self.layout.buckets_offset).cast() }
    }

    #[inline]
    fn index(&self) -> &[usize] {
        // SAFETY: The index is fully initialized whenever storage exists, and
        // `slot_count` is zero otherwise.
        unsafe { core::slice::from_raw_parts(self.slots_ptr(), self.slot_count()) }
    }

    /// Returns the occupied buckets as a dense slice, in unspecified order.
    pub fn as_slice(&self) -> &[Bucket<K, V>] {
        // SAFETY: Buckets `0..populated` are initialized.
        unsafe { core::slice::from_raw_parts(self.buckets_ptr(), self.populated) }
    }

    fn as_mut_slice(&mut self) -> &mut [Bucket<K, V>] {
        // SAFETY: Buckets `0..populated` are initialized.
        unsafe { core::slice::from_raw_parts_mut(self.buckets_ptr(), self.populated) }
    }

    /// Returns `(slot, index)` of the entry with `hash` accepted by `eq`.
    #[inline]
    fn find_slot(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<(usize, usize)> {
        if self.populated == 0 {
            return None;
        }

        let mask = self.slot_count() - 1;
        let slots = self.slots_ptr();
        let hashes = self.hashes_ptr();
        let buckets = self.buckets_ptr();
        let mut pos = hash as usize & mask;

        // SAFETY: `pos` is masked into the index. Slots other than EMPTY and
        // TOMBSTONE name initialized buckets. The index always holds at least
        // one EMPTY slot, so the loop terminates.
        unsafe {
            loop {
                let index = *slots.add(pos);
                if index == EMPTY {
                    return None;
                }
                if index != TOMBSTONE
                    && *hashes.add(index) == hash
                    && eq(&(*buckets.add(index)).key)
                {
                    return Some((pos, index));
                }
                pos = (pos + 1) & mask;
            }
        }
    }

    /// First EMPTY or TOMBSTONE slot on the probe sequence of `hash`.
    ///
    /// # Safety
    ///
    /// Storage must be allocated.
    #[inline]
    unsafe fn find_insert_slot(&self, hash: u64) -> usize {
        let mask = self.slot_count() - 1;
        let slots = self.slots_ptr();
        let mut pos = hash as usize & mask;
        // SAFETY: `pos` is masked into the index, which always has a free slot.
        unsafe {
            while *slots.add(pos) < TOMBSTONE {
                pos = (pos + 1) & mask;
            }
        }
        pos
    }

    /// Returns the position of the entry with `hash` accepted by `eq` within
    /// [`as_slice`].
    ///
    /// [`as_slice`]: HashTable::as_slice
    pub fn find_index(&self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<usize> {
        self.find_slot(hash, eq).map(|(_, index)| index)
    }

    /// Finds the bucket with `hash` whose key satisfies `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(7, |&k: &u32| k == 1).or_insert(1, "one");
    ///
    /// let bucket = table.find(7, |&k| k == 1).unwrap();
    /// assert_eq!((bucket.key(), bucket.value()), (&1, &"one"));
    /// assert!(table.find(7, |&k| k == 2).is_none());
    /// ```
    pub fn find(&self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<&Bucket<K, V>> {
        let (_, index) = self.find_slot(hash, eq)?;
        // SAFETY: `find_slot` only returns initialized indices.
        unsafe { Some(&*self.buckets_ptr().add(index)) }
    }

    /// Finds the bucket with `hash` whose key satisfies `eq`, mutably.
    pub fn find_mut(&mut self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<&mut Bucket<K, V>> {
        let (_, index) = self.find_slot(hash, eq)?;
        // SAFETY: `find_slot` only returns initialized indices.
        unsafe { Some(&mut *self.buckets_ptr().add(index)) }
    }

    /// Gets the entry for `hash`/`eq` for in-place manipulation.
    pub fn entry(&mut self, hash: u64, eq: impl FnMut(&K) -> bool) -> Entry<'_, K, V, A> {
        match self.find_slot(hash, eq) {
            Some((slot, index)) => Entry::Occupied(OccupiedEntry {
                table: self,
                slot,
                index,
            }),
            None => Entry::Vacant(VacantEntry { table: self, hash }),
        }
    }

    /// Inserts a key that is known not to be present and returns its position.
    ///
    /// Grows the table first when every bucket is in use.
    pub fn insert_unique(&mut self, hash: u64, key: K, value: V) -> usize {
        self.reserve_for_insert();

        let index = self.populated;
        // SAFETY: `reserve_for_insert` guarantees a free bucket at `index` and a
        // free slot on the probe sequence.
        unsafe {
            self.hashes_ptr().add(index).write(hash);
            self.buckets_ptr().add(index).write(Bucket { key, value });

            let slot = self.find_insert_slot(hash);
            let slot_ptr = self.slots_ptr().add(slot);
            if *slot_ptr == TOMBSTONE {
                self.tombstones -= 1;
            }
            *slot_ptr = index;
        }
        self.populated += 1;
        index
    }

    fn reserve_for_insert(&mut self) {
        if self.populated == self.max_count {
            let requested = match self.populated.checked_add(1) {
                Some(requested) => requested,
                None => capacity_overflow(),
            };
            self.reserve(requested);
        } else if self.populated + self.tombstones >= capacity::used_slot_limit(self.slot_count()) {
            self.rebuild_index();
        }
    }

    /// Removes the entry with `hash` whose key satisfies `eq`.
    ///
    /// The removed entry's index slot becomes a tombstone and the last bucket
    /// moves into its place, so positions from [`find_index`] are invalidated.
    ///
    /// [`find_index`]: HashTable::find_index
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<(K, V)> {
        let (slot, index) = self.find_slot(hash, eq)?;
        // SAFETY: `find_slot` returned a live slot/index pair.
        Some(unsafe { self.remove_at(slot, index) }.into_pair())
    }

    /// # Safety
    ///
    /// `slot` must hold `index`, and `index` must be a live bucket.
    unsafe fn remove_at(&mut self, slot: usize, index: usize) -> Bucket<K, V> {
        let mask = self.slot_count() - 1;
        let slots = self.slots_ptr();
        let hashes = self.hashes_ptr();
        let buckets = self.buckets_ptr();
        let last = self.populated - 1;

        // SAFETY: Caller guarantees `slot`/`index` are live. `last` is the final
        // initialized bucket, and it is present in the index, so the repointing
        // probe terminates.
        unsafe {
            *slots.add(slot) = TOMBSTONE;
            self.tombstones += 1;

            let removed = buckets.add(index).read();
            if index != last {
                let moved_hash = *hashes.add(last);
                ptr::copy_nonoverlapping(buckets.add(last), buckets.add(index), 1);
                *hashes.add(index) = moved_hash;

                let mut pos = moved_hash as usize & mask;
                while *slots.add(pos) != last {
                    pos = (pos + 1) & mask;
                }
                *slots.add(pos) = index;
            }

            self.populated = last;
            removed
        }
    }

    /// Makes room for at least `n` elements in total.
    ///
    /// A request the table already satisfies (`n <= max_count()`) does
    /// nothing. Otherwise the table performs exactly one allocation for the
    /// new storage, moves its buckets over, and frees the old storage if it
    /// had any. `len()` is unchanged.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow; aborts through [`handle_alloc_error`] if
    /// the allocator fails.
    pub fn reserve(&mut self, n: usize) {
        if capacity::satisfies(self.max_count, n) {
            return;
        }
        handle_reserve(self.try_reserve(n));
    }

    /// Fallible version of [`reserve`](HashTable::reserve).
    pub fn try_reserve(&mut self, n: usize) -> Result<(), TryReserveError> {
        if capacity::satisfies(self.max_count, n) {
            return Ok(());
        }
        let max_count =
            capacity::checked_capacity_for(n).ok_or(TryReserveError::CapacityOverflow)?;
        self.resize(max_count)
    }

    /// Shrinks the storage to the smallest size that holds the current
    /// elements, releasing it entirely when the table is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(100);
    /// table.insert_unique(1, 1u32, ());
    /// table.shrink_to_fit();
    /// assert_eq!(table.max_count(), 4);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        let max_count = capacity::capacity_for(self.populated);
        if max_count >= self.max_count {
            return;
        }

        if max_count == 0 {
            crate::trace!("releasing {} empty buckets", self.max_count);
            let layout = mem::replace(&mut self.layout, DataLayout::empty());
            let alloc = mem::replace(&mut self.alloc, NonNull::dangling());
            self.max_count = 0;
            self.tombstones = 0;
            // SAFETY: The storage was allocated by `self.allocator` with
            // `layout`, and holds no live buckets.
            unsafe { self.allocator.deallocate(alloc, layout.layout) };
            return;
        }

        handle_reserve(self.resize(max_count));
    }

    /// Allocates storage for `max_count` buckets with an all-EMPTY index.
    fn allocate_storage(
        allocator: &A,
        max_count: usize,
    ) -> Result<(DataLayout, NonNull<u8>), TryReserveError> {
        debug_assert!(max_count > 0);
        let layout = DataLayout::new::<K, V>(max_count)?;
        let alloc = allocator
            .allocate(layout.layout)
            .map_err(|_| TryReserveError::AllocError {
                layout: layout.layout,
            })?;

        // SAFETY: The index occupies the first `slots * size_of::<usize>()`
        // bytes of the fresh block.
        unsafe {
            ptr::write_bytes(
                alloc.as_ptr(),
                0xFF,
                capacity::slots_for(max_count) * mem::size_of::<usize>(),
            );
        }

        Ok((layout, alloc))
    }

    /// Moves every bucket into freshly allocated storage for `max_count`
    /// buckets and frees the old storage.
    fn resize(&mut self, max_count: usize) -> Result<(), TryReserveError> {
        debug_assert!(max_count >= self.populated);
        let (layout, alloc) = Self::allocate_storage(&self.allocator, max_count)?;

        crate::trace!(
            "resizing table from {} to {} buckets ({} live, {} bytes)",
            self.max_count,
            max_count,
            self.populated,
            layout.layout.size()
        );

        let old_hashes = self.hashes_ptr();
        let old_buckets = self.buckets_ptr();
        let old_layout = mem::replace(&mut self.layout, layout);
        let old_alloc = mem::replace(&mut self.alloc, alloc);
        self.max_count = max_count;

        // SAFETY: Both regions hold at least `populated` entries and belong to
        // distinct allocations. Moving a value is a bitwise copy, so the old
        // copies are simply forgotten when the old block is freed.
        unsafe {
            if self.populated > 0 {
                ptr::copy_nonoverlapping(old_hashes, self.hashes_ptr(), self.populated);
                ptr::copy_nonoverlapping(old_buckets, self.buckets_ptr(), self.populated);
            }
            self.rebuild_index();

            if old_layout.layout.size() != 0 {
                self.allocator.deallocate(old_alloc, old_layout.layout);
            }
        }

        Ok(())
    }

    /// Re-inserts every bucket into a cleared index, dropping all tombstones.
    ///
    /// Works in place, without allocating.
    fn rebuild_index(&mut self) {
        if self.max_count == 0 {
            return;
        }

        if self.tombstones > 0 {
            crate::trace!(
                "rebuilding index of {} slots ({} tombstones)",
                self.slot_count(),
                self.tombstones
            );
        }

        // SAFETY: Storage is allocated; hashes `0..populated` are initialized.
        unsafe {
            ptr::write_bytes(self.slots_ptr(), 0xFF, self.slot_count());
            for index in 0..self.populated {
                let slot = self.find_insert_slot(*self.hashes_ptr().add(index));
                *self.slots_ptr().add(slot) = index;
            }
        }
        self.tombstones = 0;
    }

    /// Removes all elements, keeping the allocated storage.
    pub fn clear(&mut self) {
        let len = mem::replace(&mut self.populated, 0);
        if self.max_count == 0 {
            return;
        }

        // SAFETY: Buckets `0..len` were initialized; `populated` is already
        // zero so a panicking destructor leaks rather than double-drops.
        unsafe {
            ptr::write_bytes(self.slots_ptr(), 0xFF, self.slot_count());
            self.tombstones = 0;
            if mem::needs_drop::<Bucket<K, V>>() {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buckets_ptr(), len));
            }
        }
    }

    /// Returns an iterator over the buckets in unspecified order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.as_slice().iter(),
        }
    }

    /// Returns an iterator over `(&K, &mut V)` in unspecified order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.as_mut_slice().iter_mut(),
        }
    }

    /// Removes and yields every element. The storage is kept.
    ///
    /// Elements not consumed by the time the iterator is dropped are dropped
    /// with it.
    pub fn drain(&mut self) -> Drain<'_, K, V, A> {
        let len = mem::replace(&mut self.populated, 0);
        if self.max_count != 0 {
            // SAFETY: Storage is allocated.
            unsafe { ptr::write_bytes(self.slots_ptr(), 0xFF, self.slot_count()) };
        }
        self.tombstones = 0;
        Drain {
            table: self,
            index: 0,
            len,
        }
    }

    /// Moves the table into `allocator`.
    ///
    /// If `allocator` compares equal to the current allocator the existing
    /// storage is adopted as is: nothing is allocated, copied or freed.
    /// Otherwise the buckets move into storage of the same size allocated from
    /// `allocator`, and the old storage is returned to the old allocator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::allocator::Global;
    /// # use alloc_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new_in(Global);
    /// table.insert_unique(3, 3u8, 'c');
    ///
    /// let moved = table.relocate_in(&Global);
    /// assert_eq!(moved.find(3, |&k| k == 3).map(|b| *b.value()), Some('c'));
    /// ```
    pub fn relocate_in<A2>(self, allocator: A2) -> HashTable<K, V, A2>
    where
        A: PartialEq<A2>,
        A2: Allocator,
    {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the allocator is moved out once.
        let old_allocator = unsafe { ptr::read(&this.allocator) };

        if old_allocator == allocator {
            crate::trace!("adopting storage of {} buckets", this.max_count);
            return HashTable {
                layout: this.layout,
                alloc: this.alloc,
                max_count: this.max_count,
                populated: this.populated,
                tombstones: this.tombstones,
                allocator,
                _phantom: PhantomData,
            };
        }

        let mut table = HashTable::new_in(allocator);
        if this.max_count == 0 {
            return table;
        }

        crate::trace!(
            "relocating {} buckets into a distinct allocator",
            this.max_count
        );
        handle_reserve(table.resize(this.max_count));

        // SAFETY: The new storage holds `max_count >= populated` buckets. The
        // buckets are moved bitwise and the old block is freed without
        // dropping them.
        unsafe {
            if this.populated > 0 {
                ptr::copy_nonoverlapping(this.hashes_ptr(), table.hashes_ptr(), this.populated);
                ptr::copy_nonoverlapping(this.buckets_ptr(), table.buckets_ptr(), this.populated);
            }
            table.populated = this.populated;
            table.rebuild_index();

            old_allocator.deallocate(this.alloc, this.layout.layout);
        }

        table
    }

    /// Builds a table holding a copy of every element of `source`, with room
    /// for `extra` more, allocated from `allocator`.
    ///
    /// Keys and values are converted through [`CopyFrom`]. When both
    /// conversions are bitwise the occupied buckets are duplicated with one
    /// block copy; otherwise each bucket is copy-constructed. `hash` computes
    /// the hash of each destination key, and the index is rebuilt from those
    /// hashes.
    ///
    /// An empty `source` with `extra == 0` yields an unallocated table. Any
    /// other input performs exactly one allocation. `source` is never
    /// modified.
    pub fn copy_from_table<K2, V2, A2>(
        source: &HashTable<K2, V2, A2>,
        extra: usize,
        allocator: A,
        mut hash: impl FnMut(&K) -> u64,
    ) -> Self
    where
        K: CopyFrom<K2>,
        V: CopyFrom<V2>,
        A2: Allocator,
    {
        Self::copy_impl(source, extra, allocator, |key, _| hash(key))
    }

    fn copy_impl<K2, V2, A2>(
        source: &HashTable<K2, V2, A2>,
        extra: usize,
        allocator: A,
        mut rehash: impl FnMut(&K, u64) -> u64,
    ) -> Self
    where
        K: CopyFrom<K2>,
        V: CopyFrom<V2>,
        A2: Allocator,
    {
        let requested = match source.populated.checked_add(extra) {
            Some(requested) => requested,
            None => capacity_overflow(),
        };
        let max_count = capacity::capacity_for(requested);

        let mut table = Self::new_in(allocator);
        if max_count == 0 {
            return table;
        }
        handle_reserve(table.resize(max_count));

        let len = source.populated;
        let src = source.buckets_ptr();
        let dst = table.buckets_ptr();

        // SAFETY: `dst` has room for `max_count >= len` buckets. On the bitwise
        // path `Relocatable` has checked that `Bucket<K2, V2>` and
        // `Bucket<K, V>` have identical layouts and no drop glue. On the
        // per-element path `populated` trails construction, so a panicking
        // `copy_from` drops exactly the buckets built so far.
        unsafe {
            if const { bitwise_relocatable::<K2, V2, K, V>() } {
                crate::trace!("block-copying {} buckets", len);
                if len > 0 {
                    ptr::copy_nonoverlapping(src.cast::<Bucket<K, V>>(), dst, len);
                }
                table.populated = len;
            } else {
                crate::trace!("copy-constructing {} buckets", len);
                for index in 0..len {
                    let bucket = &*src.add(index);
                    dst.add(index).write(Bucket {
                        key: K::copy_from(&bucket.key),
                        value: V::copy_from(&bucket.value),
                    });
                    table.populated = index + 1;
                }
            }

            let src_hashes = source.hashes_ptr();
            let dst_hashes = table.hashes_ptr();
            for index in 0..len {
                let hash = rehash(&(*dst.add(index)).key, *src_hashes.add(index));
                dst_hashes.add(index).write(hash);
            }
        }

        table.rebuild_index();
        table
    }

    /// Computes a histogram of probe distances for the current table state.
    ///
    /// Available with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut bins = alloc::vec::Vec::new();
        if self.populated == 0 {
            return ProbeHistogram { bins };
        }

        let mask = self.slot_count() - 1;
        for (slot, &index) in self.index().iter().enumerate() {
            if index >= TOMBSTONE {
                continue;
            }
            // SAFETY: Live slots name initialized hashes.
            let home = unsafe { *self.hashes_ptr().add(index) } as usize & mask;
            let distance = slot.wrapping_sub(home) & mask;
            if bins.len() <= distance {
                bins.resize(distance + 1, 0);
            }
            bins[distance] += 1;
        }

        ProbeHistogram { bins }
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Available with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let index_slots = self.slot_count();
        DebugStats {
            populated: self.populated,
            capacity: self.max_count,
            index_slots,
            tombstones: self.tombstones,
            load_factor: if self.max_count == 0 {
                0.0
            } else {
                self.populated as f64 / self.max_count as f64
            },
            index_utilization: if index_slots == 0 {
                0.0
            } else {
                (self.populated + self.tombstones) as f64 / index_slots as f64
            },
            total_bytes: self.layout.layout.size(),
            wasted_bytes: (self.max_count - self.populated)
                * (mem::size_of::<Bucket<K, V>>() + mem::size_of::<u64>())
                + (index_slots - self.populated) * mem::size_of::<usize>(),
        }
    }
}

/// A view into a single entry in a [`HashTable`], which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, K, V, A: Allocator = Global> {
    /// The key is not present in the table
    Vacant(VacantEntry<'a, K, V, A>),
    /// The key is present in the table
    Occupied(OccupiedEntry<'a, K, V, A>),
}

impl<'a, K, V, A: Allocator> Entry<'a, K, V, A> {
    /// Inserts `key` and `value` if the entry is vacant and returns a mutable
    /// reference to the value now in the table.
    ///
    /// An occupied entry keeps its value; `key` and `value` are dropped.
    pub fn or_insert(self, key: K, value: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(key, value),
        }
    }

    /// Like [`or_insert`](Entry::or_insert), computing the pair only when the
    /// entry is vacant.
    pub fn or_insert_with(self, default: impl FnOnce() -> (K, V)) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let (key, value) = default();
                entry.insert(key, value)
            }
        }
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, K, V, A: Allocator = Global> {
    table: &'a mut HashTable<K, V, A>,
    hash: u64,
}

impl<'a, K, V, A: Allocator> VacantEntry<'a, K, V, A> {
    /// The hash this entry was looked up with.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Inserts the pair, growing the table if it is full.
    pub fn insert(self, key: K, value: V) -> &'a mut V {
        let index = self.table.insert_unique(self.hash, key, value);
        // SAFETY: `insert_unique` just initialized bucket `index`.
        unsafe { &mut (*self.table.buckets_ptr().add(index)).value }
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, K, V, A: Allocator = Global> {
    table: &'a mut HashTable<K, V, A>,
    slot: usize,
    index: usize,
}

impl<'a, K, V, A: Allocator> OccupiedEntry<'a, K, V, A> {
    fn bucket(&self) -> &Bucket<K, V> {
        // SAFETY: `index` was validated by the lookup and the table is borrowed
        // mutably for the entry's lifetime.
        unsafe { &*self.table.buckets_ptr().add(self.index) }
    }

    fn bucket_mut(&mut self) -> &mut Bucket<K, V> {
        // SAFETY: As in `bucket`.
        unsafe { &mut *self.table.buckets_ptr().add(self.index) }
    }

    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.bucket().key
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.bucket().value
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.bucket_mut().value
    }

    /// Converts the entry into a mutable reference to the value with the
    /// lifetime of the entry.
    pub fn into_mut(self) -> &'a mut V {
        // SAFETY: As in `bucket`.
        unsafe { &mut (*self.table.buckets_ptr().add(self.index)).value }
    }

    /// Replaces the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the table and returns the pair.
    pub fn remove(self) -> (K, V) {
        // SAFETY: `slot` holds `index`, a live bucket.
        unsafe { self.table.remove_at(self.slot, self.index) }.into_pair()
    }
}

/// An iterator over the buckets of a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, K, V> {
    inner: core::slice::Iter<'a, Bucket<K, V>>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Bucket<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`iter_mut`] method on [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
pub struct IterMut<'a, K, V> {
    inner: core::slice::IterMut<'a, Bucket<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Bucket::pair_mut)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// A draining iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, K, V, A: Allocator = Global> {
    table: &'a mut HashTable<K, V, A>,
    index: usize,
    len: usize,
}

impl<K, V, A: Allocator> Iterator for Drain<'_, K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.len {
            return None;
        }
        // SAFETY: Buckets `index..len` are initialized and no longer tracked by
        // the table.
        let bucket = unsafe { self.table.buckets_ptr().add(self.index).read() };
        self.index += 1;
        Some(bucket.into_pair())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for Drain<'_, K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for Drain<'_, K, V, A> {}

impl<K, V, A: Allocator> Drop for Drain<'_, K, V, A> {
    fn drop(&mut self) {
        let start = mem::replace(&mut self.index, self.len);
        if mem::needs_drop::<Bucket<K, V>>() && start < self.len {
            // SAFETY: Buckets `start..len` were not yielded.
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                    self.table.buckets_ptr().add(start),
                    self.len - start,
                ));
            }
        }
    }
}

/// An owning iterator over the entries of a [`HashTable`].
pub struct IntoIter<K, V, A: Allocator = Global> {
    table: HashTable<K, V, A>,
    index: usize,
    len: usize,
}

impl<K, V, A: Allocator> IntoIterator for HashTable<K, V, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(mut self) -> Self::IntoIter {
        let len = mem::replace(&mut self.populated, 0);
        IntoIter {
            table: self,
            index: 0,
            len,
        }
    }
}

impl<K, V, A: Allocator> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.len {
            return None;
        }
        // SAFETY: Buckets `index..len` are initialized and owned by the
        // iterator.
        let bucket = unsafe { self.table.buckets_ptr().add(self.index).read() };
        self.index += 1;
        Some(bucket.into_pair())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoIter<K, V, A> {}

impl<K, V, A: Allocator> Drop for IntoIter<K, V, A> {
    fn drop(&mut self) {
        let remaining = self.len - self.index;
        if mem::needs_drop::<Bucket<K, V>>() && remaining > 0 {
            // SAFETY: Buckets `index..len` were not yielded; the table itself
            // tracks none, so it only frees storage afterwards.
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                    self.table.buckets_ptr().add(self.index),
                    remaining,
                ));
            }
        }
    }
}
