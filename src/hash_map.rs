use core::fmt::Debug;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::allocator::Allocator;
use crate::allocator::Global;
use crate::copy_from::CopyFrom;
use crate::error::TryReserveError;
use crate::hash::DefaultEqual;
use crate::hash::DefaultHash;
use crate::hash::KeyEqual;
use crate::hash::KeyHash;
use crate::hash_table::Bucket;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// A hash map with pluggable hash and equality functors and an owned
/// allocator.
///
/// `HashMap<K, V, H, E, A>` hashes keys with `H` (a [`KeyHash<K>`]), compares
/// them with `E` (a [`KeyEqual<K>`]) and allocates its single storage block
/// from `A`. All three are stored by value. The defaults hash through
/// [`DefaultHash`], compare with [`Eq`] and use the [`Global`] allocator.
///
/// A freshly constructed map owns no storage: `max_count() == 0` until the
/// first insertion or reservation.
///
/// # Performance Characteristics
///
/// - **Memory**: `2 * size_of::<usize>() + size_of::<u64>()` bytes of overhead
///   per bucket, plus the size of `(K, V)`
/// - **Copies**: maps whose keys and values copy bitwise are copied with one
///   block copy of the occupied buckets
///
/// # Examples
///
/// ```rust
/// use alloc_hash::HashMap;
///
/// let mut map = HashMap::new();
/// map.add(1, "one");
/// map.add(2, "two");
///
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map.add(1, "uno"), Some("one"));
/// assert_eq!(map.len(), 2);
/// ```
pub struct HashMap<K, V, H = DefaultHash, E = DefaultEqual, A: Allocator = Global> {
    table: HashTable<K, V, A>,
    hash: H,
    equal: E,
}

impl<K, V, H, E, A> Debug for HashMap<K, V, H, E, A>
where
    K: Debug,
    V: Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, H, E, A> Clone for HashMap<K, V, H, E, A>
where
    K: CopyFrom<K>,
    V: CopyFrom<V>,
    H: Clone,
    E: Clone,
    A: Allocator + Clone,
{
    /// Copies the map, reusing its functors and cloning its allocator.
    ///
    /// The copy is sized for exactly `len()` elements.
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hash: self.hash.clone(),
            equal: self.equal.clone(),
        }
    }
}

impl<K, V> HashMap<K, V> {
    /// Creates an empty map with the default functors and the global
    /// allocator.
    ///
    /// Does not allocate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map able to hold `n` elements without reallocating.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let map: HashMap<i32, String> = HashMap::with_capacity(100);
    /// assert!(map.max_count() >= 100);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_in(n, Global)
    }
}

impl<K, V, H, E, A> Default for HashMap<K, V, H, E, A>
where
    H: Default,
    E: Default,
    A: Allocator + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<K, V, H, E, A> HashMap<K, V, H, E, A>
where
    H: Default,
    E: Default,
    A: Allocator,
{
    /// Creates an empty map that will allocate from `allocator`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::allocator::Global;
    /// # use alloc_hash::HashMap;
    /// #
    /// let map: HashMap<u8, u8> = HashMap::new_in(Global);
    /// assert_eq!(map.max_count(), 0);
    /// ```
    pub fn new_in(allocator: A) -> Self {
        Self::with_hasher_in(H::default(), E::default(), allocator)
    }

    /// Creates a map able to hold `n` elements, allocating from `allocator`.
    pub fn with_capacity_in(n: usize, allocator: A) -> Self {
        let mut map = Self::new_in(allocator);
        map.table.reserve(n);
        map
    }
}

impl<K, V, H, E, A: Allocator> HashMap<K, V, H, E, A> {
    /// Creates an empty map from explicit functors and an allocator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::allocator::Global;
    /// # use alloc_hash::HashMap;
    /// #
    /// // Keys that agree modulo 10 are the same key.
    /// let mut map = HashMap::with_hasher_in(
    ///     |k: &u32| u64::from(k % 10),
    ///     |a: &u32, b: &u32| a % 10 == b % 10,
    ///     Global,
    /// );
    /// map.add(3, "three");
    /// assert_eq!(map.get(&13), Some(&"three"));
    /// ```
    pub fn with_hasher_in(hash: H, equal: E, allocator: A) -> Self {
        Self {
            table: HashTable::new_in(allocator),
            hash,
            equal,
        }
    }

    /// Returns the allocator backing this map.
    pub fn allocator(&self) -> &A {
        self.table.allocator()
    }

    /// Returns the hash functor.
    pub fn hasher(&self) -> &H {
        &self.hash
    }

    /// Returns the equality functor.
    pub fn key_eq(&self) -> &E {
        &self.equal
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns how many elements the map holds before it reallocates.
    ///
    /// Zero exactly when the map owns no storage.
    pub fn max_count(&self) -> usize {
        self.table.max_count()
    }

    /// Returns `max_count() - len()`.
    pub fn slack(&self) -> usize {
        self.table.slack()
    }

    /// Removes all elements from the map.
    ///
    /// The allocated storage is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.add(1, "a");
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert!(map.max_count() > 0);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the storage to the smallest size that holds the current
    /// elements. An empty map releases its storage entirely.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Returns an iterator over `(&K, &V)` in unspecified order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over `(&K, &mut V)` in unspecified order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let mut map = HashMap::from([("a", 1), ("b", 2)]);
    /// for value in map.values_mut() {
    ///     *value *= 10;
    /// }
    /// assert_eq!(map[&"b"], 20);
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes every element, yielding the pairs. The storage is kept.
    pub fn drain(&mut self) -> Drain<'_, K, V, A> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns a cursor at the first element, or at the end if the map is
    /// empty.
    pub fn begin(&self) -> Cursor<'_, K, V> {
        Cursor {
            buckets: self.table.as_slice(),
            position: 0,
        }
    }

    /// Returns the end cursor. It compares equal to any exhausted cursor of
    /// this map and must never be dereferenced.
    pub fn end(&self) -> Cursor<'_, K, V> {
        let buckets = self.table.as_slice();
        Cursor {
            buckets,
            position: buckets.len(),
        }
    }

    /// Moves the map into `allocator`, keeping its functors.
    ///
    /// If `allocator` compares equal to the map's allocator the storage is
    /// adopted without allocating. Otherwise the elements move into storage
    /// allocated from `allocator` and the old storage is freed through the
    /// old allocator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::allocator::Global;
    /// # use alloc_hash::HashMap;
    /// #
    /// let map = HashMap::from([(1, 'a'), (2, 'b')]);
    /// let borrowed = Global;
    /// let moved = map.relocate_in(&borrowed);
    /// assert_eq!(moved[&2], 'b');
    /// ```
    pub fn relocate_in<A2>(self, allocator: A2) -> HashMap<K, V, H, E, A2>
    where
        A: PartialEq<A2>,
        A2: Allocator,
    {
        HashMap {
            table: self.table.relocate_in(allocator),
            hash: self.hash,
            equal: self.equal,
        }
    }

    /// Builds a map holding a copy of every element of `source`, with room for
    /// `extra` more, from explicit functors and an allocator.
    ///
    /// Every other copy constructor forwards here. Keys and values convert
    /// through [`CopyFrom`]: when both conversions are bitwise the occupied
    /// buckets are duplicated with a single block copy, otherwise every
    /// element is copy-constructed. Each destination key is hashed with
    /// `hash`, so source and destination may disagree on hashing. Conversions
    /// must map distinct source keys to distinct destination keys.
    ///
    /// An empty `source` with `extra == 0` yields a map that owns no storage.
    /// Anything else allocates exactly once. `source` is never modified and
    /// nothing is freed.
    pub fn copy_from_parts<K2, V2, H2, E2, A2>(
        source: &HashMap<K2, V2, H2, E2, A2>,
        extra: usize,
        hash: H,
        equal: E,
        allocator: A,
    ) -> Self
    where
        K: CopyFrom<K2>,
        V: CopyFrom<V2>,
        H: KeyHash<K>,
        A2: Allocator,
    {
        let table =
            HashTable::copy_from_table(&source.table, extra, allocator, |key| {
                KeyHash::hash(&hash, key)
            });
        Self { table, hash, equal }
    }
}

impl<K, V, H, E, A> HashMap<K, V, H, E, A>
where
    H: KeyHash<K>,
    E: KeyEqual<K>,
    A: Allocator,
{
    /// Makes room for at least `n` elements in total.
    ///
    /// Does nothing when `n <= max_count()`, whatever `len()` is. Otherwise
    /// performs exactly one allocation and, if the map owned storage, exactly
    /// one free. `len()` is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the new size overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let mut map: HashMap<u32, u32> = HashMap::new();
    /// map.reserve(0);
    /// assert_eq!(map.max_count(), 0);
    ///
    /// map.reserve(10);
    /// assert!(map.max_count() >= 10);
    /// ```
    pub fn reserve(&mut self, n: usize) {
        self.table.reserve(n);
    }

    /// Fallible version of [`reserve`](HashMap::reserve).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// # use alloc_hash::TryReserveError;
    /// #
    /// let mut map: HashMap<u64, u64> = HashMap::new();
    /// assert_eq!(map.try_reserve(usize::MAX), Err(TryReserveError::CapacityOverflow));
    /// assert_eq!(map.try_reserve(64), Ok(()));
    /// ```
    pub fn try_reserve(&mut self, n: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve(n)
    }

    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        KeyHash::hash(&self.hash, key)
    }

    /// Inserts `key` with `value`, growing the map first when it is full.
    ///
    /// If an equal key is already present its value is replaced and the old
    /// value returned; the stored key is kept and `key` is dropped. Replacing
    /// never grows the map.
    pub fn add(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_key(&key);
        let equal = &self.equal;
        match self.table.entry(hash, |k| KeyEqual::eq(equal, k, &key)) {
            TableEntry::Occupied(mut entry) => Some(entry.insert(value)),
            TableEntry::Vacant(entry) => {
                entry.insert(key, value);
                None
            }
        }
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.add(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.hash_key(key);
        self.table
            .find(hash, |k| KeyEqual::eq(&self.equal, k, key))
            .map(Bucket::value)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let hash = self.hash_key(key);
        self.table
            .find(hash, |k| KeyEqual::eq(&self.equal, k, key))
            .map(Bucket::pair)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_key(key);
        let equal = &self.equal;
        self.table
            .find_mut(hash, |k| KeyEqual::eq(equal, k, key))
            .map(Bucket::value_mut)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// The storage is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.add(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash_key(key);
        let equal = &self.equal;
        self.table.remove(hash, |k| KeyEqual::eq(equal, k, key))
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let mut counts: HashMap<&str, u32> = HashMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts[&"a"], 2);
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, A> {
        let hash = self.hash_key(&key);
        let equal = &self.equal;
        match self.table.entry(hash, |k| KeyEqual::eq(equal, k, &key)) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }

    /// Returns a cursor at `key`, or [`end`](HashMap::end) if it is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let map = HashMap::from([(7, 70)]);
    /// let found = map.find(&7);
    /// assert!(found != map.end());
    /// assert_eq!((found.key(), found.value()), (&7, &70));
    /// assert!(map.find(&8) == map.end());
    /// ```
    pub fn find(&self, key: &K) -> Cursor<'_, K, V> {
        let hash = self.hash_key(key);
        let buckets = self.table.as_slice();
        let position = self
            .table
            .find_index(hash, |k| KeyEqual::eq(&self.equal, k, key))
            .unwrap_or(buckets.len());
        Cursor { buckets, position }
    }

    /// Builds a map from `source` using default functors and a default
    /// allocator.
    ///
    /// See [`copy_from_parts`](HashMap::copy_from_parts).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashMap;
    /// #
    /// let signed: HashMap<i32, i32> = HashMap::from([(-1, 1), (2, -2)]);
    /// let unsigned: HashMap<u32, u32> = HashMap::copy_from(&signed);
    /// assert_eq!(unsigned[&u32::MAX], 1);
    /// assert_eq!(unsigned[&2], u32::MAX - 1);
    /// ```
    pub fn copy_from<K2, V2, H2, E2, A2>(source: &HashMap<K2, V2, H2, E2, A2>) -> Self
    where
        K: CopyFrom<K2>,
        V: CopyFrom<V2>,
        H: Default,
        E: Default,
        A: Default,
        A2: Allocator,
    {
        Self::copy_from_with_extra_in(source, 0, A::default())
    }

    /// Builds a map from `source` that allocates from `allocator`.
    pub fn copy_from_in<K2, V2, H2, E2, A2>(
        source: &HashMap<K2, V2, H2, E2, A2>,
        allocator: A,
    ) -> Self
    where
        K: CopyFrom<K2>,
        V: CopyFrom<V2>,
        H: Default,
        E: Default,
        A2: Allocator,
    {
        Self::copy_from_with_extra_in(source, 0, allocator)
    }

    /// Builds a map from `source` with room for `extra` more elements.
    pub fn copy_from_with_extra<K2, V2, H2, E2, A2>(
        source: &HashMap<K2, V2, H2, E2, A2>,
        extra: usize,
    ) -> Self
    where
        K: CopyFrom<K2>,
        V: CopyFrom<V2>,
        H: Default,
        E: Default,
        A: Default,
        A2: Allocator,
    {
        Self::copy_from_with_extra_in(source, extra, A::default())
    }

    /// Builds a map from `source` with room for `extra` more elements,
    /// allocating from `allocator`.
    pub fn copy_from_with_extra_in<K2, V2, H2, E2, A2>(
        source: &HashMap<K2, V2, H2, E2, A2>,
        extra: usize,
        allocator: A,
    ) -> Self
    where
        K: CopyFrom<K2>,
        V: CopyFrom<V2>,
        H: Default,
        E: Default,
        A2: Allocator,
    {
        Self::copy_from_parts(source, extra, H::default(), E::default(), allocator)
    }
}

impl<K, V, H, E, A, H2, E2, A2> PartialEq<HashMap<K, V, H2, E2, A2>> for HashMap<K, V, H, E, A>
where
    V: PartialEq,
    H: KeyHash<K>,
    E: KeyEqual<K>,
    A: Allocator,
    A2: Allocator,
{
    fn eq(&self, other: &HashMap<K, V, H2, E2, A2>) -> bool {
        self.len() == other.len()
            && other
                .iter()
                .all(|(key, value)| self.get(key).is_some_and(|v| v == value))
    }
}

impl<K, V, H, E, A> Eq for HashMap<K, V, H, E, A>
where
    V: Eq,
    H: KeyHash<K>,
    E: KeyEqual<K>,
    A: Allocator,
{
}

impl<K, V, H, E, A> Index<&K> for HashMap<K, V, H, E, A>
where
    H: KeyHash<K>,
    E: KeyEqual<K>,
    A: Allocator,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is not present.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found in HashMap"),
        }
    }
}

impl<K, V, H, E, A> Extend<(K, V)> for HashMap<K, V, H, E, A>
where
    H: KeyHash<K>,
    E: KeyEqual<K>,
    A: Allocator,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(self.len().saturating_add(lower));
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

impl<K, V, H, E, A> FromIterator<(K, V)> for HashMap<K, V, H, E, A>
where
    H: KeyHash<K> + Default,
    E: KeyEqual<K> + Default,
    A: Allocator + Default,
{
    /// Collects pairs into a new map. Later pairs overwrite earlier ones with
    /// an equal key.
    ///
    /// Storage for the iterator's lower size bound is allocated up front, so
    /// an exact-size source performs a single allocation.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for HashMap<K, V>
where
    DefaultHash: KeyHash<K>,
    DefaultEqual: KeyEqual<K>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

impl<'a, K, V, H, E, A: Allocator> IntoIterator for &'a HashMap<K, V, H, E, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, H, E, A: Allocator> IntoIterator for &'a mut HashMap<K, V, H, E, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, H, E, A: Allocator> IntoIterator for HashMap<K, V, H, E, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

/// A position within a [`HashMap`], or its end.
///
/// Cursors are created by [`HashMap::find`], [`HashMap::begin`] and
/// [`HashMap::end`], and compare equal when they point at the same element of
/// the same map. Any mutation of the map invalidates them, which the borrow
/// checker enforces.
pub struct Cursor<'a, K, V> {
    buckets: &'a [Bucket<K, V>],
    position: usize,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// Returns `true` if this is the end cursor.
    pub fn is_end(&self) -> bool {
        self.position == self.buckets.len()
    }

    /// Returns the element under the cursor, or `None` at the end.
    pub fn get(&self) -> Option<&'a Bucket<K, V>> {
        self.buckets.get(self.position)
    }

    /// Returns the key under the cursor.
    ///
    /// # Panics
    ///
    /// Panics on the end cursor.
    pub fn key(&self) -> &'a K {
        assert!(!self.is_end(), "dereferenced the end cursor");
        self.buckets[self.position].key()
    }

    /// Returns the value under the cursor.
    ///
    /// # Panics
    ///
    /// Panics on the end cursor.
    pub fn value(&self) -> &'a V {
        assert!(!self.is_end(), "dereferenced the end cursor");
        self.buckets[self.position].value()
    }

    /// Moves to the next element in iteration order.
    ///
    /// # Panics
    ///
    /// Panics on the end cursor.
    pub fn advance(&mut self) {
        assert!(!self.is_end(), "advanced past the end cursor");
        self.position += 1;
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.buckets.as_ptr(), other.buckets.as_ptr())
            && self.position == other.position
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: Debug, V: Debug> Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.get() {
            Some(bucket) => f.debug_tuple("Cursor").field(bucket).finish(),
            None => f.write_str("Cursor(end)"),
        }
    }
}

/// A view into a single entry in a map, which may be vacant or occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V, A: Allocator = Global> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, A>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, A>),
}

impl<'a, K, V, A: Allocator> Entry<'a, K, V, A> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Like [`or_insert_with`](Entry::or_insert_with), passing the key to the
    /// closure.
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(entry.key());
                entry.insert(value)
            }
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V: Default, A: Allocator> Entry<'a, K, V, A> {
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V, A: Allocator = Global> {
    entry: crate::hash_table::VacantEntry<'a, K, V, A>,
    key: K,
}

impl<'a, K, V, A: Allocator> VacantEntry<'a, K, V, A> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        self.entry.insert(self.key, value)
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V, A: Allocator = Global> {
    entry: crate::hash_table::OccupiedEntry<'a, K, V, A>,
}

impl<'a, K, V, A: Allocator> OccupiedEntry<'a, K, V, A> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        self.entry.key()
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.entry.get()
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.entry.get_mut()
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        self.entry.into_mut()
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        self.entry.insert(value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Bucket::pair)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the key-value pairs of a `HashMap`.
pub struct IterMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V, A: Allocator = Global> {
    inner: crate::hash_table::Drain<'a, K, V, A>,
}

impl<K, V, A: Allocator> Iterator for Drain<'_, K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for Drain<'_, K, V, A> {}

/// An owning iterator over the key-value pairs of a `HashMap`.
pub struct IntoIter<K, V, A: Allocator = Global> {
    inner: crate::hash_table::IntoIter<K, V, A>,
}

impl<K, V, A: Allocator> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<K, V, A> {}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::test_util::CountingAllocator;
    use crate::test_util::Tracked;
    use crate::test_util::TrackedCounters;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    type SipMap<K, V, A = Global> = HashMap<K, V, DefaultHash<SipHashBuilder>, DefaultEqual, A>;

    fn sip_map<K, V>() -> SipMap<K, V> {
        SipMap::default()
    }

    #[test]
    fn new_allocates_nothing() {
        let alloc = CountingAllocator::default();
        let map: SipMap<i32, String, _> = HashMap::new_in(alloc.clone());
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.max_count(), 0);
        assert_eq!(map.slack(), 0);
        assert!(map.find(&1) == map.end());
        drop(map);
        assert_eq!((alloc.allocations(), alloc.frees()), (0, 0));
    }

    #[test]
    fn with_capacity() {
        let map: SipMap<i32, String> = HashMap::with_capacity_in(100, Global);
        assert!(map.max_count() >= 100);
        assert_eq!(map.slack(), map.max_count());
        assert!(map.is_empty());
    }

    #[test]
    fn add_and_get() {
        let mut map = sip_map();

        assert_eq!(map.add(1, "one".to_string()), None);
        assert_eq!(map.add(2, "two".to_string()), None);
        assert_eq!(map.add(3, "three".to_string()), None);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(&"one".to_string()));
        assert_eq!(map.get(&2), Some(&"two".to_string()));
        assert_eq!(map.get(&3), Some(&"three".to_string()));
        assert_eq!(map.get(&4), None);
        assert_eq!(map.get_key_value(&2), Some((&2, &"two".to_string())));
    }

    #[test]
    fn add_replaces_existing_value() {
        let alloc = CountingAllocator::default();
        let mut map: SipMap<u32, u32, _> = HashMap::new_in(alloc.clone());
        for k in 0..4 {
            map.add(k, k);
        }
        assert_eq!(map.slack(), 0);
        let allocations = alloc.allocations();

        assert_eq!(map.add(2, 20), Some(2));
        assert_eq!(map.get(&2), Some(&20));
        assert_eq!(map.len(), 4);
        assert_eq!(alloc.allocations(), allocations);
    }

    #[test]
    fn get_mut() {
        let mut map = sip_map();
        map.add(1, "one".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str("_modified");
        }

        assert_eq!(map.get(&1), Some(&"one_modified".to_string()));
        assert!(map.get_mut(&2).is_none());
    }

    #[test]
    fn contains_key() {
        let mut map = sip_map();
        map.add(1, "one".to_string());

        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn remove() {
        let mut map = sip_map();
        map.add(1, "one".to_string());
        map.add(2, "two".to_string());

        assert_eq!(map.remove(&1), Some("one".to_string()));
        assert_eq!(map.remove(&1), None);
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));
    }

    #[test]
    fn remove_entry() {
        let mut map = sip_map();
        map.add(1, "one".to_string());

        assert_eq!(map.remove_entry(&1), Some((1, "one".to_string())));
        assert_eq!(map.remove_entry(&1), None);
        assert!(map.is_empty());
    }

    #[test]
    fn clear_keeps_storage() {
        let mut map = sip_map();
        map.add(1, "one".to_string());
        map.add(2, "two".to_string());
        let max_count = map.max_count();

        map.clear();
        assert!(map.is_empty());
        assert!(!map.contains_key(&1));
        assert_eq!(map.max_count(), max_count);
    }

    #[test]
    fn reserve_counts() {
        let alloc = CountingAllocator::default();
        let mut map: SipMap<i32, i32, _> = HashMap::new_in(alloc.clone());

        map.reserve(0);
        assert_eq!((map.len(), map.max_count()), (0, 0));
        assert_eq!((alloc.allocations(), alloc.frees()), (0, 0));

        map.reserve(100);
        assert!(map.max_count() >= 100);
        assert_eq!((alloc.allocations(), alloc.frees()), (1, 0));

        map.add(1, 1);
        map.reserve(50);
        map.reserve(map.max_count());
        assert_eq!((alloc.allocations(), alloc.frees()), (1, 0));

        map.reserve(map.max_count() + 1);
        assert_eq!(map.len(), 1);
        assert_eq!((alloc.allocations(), alloc.frees()), (2, 1));
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn entry_api() {
        let mut map = sip_map();

        let value = map.entry(1).or_insert("default".to_string());
        assert_eq!(value, &"default".to_string());

        let value = map.entry(1).or_insert("other".to_string());
        assert_eq!(value, &"default".to_string());

        let value = map.entry(2).or_insert_with(|| "computed".to_string());
        assert_eq!(value, &"computed".to_string());

        let value = map.entry(3).or_insert_with_key(|k| format!("key {k}"));
        assert_eq!(value, &"key 3".to_string());

        map.entry(1).and_modify(|v| v.push_str("_modified"));
        assert_eq!(map.get(&1), Some(&"default_modified".to_string()));
        assert_eq!(map.entry(9).key(), &9);
    }

    #[test]
    fn entry_or_default() {
        let mut map: SipMap<i32, i32> = sip_map();

        *map.entry(1).or_default() += 5;
        *map.entry(1).or_default() += 5;
        assert_eq!(map.get(&1), Some(&10));
    }

    #[test]
    fn occupied_entry() {
        let mut map = sip_map();
        map.add(1, "one".to_string());

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"one".to_string());

                entry.get_mut().push_str("_modified");
                assert_eq!(entry.get(), &"one_modified".to_string());

                let old_value = entry.insert("new_value".to_string());
                assert_eq!(old_value, "one_modified".to_string());

                let removed_value = entry.remove();
                assert_eq!(removed_value, "new_value".to_string());
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        assert!(!map.contains_key(&1));
    }

    #[test]
    fn vacant_entry() {
        let mut map = sip_map();

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);

                let value = entry.insert("hello".to_string());
                assert_eq!(value, &"hello".to_string());
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"hello".to_string()));
    }

    #[test]
    fn iterators() {
        let mut map = sip_map();
        map.add(1, "one".to_string());
        map.add(2, "two".to_string());
        map.add(3, "three".to_string());

        let pairs: std::collections::HashMap<i32, String> =
            map.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.get(&1), Some(&"one".to_string()));
        assert_eq!(pairs.get(&3), Some(&"three".to_string()));

        let keys: std::collections::HashSet<i32> = map.keys().copied().collect();
        assert_eq!(keys, [1, 2, 3].into_iter().collect::<std::collections::HashSet<_>>());

        for value in map.values_mut() {
            value.push('!');
        }
        let values: std::collections::HashSet<String> = map.values().cloned().collect();
        assert!(values.contains("one!"));
        assert!(values.contains("three!"));

        for (k, v) in &mut map {
            v.push_str(&k.to_string());
        }
        assert_eq!(map.get(&2), Some(&"two!2".to_string()));
        assert_eq!((&map).into_iter().len(), 3);
    }

    #[test]
    fn cursors_walk_every_element() {
        let map: SipMap<u32, u32> = (0..20).map(|k| (k, k * 3)).collect();

        let mut seen = Vec::new();
        let mut cursor = map.begin();
        while cursor != map.end() {
            seen.push((*cursor.key(), *cursor.value()));
            cursor.advance();
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..20).map(|k| (k, k * 3)).collect::<Vec<_>>());

        let found = map.find(&11);
        assert!(!found.is_end());
        assert_eq!(found.get().map(|b| *b.value()), Some(33));
        assert!(map.find(&100) == map.end());
    }

    #[test]
    fn empty_map_begin_is_end() {
        let map: SipMap<u32, u32> = sip_map();
        assert!(map.begin() == map.end());
        assert!(map.begin().get().is_none());
    }

    #[test]
    #[should_panic(expected = "dereferenced the end cursor")]
    fn end_cursor_panics_on_key() {
        let map: SipMap<u32, u32> = sip_map();
        map.end().key();
    }

    #[test]
    fn drain() {
        let mut map = sip_map();
        map.add(1, "one".to_string());
        map.add(2, "two".to_string());
        map.add(3, "three".to_string());

        let drained: std::collections::HashMap<i32, String> = map.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(map.is_empty());

        assert_eq!(drained.get(&1), Some(&"one".to_string()));
        assert_eq!(drained.get(&2), Some(&"two".to_string()));
        assert_eq!(drained.get(&3), Some(&"three".to_string()));
    }

    #[test]
    fn into_iter_yields_everything() {
        let map: SipMap<u8, u8> = [(1, 2), (3, 4)].into_iter().collect();
        let mut pairs: Vec<_> = map.into_iter().collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn multiple_insertions() {
        let mut map = sip_map();

        for i in 0..100 {
            map.add(i, format!("value_{}", i));
        }

        assert_eq!(map.len(), 100);

        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&format!("value_{}", i)));
        }
    }

    #[test]
    fn collision_handling() {
        let mut map = HashMap::with_hasher_in(|_: &i32| 7u64, |a: &i32, b: &i32| a == b, Global);

        for i in 0..200 {
            map.add(i, i * 2);
        }

        assert_eq!(map.len(), 200);

        for i in 0..200 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }

        for i in (0..200).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * 2));
        }

        assert_eq!(map.len(), 100);

        for i in 0..200 {
            assert_eq!(map.get(&i), (i % 2 == 1).then_some(&(i * 2)));
        }
    }

    #[test]
    fn custom_equality_merges_keys() {
        let mut map = HashMap::with_hasher_in(
            |k: &u32| u64::from(k % 10),
            |a: &u32, b: &u32| a % 10 == b % 10,
            Global,
        );
        assert_eq!(map.add(3, 'a'), None);
        assert_eq!(map.add(13, 'b'), Some('a'));
        assert_eq!(map.len(), 1);
        assert_eq!(map.find(&23).key(), &3);
    }

    #[test]
    fn string_keys() {
        let mut map = sip_map();

        map.add("hello".to_string(), 1);
        map.add("world".to_string(), 2);
        map.add("rust".to_string(), 3);

        assert_eq!(map.get(&"hello".to_string()), Some(&1));
        assert_eq!(map.get(&"world".to_string()), Some(&2));
        assert_eq!(map.get(&"rust".to_string()), Some(&3));
        assert_eq!(map.get(&"missing".to_string()), None);
    }

    #[test]
    fn complex_values() {
        let mut map = sip_map();

        let vec1 = vec![1, 2, 3];
        let vec2 = vec![4, 5, 6];

        map.add("first".to_string(), vec1.clone());
        map.add("second".to_string(), vec2.clone());

        assert_eq!(map.get(&"first".to_string()), Some(&vec1));
        assert_eq!(map.get(&"second".to_string()), Some(&vec2));

        if let Some(v) = map.get_mut(&"first".to_string()) {
            v.push(4);
        }

        assert_eq!(map.get(&"first".to_string()), Some(&vec![1, 2, 3, 4]));
    }

    #[test]
    fn copy_of_bitwise_map_allocates_once() {
        let alloc = CountingAllocator::default();
        let pairs = [(0, 0), (1, 11), (2, 22), (3, 33), (4, 44), (5, 55), (6, 66), (7, 77)];
        let mut source: SipMap<i32, i32, _> = HashMap::new_in(alloc.clone());
        source.extend(pairs);
        assert_eq!(alloc.allocations(), 1);

        let copy: SipMap<i32, i32, _> = HashMap::copy_from_in(&source, alloc.clone());

        assert_eq!((alloc.allocations(), alloc.frees()), (2, 0));
        assert_eq!(copy.len(), source.len());
        for (key, value) in pairs {
            let cursor = copy.find(&key);
            assert!(cursor != copy.end());
            assert_eq!((*cursor.key(), *cursor.value()), (key, value));
        }
    }

    #[test]
    fn copy_of_tracked_values_copies_each_element() {
        let counters = TrackedCounters::default();
        let mut source: SipMap<u64, Tracked> = sip_map();
        for k in 0..16 {
            source.add(k, counters.make(k * 7));
        }

        let copy: SipMap<u64, Tracked> = HashMap::copy_from(&source);
        assert_eq!(counters.copies(), 16);
        assert_eq!(copy, source);
        assert_eq!(copy[&3].value, 21);
    }

    #[test]
    fn copy_of_empty_map_allocates_nothing() {
        let alloc = CountingAllocator::default();
        let source: SipMap<u32, u32> = sip_map();

        let copy: SipMap<u32, u32, _> = HashMap::copy_from_in(&source, alloc.clone());
        assert_eq!(copy.max_count(), 0);
        assert_eq!((alloc.allocations(), alloc.frees()), (0, 0));

        let copy: SipMap<u32, u32, _> = HashMap::copy_from_with_extra_in(&source, 5, alloc.clone());
        assert!(copy.max_count() >= 5);
        assert_eq!(copy.len(), 0);
        assert_eq!((alloc.allocations(), alloc.frees()), (1, 0));
    }

    #[test]
    fn copy_with_extra_makes_room() {
        let source: SipMap<u32, u32> = (0..10).map(|k| (k, k)).collect();
        let copy: SipMap<u32, u32> = HashMap::copy_from_with_extra(&source, 30);
        assert_eq!(copy.len(), 10);
        assert!(copy.max_count() >= 40);
        assert_eq!(copy, source);
    }

    #[test]
    fn copy_across_key_types() {
        let source: SipMap<i32, i64> = (-5..5).map(|k| (k, i64::from(k) * 1000)).collect();
        let copy: SipMap<u32, u64> = HashMap::copy_from(&source);
        assert_eq!(copy.len(), 10);
        for k in -5..5i32 {
            assert_eq!(copy.get(&(k as u32)), Some(&((i64::from(k) * 1000) as u64)));
        }

        let widened: SipMap<u64, i64> = HashMap::copy_from(&copy.clone());
        assert_eq!(widened.get(&(u32::MAX as u64)), Some(&-1000));

        let strings: SipMap<&str, u8> = [("a", 1), ("b", 2)].into_iter().collect();
        let owned: SipMap<String, u8> = HashMap::copy_from(&strings);
        assert_eq!(owned.get(&"b".to_string()), Some(&2));
    }

    #[test]
    fn copy_into_another_allocator_type() {
        let source: SipMap<u16, u16> = (0..50).map(|k| (k, k + 1)).collect();
        let alloc = CountingAllocator::default();

        let copy: SipMap<u16, u16, CountingAllocator> = HashMap::copy_from_in(&source, alloc.clone());
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(copy, source);
        assert_eq!(source.len(), 50);
    }

    #[test]
    fn copy_from_parts_uses_supplied_functors() {
        let source: SipMap<u32, char> = [(1, 'a'), (11, 'b')].into_iter().collect();
        let copy: HashMap<u32, char, _, _> = HashMap::copy_from_parts(
            &source,
            0,
            |k: &u32| u64::from(*k),
            |a: &u32, b: &u32| a == b,
            Global,
        );
        assert_eq!(copy.get(&11), Some(&'b'));
        assert_eq!(copy.get(&1), Some(&'a'));
    }

    #[test]
    fn relocate_between_allocators() {
        let from = CountingAllocator::default();
        let to = CountingAllocator::default();
        let mut map: SipMap<u64, String, _> = HashMap::new_in(from.clone());
        for k in 0..10 {
            map.add(k, k.to_string());
        }

        let same = map.relocate_in(from.clone());
        let allocations = from.allocations();
        assert_eq!(from.frees(), allocations - 1);

        let moved = same.relocate_in(to.clone());
        assert_eq!(from.frees(), allocations);
        assert_eq!(to.allocations(), 1);
        assert_eq!(moved.get(&7), Some(&"7".to_string()));
        assert_eq!(moved.len(), 10);
    }

    #[test]
    fn clone_is_independent() {
        let mut map: SipMap<u32, String> = sip_map();
        map.add(1, "a".to_string());

        let mut copy = map.clone();
        copy.add(2, "b".to_string());
        copy.get_mut(&1).unwrap().push('!');

        assert_eq!(map.len(), 1);
        assert_eq!(map[&1], "a");
        assert_eq!(copy[&1], "a!");
    }

    #[test]
    fn equality_ignores_order_and_capacity() {
        let a: SipMap<u32, u32> = (0..30).map(|k| (k, k)).collect();
        let mut b: SipMap<u32, u32> = HashMap::with_capacity_in(500, Global);
        for k in (0..30).rev() {
            b.add(k, k);
        }
        assert_eq!(a, b);

        b.add(3, 4);
        assert_ne!(a, b);
    }

    #[test]
    fn from_array_and_debug() {
        let map: HashMap<u8, u8> = HashMap::from([(1, 2)]);
        assert_eq!(format!("{map:?}"), "{1: 2}");
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn index_missing_key_panics() {
        let map: SipMap<u32, u32> = sip_map();
        let _value = map[&1];
    }

    #[test]
    fn default_trait() {
        let map: SipMap<i32, String> = HashMap::default();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn shrink_and_try_reserve() {
        let mut map: SipMap<u32, u32> = HashMap::with_capacity_in(1000, Global);
        map.add(1, 1);
        map.shrink_to_fit();
        assert_eq!(map.max_count(), 4);
        assert_eq!(map.try_reserve(usize::MAX), Err(TryReserveError::CapacityOverflow));
        assert_eq!(map.get(&1), Some(&1));
    }
}
