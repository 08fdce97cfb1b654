use core::fmt::Debug;
use core::iter::FusedIterator;

use crate::allocator::Allocator;
use crate::allocator::Global;
use crate::copy_from::CopyFrom;
use crate::error::TryReserveError;
use crate::hash::DefaultEqual;
use crate::hash::DefaultHash;
use crate::hash::KeyEqual;
use crate::hash::KeyHash;
use crate::hash_map::HashMap;

/// A hash set built on [`HashMap<T, ()>`](HashMap).
///
/// It shares the map's functor, allocator and copy model: see [`HashMap`] for
/// the details.
///
/// # Examples
///
/// ```rust
/// use alloc_hash::HashSet;
///
/// let mut set = HashSet::new();
/// assert!(set.insert("a"));
/// assert!(!set.insert("a"));
/// assert!(set.contains(&"a"));
/// assert_eq!(set.len(), 1);
/// ```
pub struct HashSet<T, H = DefaultHash, E = DefaultEqual, A: Allocator = Global> {
    map: HashMap<T, (), H, E, A>,
}

impl<T, H, E, A, H2, E2, A2> PartialEq<HashSet<T, H2, E2, A2>> for HashSet<T, H, E, A>
where
    H: KeyHash<T>,
    E: KeyEqual<T>,
    A: Allocator,
    A2: Allocator,
{
    fn eq(&self, other: &HashSet<T, H2, E2, A2>) -> bool {
        self.map == other.map
    }
}

impl<T, H, E, A> Eq for HashSet<T, H, E, A>
where
    H: KeyHash<T>,
    E: KeyEqual<T>,
    A: Allocator,
{
}

impl<T: Debug, H, E, A: Allocator> Debug for HashSet<T, H, E, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, H, E, A> Clone for HashSet<T, H, E, A>
where
    T: CopyFrom<T>,
    H: Clone,
    E: Clone,
    A: Allocator + Clone,
{
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T> HashSet<T> {
    /// Creates an empty set with the default functors and the global
    /// allocator.
    ///
    /// Does not allocate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set able to hold `n` elements without reallocating.
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_in(n, Global)
    }
}

impl<T, H, E, A> Default for HashSet<T, H, E, A>
where
    H: Default,
    E: Default,
    A: Allocator + Default,
{
    fn default() -> Self {
        Self {
            map: HashMap::default(),
        }
    }
}

impl<T, H, E, A> HashSet<T, H, E, A>
where
    H: Default,
    E: Default,
    A: Allocator,
{
    /// Creates an empty set that will allocate from `allocator`.
    pub fn new_in(allocator: A) -> Self {
        Self {
            map: HashMap::new_in(allocator),
        }
    }

    /// Creates a set able to hold `n` elements, allocating from `allocator`.
    pub fn with_capacity_in(n: usize, allocator: A) -> Self {
        Self {
            map: HashMap::with_capacity_in(n, allocator),
        }
    }
}

impl<T, H, E, A: Allocator> HashSet<T, H, E, A> {
    /// Creates an empty set from explicit functors and an allocator.
    pub fn with_hasher_in(hash: H, equal: E, allocator: A) -> Self {
        Self {
            map: HashMap::with_hasher_in(hash, equal, allocator),
        }
    }

    /// Returns the allocator backing this set.
    pub fn allocator(&self) -> &A {
        self.map.allocator()
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns how many elements the set holds before it reallocates.
    pub fn max_count(&self) -> usize {
        self.map.max_count()
    }

    /// Returns `max_count() - len()`.
    pub fn slack(&self) -> usize {
        self.map.slack()
    }

    /// Removes all elements, keeping the storage.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Shrinks the storage to fit the current elements.
    pub fn shrink_to_fit(&mut self) {
        self.map.shrink_to_fit();
    }

    /// Returns an iterator over the elements in unspecified order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashSet;
    /// #
    /// let set = HashSet::from([1, 2, 3]);
    /// let mut items: Vec<_> = set.iter().copied().collect();
    /// items.sort();
    /// assert_eq!(items, [1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.map.keys(),
        }
    }

    /// Removes every element, yielding them. The storage is kept.
    pub fn drain(&mut self) -> Drain<'_, T, A> {
        Drain {
            inner: self.map.drain(),
        }
    }

    /// Moves the set into `allocator`, adopting the storage when the
    /// allocators compare equal.
    pub fn relocate_in<A2>(self, allocator: A2) -> HashSet<T, H, E, A2>
    where
        A: PartialEq<A2>,
        A2: Allocator,
    {
        HashSet {
            map: self.map.relocate_in(allocator),
        }
    }

    /// Builds a set holding a copy of every element of `source`, with room for
    /// `extra` more, from explicit functors and an allocator.
    ///
    /// See [`HashMap::copy_from_parts`].
    pub fn copy_from_parts<T2, H2, E2, A2>(
        source: &HashSet<T2, H2, E2, A2>,
        extra: usize,
        hash: H,
        equal: E,
        allocator: A,
    ) -> Self
    where
        T: CopyFrom<T2>,
        H: KeyHash<T>,
        A2: Allocator,
    {
        Self {
            map: HashMap::copy_from_parts(&source.map, extra, hash, equal, allocator),
        }
    }
}

impl<T, H, E, A> HashSet<T, H, E, A>
where
    H: KeyHash<T>,
    E: KeyEqual<T>,
    A: Allocator,
{
    /// Makes room for at least `n` elements in total.
    ///
    /// See [`HashMap::reserve`].
    pub fn reserve(&mut self, n: usize) {
        self.map.reserve(n);
    }

    /// Fallible version of [`reserve`](HashSet::reserve).
    pub fn try_reserve(&mut self, n: usize) -> Result<(), TryReserveError> {
        self.map.try_reserve(n)
    }

    /// Adds `value`, returning `true` if it was not already present.
    ///
    /// An equal element already in the set is kept and `value` is dropped.
    pub fn insert(&mut self, value: T) -> bool {
        self.map.add(value, ()).is_none()
    }

    /// Returns `true` if the set contains `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.map.contains_key(value)
    }

    /// Returns the stored element equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.map.get_key_value(value).map(|(k, _)| k)
    }

    /// Removes `value`, returning `true` if it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.map.remove(value).is_some()
    }

    /// Removes and returns the stored element equal to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.map.remove_entry(value).map(|(k, _)| k)
    }

    /// Returns `true` if every element of `self` is in `other`.
    pub fn is_subset<H2, E2, A2>(&self, other: &HashSet<T, H2, E2, A2>) -> bool
    where
        H2: KeyHash<T>,
        E2: KeyEqual<T>,
        A2: Allocator,
    {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if `self` and `other` share no element.
    pub fn is_disjoint<H2, E2, A2>(&self, other: &HashSet<T, H2, E2, A2>) -> bool
    where
        H2: KeyHash<T>,
        E2: KeyEqual<T>,
        A2: Allocator,
    {
        self.iter().all(|v| !other.contains(v))
    }

    /// Builds a set from `source` using default functors and a default
    /// allocator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use alloc_hash::HashSet;
    /// #
    /// let narrow: HashSet<u16> = HashSet::from([1, 2, 3]);
    /// let wide: HashSet<u64> = HashSet::copy_from(&narrow);
    /// assert!(wide.contains(&3));
    /// ```
    pub fn copy_from<T2, H2, E2, A2>(source: &HashSet<T2, H2, E2, A2>) -> Self
    where
        T: CopyFrom<T2>,
        H: Default,
        E: Default,
        A: Default,
        A2: Allocator,
    {
        Self::copy_from_with_extra_in(source, 0, A::default())
    }

    /// Builds a set from `source` that allocates from `allocator`.
    pub fn copy_from_in<T2, H2, E2, A2>(source: &HashSet<T2, H2, E2, A2>, allocator: A) -> Self
    where
        T: CopyFrom<T2>,
        H: Default,
        E: Default,
        A2: Allocator,
    {
        Self::copy_from_with_extra_in(source, 0, allocator)
    }

    /// Builds a set from `source` with room for `extra` more elements.
    pub fn copy_from_with_extra<T2, H2, E2, A2>(
        source: &HashSet<T2, H2, E2, A2>,
        extra: usize,
    ) -> Self
    where
        T: CopyFrom<T2>,
        H: Default,
        E: Default,
        A: Default,
        A2: Allocator,
    {
        Self::copy_from_with_extra_in(source, extra, A::default())
    }

    /// Builds a set from `source` with room for `extra` more elements,
    /// allocating from `allocator`.
    pub fn copy_from_with_extra_in<T2, H2, E2, A2>(
        source: &HashSet<T2, H2, E2, A2>,
        extra: usize,
        allocator: A,
    ) -> Self
    where
        T: CopyFrom<T2>,
        H: Default,
        E: Default,
        A2: Allocator,
    {
        Self::copy_from_parts(source, extra, H::default(), E::default(), allocator)
    }
}

/// An iterator over the elements of a `HashSet`.
pub struct Iter<'a, T> {
    inner: crate::hash_map::Keys<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// A draining iterator over the elements of a `HashSet`.
pub struct Drain<'a, T, A: Allocator = Global> {
    inner: crate::hash_map::Drain<'a, T, (), A>,
}

impl<T, A: Allocator> Iterator for Drain<'_, T, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An owning iterator over the elements of a `HashSet`.
pub struct IntoIter<T, A: Allocator = Global> {
    inner: crate::hash_map::IntoIter<T, (), A>,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, H, E, A: Allocator> IntoIterator for HashSet<T, H, E, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.map.into_iter(),
        }
    }
}

impl<'a, T, H, E, A: Allocator> IntoIterator for &'a HashSet<T, H, E, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, H, E, A> FromIterator<T> for HashSet<T, H, E, A>
where
    H: KeyHash<T> + Default,
    E: KeyEqual<T> + Default,
    A: Allocator + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|v| (v, ())).collect(),
        }
    }
}

impl<T, H, E, A> Extend<T> for HashSet<T, H, E, A>
where
    H: KeyHash<T>,
    E: KeyEqual<T>,
    A: Allocator,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.map.extend(iter.into_iter().map(|v| (v, ())));
    }
}

impl<T, const N: usize> From<[T; N]> for HashSet<T>
where
    DefaultHash: KeyHash<T>,
    DefaultEqual: KeyEqual<T>,
{
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::hash::BuildHasherDefault;

    use siphasher::sip::SipHasher;

    use super::*;
    use crate::test_util::CountingAllocator;

    type SipSet<T, A = Global> =
        HashSet<T, DefaultHash<BuildHasherDefault<SipHasher>>, DefaultEqual, A>;

    #[test]
    fn insert_and_contains() {
        let mut set: SipSet<i32> = SipSet::default();

        assert!(set.insert(1));
        assert!(set.insert(2));
        assert!(!set.insert(1));

        assert_eq!(set.len(), 2);
        assert!(set.contains(&1));
        assert!(set.contains(&2));
        assert!(!set.contains(&3));
    }

    #[test]
    fn remove_and_take() {
        let mut set: SipSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        assert!(set.remove(&"a".to_string()));
        assert!(!set.remove(&"a".to_string()));
        assert_eq!(set.take(&"b".to_string()), Some("b".to_string()));
        assert_eq!(set.get(&"c".to_string()), Some(&"c".to_string()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn reserve_and_clear() {
        let alloc = CountingAllocator::default();
        let mut set: SipSet<u32, _> = HashSet::new_in(alloc.clone());
        set.reserve(0);
        assert_eq!((set.max_count(), alloc.allocations()), (0, 0));

        set.reserve(20);
        assert!(set.max_count() >= 20);
        set.extend(0..20);
        assert_eq!(alloc.allocations(), 1);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.slack(), set.max_count());
    }

    #[test]
    fn iter_and_drain() {
        let mut set: SipSet<u32> = (0..10).collect();
        let mut items: Vec<u32> = set.iter().copied().collect();
        items.sort_unstable();
        assert_eq!(items, (0..10).collect::<Vec<_>>());

        let mut drained: Vec<u32> = set.drain().collect();
        drained.sort_unstable();
        assert_eq!(drained, items);
        assert!(set.is_empty());
    }

    #[test]
    fn into_iterator() {
        let set: SipSet<&str> = ["x", "y"].into_iter().collect();
        let mut items: Vec<&str> = set.into_iter().collect();
        items.sort_unstable();
        assert_eq!(items, ["x", "y"]);
    }

    #[test]
    fn subset_and_disjoint() {
        let small: SipSet<u8> = [1, 2].into_iter().collect();
        let large: HashSet<u8> = HashSet::from([1, 2, 3]);
        let other: SipSet<u8> = [7, 8].into_iter().collect();

        assert!(small.is_subset(&large));
        assert!(!large.is_subset(&small));
        assert!(small.is_disjoint(&other));
        assert!(!small.is_disjoint(&large));
    }

    #[test]
    fn copies_and_equality() {
        let alloc = CountingAllocator::default();
        let source: SipSet<i16> = (-8..8).collect();

        let copy: SipSet<u16, _> = HashSet::copy_from_in(&source, alloc.clone());
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(copy.len(), 16);
        assert!(copy.contains(&u16::MAX));

        let same: SipSet<i16> = HashSet::copy_from_with_extra(&source, 100);
        assert!(same.max_count() >= 116);
        assert_eq!(same, source);
        assert_eq!(source.clone(), source);
    }

    #[test]
    fn relocate_adopts_storage() {
        let alloc = CountingAllocator::default();
        let mut set: SipSet<u64, _> = HashSet::new_in(alloc.clone());
        set.extend([1, 2, 3]);
        let moved = set.relocate_in(alloc.clone());
        assert_eq!(alloc.allocations(), 1);
        assert!(moved.contains(&2));
    }

    #[test]
    fn debug_output() {
        let set: HashSet<u8> = HashSet::from([5]);
        assert_eq!(format!("{set:?}"), "{5}");
    }
}
