//! Open-addressing hash table with tombstones and quadratic probing.

use std::fmt;

use crate::error::RoutingError;

/// Anything stored in a [`HashTable`] exposes an integer key.
pub trait TableEntry {
    /// Key used for hashing and equality.
    fn key(&self) -> u64;
}

/// State of a single bucket.
///
/// `Empty` ends a probe sequence; `Tombstone` marks a removed entry and is
/// probed through so entries placed past it stay reachable.
#[derive(Debug, Clone, PartialEq)]
pub enum Bucket<T> {
    /// Never used since the table was (re)built.
    Empty,
    /// Previously occupied, now removed.
    Tombstone,
    /// Holds an entry.
    Occupied(T),
}

impl<T> Bucket<T> {
    /// Returns `true` if the bucket holds an entry.
    pub fn is_occupied(&self) -> bool {
        matches!(self, Bucket::Occupied(_))
    }

    fn into_value(self) -> Option<T> {
        match self {
            Bucket::Occupied(v) => Some(v),
            _ => None,
        }
    }
}

/// An entry [`HashTable::insert`] could not place, handed back intact.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected<T> {
    /// The entry that found no free bucket.
    pub item: T,
    /// Bucket count at the time of the failure.
    pub capacity: usize,
}

impl<T> Rejected<T> {
    /// Takes back the rejected entry.
    pub fn into_item(self) -> T {
        self.item
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hash table full at capacity {}", self.capacity)
    }
}

impl<T: fmt::Debug> std::error::Error for Rejected<T> {}

impl<T> From<Rejected<T>> for RoutingError {
    fn from(rejected: Rejected<T>) -> Self {
        RoutingError::TableFull {
            capacity: rejected.capacity,
        }
    }
}

/// A fixed-bucket-array associative container keyed by [`TableEntry::key`].
///
/// The `i`-th probe for key `k` lands on
/// `(k + c1·i + c2·i²) mod capacity`. With `c1 = c2 = 0` the table falls
/// back to linear probing, `(k + i) mod capacity`.
///
/// Occupancy never exceeds half the capacity after an insert: crossing that
/// line doubles the bucket array and re-inserts every entry.
///
/// # Complexity
///
/// Insert, search, and remove are O(1) on average and O(capacity) when
/// every probed bucket collides.
///
/// # Examples
///
/// ```
/// use u_dispatch::store::{HashTable, TableEntry};
///
/// #[derive(Debug, PartialEq)]
/// struct Parcel(u64);
///
/// impl TableEntry for Parcel {
///     fn key(&self) -> u64 { self.0 }
/// }
///
/// let mut table = HashTable::with_capacity(4);
/// table.insert(Parcel(3)).unwrap();
/// table.insert(Parcel(7)).unwrap();
/// assert_eq!(table.search(7), Some(&Parcel(7)));
/// assert_eq!(table.remove(3), Some(Parcel(3)));
/// assert!(table.search(3).is_none());
/// assert_eq!(table.search(7), Some(&Parcel(7)));
/// ```
#[derive(Debug, Clone)]
pub struct HashTable<T> {
    buckets: Vec<Bucket<T>>,
    occupied: usize,
    c1: u64,
    c2: u64,
}

impl<T: TableEntry> HashTable<T> {
    /// Initial bucket count used by [`HashTable::new`].
    pub const DEFAULT_CAPACITY: usize = 20;

    /// Creates a linear-probing table with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a linear-probing table with `capacity` buckets (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_probing(capacity, 0, 0)
    }

    /// Creates a table with quadratic probe constants `c1` and `c2`.
    pub fn with_probing(capacity: usize, c1: u64, c2: u64) -> Self {
        Self {
            buckets: empty_buckets(capacity.max(1)),
            occupied: 0,
            c1,
            c2,
        }
    }

    /// Bucket index of the `attempt`-th probe for `key`.
    fn probe(&self, key: u64, attempt: usize) -> usize {
        let capacity = self.buckets.len() as u128;
        let i = attempt as u128;
        let offset = if self.c1 == 0 && self.c2 == 0 {
            i
        } else {
            u128::from(self.c1) * i + u128::from(self.c2) * i * i
        };
        ((u128::from(key) + offset) % capacity) as usize
    }

    /// Full probe sequence for `key` at the current capacity.
    pub fn probe_sequence(&self, key: u64) -> Vec<usize> {
        (0..self.buckets.len())
            .map(|attempt| self.probe(key, attempt))
            .collect()
    }

    /// Inserts `item`, replacing any entry with the same key.
    ///
    /// Returns the replaced entry, if any. When `capacity` probes find no
    /// free bucket the entry comes back in [`Rejected`], which converts into
    /// [`RoutingError::TableFull`].
    pub fn insert(&mut self, item: T) -> Result<Option<T>, Rejected<T>> {
        if let Some(index) = self.find(item.key()) {
            let previous = std::mem::replace(&mut self.buckets[index], Bucket::Occupied(item));
            return Ok(previous.into_value());
        }

        let capacity = self.buckets.len();
        if let Err(item) = self.place(item) {
            return Err(Rejected { item, capacity });
        }
        if self.occupied * 2 > capacity {
            self.rebuild(capacity * 2);
        }
        Ok(None)
    }

    /// Finds the entry stored under `key`.
    pub fn search(&self, key: u64) -> Option<&T> {
        let index = self.find(key)?;
        match &self.buckets[index] {
            Bucket::Occupied(v) => Some(v),
            _ => None,
        }
    }

    /// Finds the entry stored under `key` for in-place update.
    ///
    /// The key itself must not be changed through this reference.
    pub fn search_mut(&mut self, key: u64) -> Option<&mut T> {
        let index = self.find(key)?;
        match &mut self.buckets[index] {
            Bucket::Occupied(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` if an entry is stored under `key`.
    pub fn contains(&self, key: u64) -> bool {
        self.find(key).is_some()
    }

    /// Removes and returns the entry under `key`, leaving a tombstone.
    pub fn remove(&mut self, key: u64) -> Option<T> {
        let index = self.find(key)?;
        let removed = std::mem::replace(&mut self.buckets[index], Bucket::Tombstone);
        self.occupied -= 1;
        removed.into_value()
    }

    /// Entries matching `predicate`, in bucket order.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.all().filter(|v| predicate(*v)).collect()
    }

    /// Iterates over all entries in bucket order.
    pub fn all(&self) -> impl Iterator<Item = &T> + '_ {
        self.buckets.iter().filter_map(|b| match b {
            Bucket::Occupied(v) => Some(v),
            _ => None,
        })
    }

    /// Bucket at `index`, for inspection.
    pub fn bucket(&self, index: usize) -> Option<&Bucket<T>> {
        self.buckets.get(index)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Ratio of occupied buckets to capacity.
    pub fn load_factor(&self) -> f64 {
        self.occupied as f64 / self.buckets.len() as f64
    }

    /// Bucket index holding `key`; only `Empty` stops the walk.
    fn find(&self, key: u64) -> Option<usize> {
        for attempt in 0..self.buckets.len() {
            let index = self.probe(key, attempt);
            match &self.buckets[index] {
                Bucket::Empty => return None,
                Bucket::Occupied(v) if v.key() == key => return Some(index),
                _ => {}
            }
        }
        None
    }

    /// Stores `item` in the first unoccupied bucket of its probe sequence.
    fn place(&mut self, item: T) -> Result<usize, T> {
        let key = item.key();
        for attempt in 0..self.buckets.len() {
            let index = self.probe(key, attempt);
            if !self.buckets[index].is_occupied() {
                self.buckets[index] = Bucket::Occupied(item);
                self.occupied += 1;
                return Ok(index);
            }
        }
        Err(item)
    }

    /// Re-inserts every entry into a fresh array of at least `capacity`
    /// buckets, doubling again if the probe constants cannot place them all.
    fn rebuild(&mut self, mut capacity: usize) {
        let mut entries: Vec<T> = std::mem::take(&mut self.buckets)
            .into_iter()
            .filter_map(Bucket::into_value)
            .collect();

        loop {
            tracing::debug!(capacity, entries = entries.len(), "rebuilding hash table");
            self.buckets = empty_buckets(capacity);
            self.occupied = 0;
            match self.place_all(entries) {
                Ok(()) => return,
                Err(rest) => {
                    entries = rest;
                    capacity *= 2;
                }
            }
        }
    }

    fn place_all(&mut self, entries: Vec<T>) -> Result<(), Vec<T>> {
        let mut pending = entries.into_iter();
        while let Some(entry) = pending.next() {
            if let Err(entry) = self.place(entry) {
                let mut rest: Vec<T> = std::mem::take(&mut self.buckets)
                    .into_iter()
                    .filter_map(Bucket::into_value)
                    .collect();
                rest.push(entry);
                rest.extend(pending);
                return Err(rest);
            }
        }
        Ok(())
    }
}

impl<T: TableEntry> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_buckets<T>(capacity: usize) -> Vec<Bucket<T>> {
    (0..capacity).map(|_| Bucket::Empty).collect()
}

impl<T: fmt::Display> fmt::Display for HashTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bucket) in self.buckets.iter().enumerate() {
            match bucket {
                Bucket::Empty => writeln!(f, "{i:2}: empty")?,
                Bucket::Tombstone => writeln!(f, "{i:2}: removed")?,
                Bucket::Occupied(v) => writeln!(f, "{i:2}: {v}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u64,
        tag: u32,
    }

    impl TableEntry for Item {
        fn key(&self) -> u64 {
            self.id
        }
    }

    impl fmt::Display for Item {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "item {}", self.id)
        }
    }

    fn item(id: u64) -> Item {
        Item { id, tag: 0 }
    }

    #[test]
    fn test_insert_and_search() {
        let mut t = HashTable::new();
        for id in 1..=5 {
            assert_eq!(t.insert(item(id)), Ok(None));
        }
        assert_eq!(t.len(), 5);
        assert_eq!(t.search(3), Some(&item(3)));
        assert!(t.search(42).is_none());
        assert!(t.contains(1));
        assert_eq!(t.bucket(4), Some(&Bucket::Occupied(item(4))));
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let mut t = HashTable::new();
        t.insert(item(7)).expect("room");
        let old = t.insert(Item { id: 7, tag: 9 }).expect("room");
        assert_eq!(old, Some(item(7)));
        assert_eq!(t.len(), 1);
        assert_eq!(t.search(7).map(|i| i.tag), Some(9));
    }

    #[test]
    fn test_linear_probe_sequence() {
        let t: HashTable<Item> = HashTable::with_capacity(5);
        assert_eq!(t.probe_sequence(3), vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn test_quadratic_probe_sequence() {
        let t: HashTable<Item> = HashTable::with_probing(20, 1, 1);
        // 5 + i + i²
        assert_eq!(&t.probe_sequence(5)[..4], &[5, 7, 11, 17]);
    }

    #[test]
    fn test_collision_moves_to_next_bucket() {
        let mut t = HashTable::with_capacity(20);
        t.insert(item(3)).expect("room");
        t.insert(item(23)).expect("room");
        assert_eq!(t.bucket(3), Some(&Bucket::Occupied(item(3))));
        assert_eq!(t.bucket(4), Some(&Bucket::Occupied(item(23))));
    }

    #[test]
    fn test_search_probes_through_tombstone() {
        let mut t = HashTable::with_capacity(20);
        t.insert(item(3)).expect("room");
        t.insert(item(23)).expect("room");
        assert_eq!(t.remove(3), Some(item(3)));
        assert_eq!(t.bucket(3), Some(&Bucket::Tombstone));
        assert_eq!(t.search(23), Some(&item(23)));
        assert_eq!(t.len(), 1);

        // Tombstone is reused for the next colliding key.
        t.insert(item(43)).expect("room");
        assert_eq!(t.bucket(3), Some(&Bucket::Occupied(item(43))));
        assert_eq!(t.search(23), Some(&item(23)));
    }

    #[test]
    fn test_insert_after_tombstone_replaces_existing() {
        let mut t = HashTable::with_capacity(20);
        t.insert(item(3)).expect("room");
        t.insert(item(23)).expect("room");
        t.remove(3);
        // 23 lives past the tombstone; re-inserting must not duplicate it.
        t.insert(Item { id: 23, tag: 1 }).expect("room");
        assert_eq!(t.len(), 1);
        assert_eq!(t.filter(|i| i.id == 23).len(), 1);
    }

    #[test]
    fn test_remove_missing() {
        let mut t: HashTable<Item> = HashTable::new();
        assert!(t.remove(1).is_none());
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn test_resize_above_half() {
        let mut t = HashTable::with_capacity(4);
        t.insert(item(1)).expect("room");
        t.insert(item(2)).expect("room");
        assert_eq!(t.capacity(), 4);
        t.insert(item(3)).expect("room");
        assert_eq!(t.capacity(), 8);
        assert!(t.load_factor() <= 0.5);
        for id in 1..=3 {
            assert_eq!(t.search(id), Some(&item(id)));
        }
    }

    #[test]
    fn test_resize_drops_tombstones() {
        let mut t = HashTable::with_capacity(4);
        t.insert(item(1)).expect("room");
        t.insert(item(2)).expect("room");
        t.remove(1);
        t.insert(item(5)).expect("room");
        t.insert(item(6)).expect("room");
        assert_eq!(t.capacity(), 8);
        assert!((0..8).all(|i| t.bucket(i) != Some(&Bucket::Tombstone)));
    }

    #[test]
    fn test_table_full_with_degenerate_constants() {
        // 4·i² ≡ 0 (mod 4): every probe revisits the home bucket.
        let mut t = HashTable::with_probing(4, 0, 4);
        t.insert(item(1)).expect("room");
        let rejected = t.insert(Item { id: 5, tag: 3 }).expect_err("no free bucket");
        assert_eq!(rejected.capacity, 4);
        assert_eq!(rejected.to_string(), "hash table full at capacity 4");
        assert_eq!(t.len(), 1);
        assert!(t.search(5).is_none());

        let back = rejected.clone().into_item();
        assert_eq!(back, Item { id: 5, tag: 3 });
        assert_eq!(
            RoutingError::from(rejected),
            RoutingError::TableFull { capacity: 4 }
        );
    }

    #[test]
    fn test_filter_and_all() {
        let mut t = HashTable::new();
        for id in 1..=10 {
            t.insert(item(id)).expect("room");
        }
        let even: Vec<u64> = t.filter(|i| i.id % 2 == 0).iter().map(|i| i.id).collect();
        assert_eq!(even.len(), 5);
        assert!(even.iter().all(|id| id % 2 == 0));
        assert_eq!(t.all().count(), 10);
    }

    #[test]
    fn test_display_dump() {
        let mut t = HashTable::with_capacity(3);
        t.insert(item(1)).expect("room");
        let dump = t.to_string();
        assert!(dump.contains(" 0: empty"));
        assert!(dump.contains(" 1: item 1"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u64, u32),
        Remove(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..64, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            (0u64..64).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_matches_model(ops in prop::collection::vec(op(), 0..200), cap in 1usize..16) {
            let mut table = HashTable::with_capacity(cap);
            let mut model: HashMap<u64, u32> = HashMap::new();

            for op in ops {
                match op {
                    Op::Insert(id, tag) => {
                        let prev = table.insert(Item { id, tag }).expect("linear probing never fills");
                        prop_assert_eq!(prev.map(|i| i.tag), model.insert(id, tag));
                        prop_assert!(table.load_factor() <= 0.5);
                    }
                    Op::Remove(id) => {
                        prop_assert_eq!(table.remove(id).map(|i| i.tag), model.remove(&id));
                    }
                }
                prop_assert_eq!(table.len(), model.len());
            }

            for id in 0..64 {
                prop_assert_eq!(table.search(id).map(|i| i.tag), model.get(&id).copied());
            }
        }
    }
}
