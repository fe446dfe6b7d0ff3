//! The bucket engine behind [`HashMap`](super::HashMap) and
//! [`Hashtable`](super::Hashtable).
//!
//! Entries live in an arena and are chained through `next` indexes; the
//! bucket vector only stores chain heads. Growth swaps in a new bucket
//! vector and relinks the existing entries, so an entry never moves out of
//! its arena slot while it is in the table.

use std::borrow::Borrow;
use std::ops::{Index, IndexMut};

use super::spread::{
    MAXIMUM_CAPACITY, PLACEHOLDER_CAPACITY, bucket_index, capacity_for_mappings, table_capacity,
    threshold_for,
};
use crate::identity::MapIdentity;

/// Index of an entry inside a [`RawTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EntryId(usize);

/// One key/value pair plus its cached spread hash.
#[derive(Clone, Debug)]
pub(crate) struct HashEntry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u32,
    next: Option<EntryId>,
}

/// Chained hash table over a power-of-two bucket vector.
#[derive(Clone, Debug)]
pub(crate) struct RawTable<K, V> {
    entries: Vec<Option<HashEntry<K, V>>>,
    free: Vec<usize>,
    buckets: Vec<Option<EntryId>>,
    length: usize,
    /// Growth is triggered once `length + outside` exceeds this
    threshold: usize,
    /// Entries the owning map holds outside the buckets, such as its
    /// null-key slot. They count towards the threshold.
    outside: usize,
    modification_count: u64,
    identity: MapIdentity,
}

impl<K, V> RawTable<K, V> {
    /// The two-bucket table every default map starts with. Its zero
    /// threshold makes the first insertion grow it.
    pub(crate) fn placeholder() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            buckets: vec![None; PLACEHOLDER_CAPACITY],
            length: 0,
            threshold: 0,
            outside: 0,
            modification_count: 0,
            identity: MapIdentity::new(),
        }
    }

    /// A table sized for a requested capacity (see [`table_capacity`]).
    pub(crate) fn with_capacity(requested: usize) -> Self {
        let capacity = table_capacity(requested);
        if capacity == PLACEHOLDER_CAPACITY {
            return Self::placeholder();
        }
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            buckets: vec![None; capacity],
            length: 0,
            threshold: threshold_for(capacity),
            outside: 0,
            modification_count: 0,
            identity: MapIdentity::new(),
        }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) const fn modification_count(&self) -> u64 {
        self.modification_count
    }

    #[inline]
    pub(crate) const fn identity(&self) -> u64 {
        self.identity.get()
    }

    /// Records how many entries the owning map holds outside the buckets.
    #[inline]
    pub(crate) const fn set_outside(&mut self, count: usize) {
        self.outside = count;
    }

    /// Records a structural change made outside the table, such as to the
    /// null-key slot of a [`HashMap`](super::HashMap).
    #[inline]
    pub(crate) const fn record_modification(&mut self) {
        self.modification_count = self.modification_count.wrapping_add(1);
    }

    pub(crate) fn get(&self, id: EntryId) -> Option<&HashEntry<K, V>> {
        self.entries.get(id.0).and_then(Option::as_ref)
    }

    fn allocate(&mut self, entry: HashEntry<K, V>) -> EntryId {
        if let Some(index) = self.free.pop() {
            self.entries[index] = Some(entry);
            EntryId(index)
        } else {
            self.entries.push(Some(entry));
            EntryId(self.entries.len() - 1)
        }
    }

    fn release(&mut self, id: EntryId) -> HashEntry<K, V> {
        match self.entries[id.0].take() {
            Some(entry) => {
                self.free.push(id.0);
                entry
            }
            None => panic!("entry {id:?} is not live"),
        }
    }

    /// Finds the entry for `key`, comparing the cached hash before equality.
    pub(crate) fn find<Q>(&self, hash: u32, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut current = self.buckets[bucket_index(hash, self.capacity())];
        while let Some(id) = current {
            let entry = &self[id];
            if entry.hash == hash && Borrow::<Q>::borrow(&entry.key) == key {
                return Some(id);
            }
            current = entry.next;
        }
        None
    }

    /// Inserts `key`, or overwrites the value of an equal key in place.
    ///
    /// A new key counts towards the threshold before it is linked, so when
    /// growth is due the entry is placed in the grown table. Entries held
    /// outside the buckets count as well.
    pub(crate) fn insert(&mut self, hash: u32, key: K, value: V) -> Option<V>
    where
        K: Eq,
    {
        if let Some(id) = self.find(hash, &key) {
            return Some(std::mem::replace(&mut self[id].value, value));
        }
        self.modification_count = self.modification_count.wrapping_add(1);
        self.length += 1;
        if self.length + self.outside > self.threshold {
            self.double_capacity();
        }
        let index = bucket_index(hash, self.capacity());
        let id = self.allocate(HashEntry {
            key,
            value,
            hash,
            next: self.buckets[index],
        });
        self.buckets[index] = Some(id);
        None
    }

    /// Removes the entry for `key`.
    pub(crate) fn remove<Q>(&mut self, hash: u32, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let id = self.find(hash, key)?;
        Some(self.remove_id(id))
    }

    /// Unlinks a live entry from its chain and frees its slot.
    pub(crate) fn remove_id(&mut self, id: EntryId) -> (K, V) {
        let index = bucket_index(self[id].hash, self.capacity());
        let mut previous: Option<EntryId> = None;
        let mut current = self.buckets[index];
        while let Some(candidate) = current {
            if candidate == id {
                break;
            }
            previous = Some(candidate);
            current = self[candidate].next;
        }
        let next = self[id].next;
        match previous {
            Some(previous) => self[previous].next = next,
            None => self.buckets[index] = next,
        }
        self.modification_count = self.modification_count.wrapping_add(1);
        self.length -= 1;
        let entry = self.release(id);
        (entry.key, entry.value)
    }

    /// Drops every entry, keeping the current bucket count.
    pub(crate) fn clear(&mut self) {
        self.buckets.fill(None);
        self.entries.clear();
        self.free.clear();
        self.length = 0;
        self.outside = 0;
    }

    /// Doubles the bucket count. Every chain splits in two on the bit
    /// `hash & old_capacity`: entries with the bit clear stay at index `j`,
    /// the others move to `j | old_capacity`. Runs of entries that stay
    /// together are relinked as a whole, and each half keeps the relative
    /// order of the old chain.
    pub(crate) fn double_capacity(&mut self) {
        let old_capacity = self.capacity();
        if old_capacity == MAXIMUM_CAPACITY {
            return;
        }
        let new_capacity = old_capacity * 2;
        let old_buckets = std::mem::replace(&mut self.buckets, vec![None; new_capacity]);
        self.threshold = threshold_for(new_capacity);
        tracing::debug!(
            old_capacity,
            new_capacity,
            entries = self.length,
            "doubled hash table capacity"
        );
        if self.length == 0 {
            return;
        }

        for (index, head) in old_buckets.into_iter().enumerate() {
            let Some(head) = head else {
                continue;
            };
            let mut high_bit = self[head].hash as usize & old_capacity;
            self.buckets[index | high_bit] = Some(head);
            // Tail of the most recently finished run of the other half.
            let mut broken: Option<EntryId> = None;
            let mut previous = head;
            let mut current = self[head].next;
            while let Some(entry) = current {
                let next_high_bit = self[entry].hash as usize & old_capacity;
                if next_high_bit != high_bit {
                    match broken {
                        Some(tail) => self[tail].next = Some(entry),
                        None => self.buckets[index | next_high_bit] = Some(entry),
                    }
                    broken = Some(previous);
                    high_bit = next_high_bit;
                }
                previous = entry;
                current = self[entry].next;
            }
            if let Some(tail) = broken {
                self[tail].next = None;
            }
        }
    }

    /// Grows the table so that `mappings` entries fit with room to spare.
    ///
    /// Does nothing when the table is already large enough. A growth of
    /// exactly one doubling goes through [`RawTable::double_capacity`];
    /// larger jumps rehash every chain into the new buckets in one pass.
    /// Growing counts as a structural modification, since it reorders
    /// iteration.
    pub(crate) fn ensure_capacity(&mut self, mappings: usize) {
        let new_capacity = capacity_for_mappings(mappings).next_power_of_two();
        let old_capacity = self.capacity();
        if new_capacity <= old_capacity {
            return;
        }
        self.modification_count = self.modification_count.wrapping_add(1);
        if new_capacity == old_capacity * 2 {
            self.double_capacity();
            return;
        }

        let old_buckets = std::mem::replace(&mut self.buckets, vec![None; new_capacity]);
        self.threshold = threshold_for(new_capacity);
        tracing::debug!(
            old_capacity,
            new_capacity,
            entries = self.length,
            "rehashed hash table"
        );
        for head in old_buckets {
            let mut current = head;
            while let Some(entry) = current {
                current = self[entry].next;
                let index = bucket_index(self[entry].hash, new_capacity);
                self[entry].next = self.buckets[index];
                self.buckets[index] = Some(entry);
            }
        }
    }

    /// First entry in iteration order: bucket order, then chain order.
    pub(crate) fn first(&self) -> Option<EntryId> {
        self.head_from(0)
    }

    /// Entry after `id` in iteration order.
    pub(crate) fn successor(&self, id: EntryId) -> Option<EntryId> {
        let entry = &self[id];
        entry
            .next
            .or_else(|| self.head_from(bucket_index(entry.hash, self.capacity()) + 1))
    }

    fn head_from(&self, start: usize) -> Option<EntryId> {
        self.buckets.iter().skip(start).find_map(|head| *head)
    }

    pub(crate) const fn iter(&self) -> Entries<'_, K, V> {
        Entries {
            table: self,
            next: None,
            started: false,
            remaining: self.length,
        }
    }

    /// Consumes the table, yielding its entries in iteration order.
    pub(crate) fn into_entries(mut self) -> Vec<(K, V)> {
        let mut order = Vec::with_capacity(self.length);
        let mut current = self.first();
        while let Some(id) = current {
            order.push(id);
            current = self.successor(id);
        }
        order
            .into_iter()
            .map(|id| {
                let entry = self.release(id);
                (entry.key, entry.value)
            })
            .collect()
    }

    /// Checks bucket placement, the entry count and the load threshold.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let capacity = self.capacity();
        assert!(capacity.is_power_of_two());
        let mut counted = 0;
        for (index, head) in self.buckets.iter().enumerate() {
            let mut current = *head;
            while let Some(id) = current {
                let entry = &self[id];
                assert_eq!(bucket_index(entry.hash, capacity), index);
                counted += 1;
                current = entry.next;
            }
        }
        assert_eq!(counted, self.length);
        assert!(self.length <= self.threshold || capacity == MAXIMUM_CAPACITY);
        // Only an entry added outside the buckets may pass the threshold.
        assert!(
            self.length + self.outside <= self.threshold + 1 || capacity == MAXIMUM_CAPACITY
        );
    }
}

impl<K, V> Index<EntryId> for RawTable<K, V> {
    type Output = HashEntry<K, V>;

    fn index(&self, id: EntryId) -> &Self::Output {
        match &self.entries[id.0] {
            Some(entry) => entry,
            None => panic!("entry {id:?} is not live"),
        }
    }
}

impl<K, V> IndexMut<EntryId> for RawTable<K, V> {
    fn index_mut(&mut self, id: EntryId) -> &mut Self::Output {
        match &mut self.entries[id.0] {
            Some(entry) => entry,
            None => panic!("entry {id:?} is not live"),
        }
    }
}

/// Borrowing iterator over the entries of a [`RawTable`].
pub(crate) struct Entries<'a, K, V> {
    table: &'a RawTable<K, V>,
    next: Option<EntryId>,
    started: bool,
    remaining: usize,
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let current = if self.started {
            self.next?
        } else {
            self.started = true;
            self.table.first()?
        };
        self.next = self.table.successor(current);
        self.remaining -= 1;
        let entry = &self.table[current];
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Entries<'_, K, V> {}

impl<K, V> std::iter::FusedIterator for Entries<'_, K, V> {}
