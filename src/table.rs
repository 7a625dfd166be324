//! An open-addressing hash table keyed by interned string handles. Used both
//! for the VM's global-variable bindings and, as a set (value ignored), for
//! the string-interning table — grounded directly on `original_source`'s
//! `table.c`, since the teacher reaches for `hashbrown`/`std::HashMap`
//! everywhere this spec calls for a hand-rolled table.

use crate::object::{Heap, ObjRef};
use crate::value::Value;

const MAX_LOAD_FACTOR: f64 = 0.75;
const MIN_CAPACITY: usize = 8;

#[derive(Clone, Copy)]
enum Slot {
    /// Never occupied, or occupied then its probe chain never continued.
    Empty,
    /// Previously occupied; key content no longer matters, but the slot must
    /// keep participating in probe chains until the next rehash.
    Tombstone,
    Live(ObjRef, u32, Value),
}

/// Open-addressing table with linear probing. `capacity` is always a power
/// of two once non-zero, because [`grow`](Table::grow) only ever doubles it.
pub struct Table {
    entries: Vec<Slot>,
    /// Occupied *and* tombstone slots — this is what load-factor checks
    /// against, matching the spec's `count` semantics.
    count: usize,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    pub fn new() -> Self {
        Self { entries: Vec::new(), count: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Probes from `hash mod capacity`, returning the index of either the
    /// live entry matching `key` by handle identity, or the slot where such
    /// an entry should be inserted (preferring a remembered tombstone over a
    /// fresh empty slot, so tombstones get reclaimed on insert).
    fn find_entry(entries: &[Slot], capacity: usize, key: ObjRef, hash: u32) -> usize {
        let mut index = (hash as usize) % capacity;
        let mut tombstone: Option<usize> = None;

        loop {
            match entries[index] {
                Slot::Live(k, _, _) if k == key => return index,
                Slot::Empty => return tombstone.unwrap_or(index),
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Slot::Live(_, _, _) => {}
            }
            index = (index + 1) % capacity;
        }
    }

    fn grow(&mut self) {
        let new_capacity = if self.entries.is_empty() { MIN_CAPACITY } else { self.entries.len() * 2 };

        let mut new_entries = vec![Slot::Empty; new_capacity];
        let mut new_count = 0;

        for slot in &self.entries {
            if let Slot::Live(key, hash, value) = *slot {
                let dest = Self::find_entry(&new_entries, new_capacity, key, hash);
                new_entries[dest] = Slot::Live(key, hash, value);
                new_count += 1;
            }
        }

        self.entries = new_entries;
        self.count = new_count;
    }

    pub fn get(&self, key: ObjRef, hash: u32) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        let idx = Self::find_entry(&self.entries, self.entries.len(), key, hash);
        match self.entries[idx] {
            Slot::Live(_, _, value) => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, key: ObjRef, hash: u32) -> bool {
        self.get(key, hash).is_some()
    }

    /// Inserts or overwrites `key`. Returns `true` iff the slot was
    /// previously empty (not a reused tombstone) — this is the fixed
    /// behavior of the spec's `is_new = entry.key.is_none()`, correcting the
    /// `isNew = entry->key = NULL` assignment bug in the original source.
    pub fn set(&mut self, key: ObjRef, hash: u32, value: Value) -> bool {
        if self.count + 1 > ((self.entries.len() as f64) * MAX_LOAD_FACTOR) as usize {
            self.grow();
        }

        let idx = Self::find_entry(&self.entries, self.entries.len(), key, hash);
        let is_new = matches!(self.entries[idx], Slot::Empty);

        if is_new {
            self.count += 1;
        }
        self.entries[idx] = Slot::Live(key, hash, value);
        is_new
    }

    /// Replaces a live entry with a tombstone. Tombstones keep counting
    /// toward `count` for load-factor purposes until the next rehash drops
    /// them.
    pub fn delete(&mut self, key: ObjRef, hash: u32) -> bool {
        if self.count == 0 {
            return false;
        }
        let idx = Self::find_entry(&self.entries, self.entries.len(), key, hash);
        match self.entries[idx] {
            Slot::Live(_, _, _) => {
                self.entries[idx] = Slot::Tombstone;
                true
            }
            _ => false,
        }
    }

    /// Looks up an interned string by content rather than by handle — the
    /// one operation that must compare bytes instead of identities, since by
    /// construction there is no handle yet for the string being interned.
    pub fn find_string(&self, heap: &Heap, chars: &[u8], hash: u32) -> Option<ObjRef> {
        if self.count == 0 {
            return None;
        }

        let capacity = self.entries.len();
        let mut index = (hash as usize) % capacity;

        loop {
            match self.entries[index] {
                Slot::Empty => return None,
                Slot::Live(key, entry_hash, _) => {
                    if entry_hash == hash {
                        let candidate = heap.get_string(key);
                        if candidate.hash == hash && candidate.bytes.as_bytes() == chars {
                            return Some(key);
                        }
                    }
                }
                Slot::Tombstone => {}
            }
            index = (index + 1) % capacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{fnv1a_hash, Object, StringObj};

    fn intern(heap: &mut Heap, s: &str) -> (ObjRef, u32) {
        let hash = fnv1a_hash(s.as_bytes());
        let r = heap.alloc(Object::Str(StringObj { bytes: s.into(), hash }));
        (r, hash)
    }

    #[test]
    fn set_reports_new_vs_overwrite() {
        let mut heap = Heap::new();
        let (key, hash) = intern(&mut heap, "a");
        let mut table = Table::new();

        assert!(table.set(key, hash, Value::Number(1.0)));
        assert!(!table.set(key, hash, Value::Number(2.0)));
        assert_eq!(table.get(key, hash).unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn delete_then_get_returns_none_but_keeps_probe_chain() {
        let mut heap = Heap::new();
        let (a, ha) = intern(&mut heap, "a");
        let (b, hb) = intern(&mut heap, "b");
        let mut table = Table::new();

        table.set(a, ha, Value::Number(1.0));
        table.set(b, hb, Value::Number(2.0));
        assert!(table.delete(a, ha));
        assert!(table.get(a, ha).is_none());
        // b must still be reachable even though a's slot, which may sit on
        // b's probe chain, is now a tombstone.
        assert_eq!(table.get(b, hb).unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn grows_past_load_factor() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        for i in 0..100 {
            let (key, hash) = intern(&mut heap, &format!("key{i}"));
            table.set(key, hash, Value::Number(i as f64));
        }
        assert_eq!(table.len(), 100);
        assert!(table.capacity() >= 100);
        for i in 0..100 {
            let hash = fnv1a_hash(format!("key{i}").as_bytes());
            let found = table.find_string(&heap, format!("key{i}").as_bytes(), hash);
            assert!(found.is_some());
        }
    }

    #[test]
    fn find_string_matches_by_content() {
        let mut heap = Heap::new();
        let (key, hash) = intern(&mut heap, "hello");
        let mut table = Table::new();
        table.set(key, hash, Value::Nil);

        let found = table.find_string(&heap, b"hello", hash);
        assert_eq!(found, Some(key));
        assert!(table.find_string(&heap, b"goodbye", fnv1a_hash(b"goodbye")).is_none());
    }
}
