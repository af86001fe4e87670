use std::collections::BTreeMap;

/// A single row of the cross-reference table, keyed by object number in
/// [`XrefTable::entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// An object whose bytes begin at `offset` in the source buffer.
    Normal { offset: u32, generation: u16 },
    /// An object packed into the object stream `container` at `index`
    /// (§4.3 object streams; generation is always 0 for these).
    Compressed { container: u32, index: u16 },
    /// The head of the free-object linked list, or a link within it: points
    /// at the next free object number, `generation` is the one to reuse if
    /// this slot is ever occupied again.
    Free { next: u32, generation: u16 },
    /// A free-list entry with no further structure recoverable (e.g. when
    /// reconstructing a table from a damaged file). Treated identically to
    /// `Free { next: 0, .. }` for traversal purposes.
    UnusableFree,
}

/// The cross-reference table plus the bookkeeping needed to merge in
/// previous-revision tables from a `/Prev` chain (§4.3, §8.2 S2/S4).
#[derive(Debug, Clone, Default)]
pub struct XrefTable {
    pub entries: BTreeMap<u32, XrefEntry>,
    /// `/Size`: one past the highest object number ever in use.
    pub size: u32,
}

impl XrefTable {
    pub fn new(size: u32) -> Self {
        XrefTable {
            entries: BTreeMap::new(),
            size,
        }
    }

    pub fn get(&self, object_number: u32) -> Option<&XrefEntry> {
        self.entries.get(&object_number)
    }

    pub fn add_entry(&mut self, object_number: u32, entry: XrefEntry) {
        self.entries.insert(object_number, entry);
    }

    pub fn max_id(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    /// Folds an earlier revision's table (`prev`, from a `/Prev` pointer)
    /// into this one: entries already present in `self` (the newer
    /// revision) shadow the older ones, per an incremental update's
    /// semantics.
    pub fn merge(&mut self, prev: XrefTable) {
        for (object_number, entry) in prev.entries {
            self.entries.entry(object_number).or_insert(entry);
        }
        self.size = self.size.max(prev.size);
    }

    /// Rebuilds the free-object linked list so that it threads every entry
    /// currently marked `Free`/`UnusableFree` into one chain ending at
    /// object 0, matching the shape the writer needs to emit a classic xref
    /// table (§4.4, §8.3 free-list rebuild).
    pub fn rebuild_free_list(&mut self) {
        let mut free_numbers: Vec<u32> = self
            .entries
            .iter()
            .filter(|(&num, entry)| num != 0 && matches!(entry, XrefEntry::Free { .. } | XrefEntry::UnusableFree))
            .map(|(&num, _)| num)
            .collect();
        free_numbers.sort_unstable();

        let mut next = 0u32;
        for &num in free_numbers.iter().rev() {
            self.entries.insert(num, XrefEntry::Free { next, generation: 0 });
            next = num;
        }
        self.entries.insert(
            0,
            XrefEntry::Free {
                next,
                generation: 65535,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_newer_entries() {
        let mut newer = XrefTable::new(3);
        newer.add_entry(1, XrefEntry::Normal { offset: 100, generation: 0 });

        let mut older = XrefTable::new(3);
        older.add_entry(1, XrefEntry::Normal { offset: 50, generation: 0 });
        older.add_entry(2, XrefEntry::Normal { offset: 80, generation: 0 });

        newer.merge(older);

        assert_eq!(newer.get(1), Some(&XrefEntry::Normal { offset: 100, generation: 0 }));
        assert_eq!(newer.get(2), Some(&XrefEntry::Normal { offset: 80, generation: 0 }));
    }

    #[test]
    fn rebuild_free_list_threads_through_object_zero() {
        let mut table = XrefTable::new(4);
        table.add_entry(0, XrefEntry::Free { next: 0, generation: 65535 });
        table.add_entry(1, XrefEntry::Normal { offset: 10, generation: 0 });
        table.add_entry(2, XrefEntry::UnusableFree);
        table.add_entry(3, XrefEntry::UnusableFree);

        table.rebuild_free_list();

        assert_eq!(table.get(0), Some(&XrefEntry::Free { next: 2, generation: 65535 }));
        assert_eq!(table.get(2), Some(&XrefEntry::Free { next: 3, generation: 0 }));
        assert_eq!(table.get(3), Some(&XrefEntry::Free { next: 0, generation: 0 }));
    }

    #[test]
    fn max_id_tracks_highest_object_number() {
        let mut table = XrefTable::new(1);
        table.add_entry(5, XrefEntry::Normal { offset: 0, generation: 0 });
        table.add_entry(2, XrefEntry::Normal { offset: 0, generation: 0 });
        assert_eq!(table.max_id(), 5);
    }
}
