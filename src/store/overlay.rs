//! Pending mutation overlay.
//!
//! Three disjoint collections layered over the backing set:
//!
//! ```text
//!   Added     Vec<T>                     insertion order, no ids assigned
//!   Modified  order: Vec<Id>             id → latest content
//!             items: FxHashMap<Id, T>
//!   Removed   order: Vec<Id>             id → (content, backing index)
//!             entries: FxHashMap<Id, RemovedEntry<T>>
//!             positions: Vec<usize>      sorted backing indices of removed
//!                                        entries, used for index translation
//! ```
//!
//! Everything is keyed by id, never by page, so evicting cached pages never
//! loses mutation state.
//!
//! Removed positions are exact against the id ordering they were recorded
//! under. When that ordering is refreshed they become provisional: still used
//! for translation and sizing, but re-derived with
//! [`Overlay::relocate_removed`] once the fresh ids are materialized.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

#[derive(Debug, Clone)]
pub(crate) struct RemovedEntry<T> {
    item: T,
    backing_index: Option<usize>,
}

#[derive(Debug)]
pub(crate) struct Overlay<T, Id> {
    added: Vec<T>,
    modified_order: Vec<Id>,
    modified: FxHashMap<Id, T>,
    removed_order: Vec<Id>,
    removed: FxHashMap<Id, RemovedEntry<T>>,
    positions: Vec<usize>,
    positions_confirmed: bool,
}

impl<T, Id> Overlay<T, Id>
where
    T: Clone,
    Id: Clone + Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self {
            added: Vec::new(),
            modified_order: Vec::new(),
            modified: FxHashMap::default(),
            removed_order: Vec::new(),
            removed: FxHashMap::default(),
            positions: Vec::new(),
            positions_confirmed: true,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.added.clear();
        self.modified_order.clear();
        self.modified.clear();
        self.removed_order.clear();
        self.removed.clear();
        self.positions.clear();
        self.positions_confirmed = true;
    }

    // -- Added ------------------------------------------------------------

    pub(crate) fn added(&self) -> &[T] {
        &self.added
    }

    /// Appends to Added and returns the ordinal of the new entry.
    pub(crate) fn push_added(&mut self, item: T) -> usize {
        self.added.push(item);
        self.added.len() - 1
    }

    pub(crate) fn replace_added(&mut self, ordinal: usize, item: T) -> Option<T> {
        self.added
            .get_mut(ordinal)
            .map(|slot| std::mem::replace(slot, item))
    }

    pub(crate) fn remove_added(&mut self, ordinal: usize) -> Option<T> {
        (ordinal < self.added.len()).then(|| self.added.remove(ordinal))
    }

    // -- Modified ---------------------------------------------------------

    pub(crate) fn is_modified(&self, id: &Id) -> bool {
        self.modified.contains_key(id)
    }

    pub(crate) fn modified_item(&self, id: &Id) -> Option<&T> {
        self.modified.get(id)
    }

    /// Records `item` as modified. Returns `true` if the id was not
    /// already tracked; repeat calls only replace the stored content.
    pub(crate) fn mark_modified(&mut self, id: Id, item: T) -> bool {
        if let Some(slot) = self.modified.get_mut(&id) {
            *slot = item;
            return false;
        }
        self.modified_order.push(id.clone());
        self.modified.insert(id, item);
        true
    }

    pub(crate) fn take_modified(&mut self, id: &Id) -> Option<T> {
        let item = self.modified.remove(id)?;
        self.modified_order.retain(|existing| existing != id);
        Some(item)
    }

    // -- Removed ----------------------------------------------------------

    pub(crate) fn is_removed(&self, id: &Id) -> bool {
        self.removed.contains_key(id)
    }

    /// Moves `id` into Removed at `backing_index`. Returns `false` if it
    /// was already removed.
    pub(crate) fn mark_removed(&mut self, id: Id, item: T, backing_index: usize) -> bool {
        if self.removed.contains_key(&id) {
            return false;
        }
        if let Err(slot) = self.positions.binary_search(&backing_index) {
            self.positions.insert(slot, backing_index);
        }
        self.removed_order.push(id.clone());
        self.removed.insert(
            id,
            RemovedEntry {
                item,
                backing_index: Some(backing_index),
            },
        );
        true
    }

    /// Replaces the stored content of a removed entry.
    pub(crate) fn replace_removed(&mut self, id: &Id, item: T) -> bool {
        match self.removed.get_mut(id) {
            Some(entry) => {
                entry.item = item;
                true
            },
            None => false,
        }
    }

    /// Removed positions below `backing_count`; positions past the end of a
    /// shrunken backing set shift nothing.
    pub(crate) fn removed_before(&self, backing_count: usize) -> usize {
        self.positions.partition_point(|&position| position < backing_count)
    }

    /// Whether positions were recorded against an id ordering that has since
    /// been refreshed.
    pub(crate) fn positions_provisional(&self) -> bool {
        !self.positions_confirmed && !self.removed.is_empty()
    }

    pub(crate) fn invalidate_positions(&mut self) {
        if !self.removed.is_empty() {
            self.positions_confirmed = false;
        }
    }

    /// Re-derives backing positions of removed entries against a fresh id
    /// ordering. Returns the ids that could no longer be located; they stay
    /// in Removed but no longer shift indices.
    pub(crate) fn relocate_removed(&mut self, backing_ids: &[Id]) -> Vec<Id> {
        let lookup: FxHashMap<&Id, usize> = backing_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id, index))
            .collect();

        let mut missing = Vec::new();
        self.positions.clear();
        for id in &self.removed_order {
            let Some(entry) = self.removed.get_mut(id) else {
                continue;
            };
            entry.backing_index = lookup.get(id).copied();
            match entry.backing_index {
                Some(index) => self.positions.push(index),
                None => missing.push(id.clone()),
            }
        }
        self.positions.sort_unstable();
        self.positions.dedup();
        self.positions_confirmed = true;
        missing
    }

    // -- Index translation ------------------------------------------------

    /// Maps an index into the visible backing sequence (backing items minus
    /// removed ones) onto a raw backing index.
    ///
    /// Exact only while positions are not provisional.
    pub(crate) fn to_backing(&self, visible: usize) -> usize {
        let mut backing = visible;
        for &removed in &self.positions {
            if removed <= backing {
                backing += 1;
            } else {
                break;
            }
        }
        backing
    }

    /// Inverse of [`to_backing`](Self::to_backing). `None` for removed
    /// positions.
    pub(crate) fn to_visible(&self, backing: usize) -> Option<usize> {
        match self.positions.binary_search(&backing) {
            Ok(_) => None,
            Err(before) => Some(backing - before),
        }
    }

    // -- Snapshots --------------------------------------------------------

    pub(crate) fn added_items(&self) -> Vec<T> {
        self.added.clone()
    }

    pub(crate) fn modified_items(&self) -> Vec<T> {
        self.modified_order
            .iter()
            .filter_map(|id| self.modified.get(id).cloned())
            .collect()
    }

    pub(crate) fn removed_items(&self) -> Vec<T> {
        self.removed_order
            .iter()
            .filter_map(|id| self.removed.get(id).map(|entry| entry.item.clone()))
            .collect()
    }

    pub(crate) fn counts(&self) -> (usize, usize, usize) {
        (self.added.len(), self.modified.len(), self.removed.len())
    }

    pub(crate) fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.modified_order.len() != self.modified.len() {
            return Err(InvariantError::new("modified order and map disagree"));
        }
        if self.removed_order.len() != self.removed.len() {
            return Err(InvariantError::new("removed order and map disagree"));
        }
        if self.modified.keys().any(|id| self.removed.contains_key(id)) {
            return Err(InvariantError::new("an id is both modified and removed"));
        }
        if self.positions.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(InvariantError::new("removed positions are not strictly ascending"));
        }
        if self.positions.len() > self.removed.len() {
            return Err(InvariantError::new("more removed positions than removed entries"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> Overlay<&'static str, &'static str> {
        Overlay::new()
    }

    #[test]
    fn translation_skips_removed_positions() {
        let mut ov = overlay();
        // backing: a b c d e ; remove b (1) and d (3)
        ov.mark_removed("b", "b", 1);
        ov.mark_removed("d", "d", 3);

        let visible: Vec<usize> = (0..3).map(|v| ov.to_backing(v)).collect();
        assert_eq!(visible, vec![0, 2, 4]);

        assert_eq!(ov.to_visible(0), Some(0));
        assert_eq!(ov.to_visible(1), None);
        assert_eq!(ov.to_visible(2), Some(1));
        assert_eq!(ov.to_visible(4), Some(2));
        ov.check_invariants().unwrap();
    }

    #[test]
    fn translation_with_adjacent_removals() {
        let mut ov = overlay();
        ov.mark_removed("a", "a", 0);
        ov.mark_removed("b", "b", 1);
        assert_eq!(ov.to_backing(0), 2);
        assert_eq!(ov.to_visible(2), Some(0));
    }

    #[test]
    fn mark_modified_is_idempotent_and_keeps_latest() {
        let mut ov = overlay();
        assert!(ov.mark_modified("x", "x1"));
        assert!(!ov.mark_modified("x", "x2"));
        assert_eq!(ov.modified_items(), vec!["x2"]);
        assert_eq!(ov.take_modified(&"x"), Some("x2"));
        assert!(ov.is_empty());
    }

    #[test]
    fn double_removal_is_not_recorded() {
        let mut ov = overlay();
        assert!(ov.mark_removed("c", "c", 2));
        assert!(!ov.mark_removed("c", "c", 2));
        assert_eq!(ov.removed_items(), vec!["c"]);
        assert_eq!(ov.removed_before(usize::MAX), 1);
    }

    #[test]
    fn relocate_rederives_positions() {
        let mut ov = overlay();
        ov.mark_removed("c", "c", 2);
        ov.mark_removed("z", "z", 4);
        ov.invalidate_positions();
        assert!(ov.positions_provisional());
        assert_eq!(ov.removed_before(4), 1);

        // "a" was deleted upstream, shifting "c" to position 1; "z" vanished
        let missing = ov.relocate_removed(&["b", "c", "d"]);
        assert_eq!(missing, vec!["z"]);
        assert!(!ov.positions_provisional());
        assert_eq!(ov.removed_before(usize::MAX), 1);
        assert_eq!(ov.to_backing(1), 2);
        assert_eq!(ov.removed_items(), vec!["c", "z"]);
    }

    #[test]
    fn added_entries_keep_insertion_order() {
        let mut ov = overlay();
        assert_eq!(ov.push_added("f"), 0);
        assert_eq!(ov.push_added("g"), 1);
        assert_eq!(ov.replace_added(0, "F"), Some("f"));
        assert_eq!(ov.added(), &["F", "g"]);
        assert_eq!(ov.remove_added(5), None);
        assert_eq!(ov.remove_added(0), Some("F"));
        assert_eq!(ov.counts(), (1, 0, 0));
    }

    #[test]
    fn clear_drops_everything() {
        let mut ov = overlay();
        ov.push_added("f");
        ov.mark_modified("a", "a");
        ov.mark_removed("b", "b", 1);
        ov.invalidate_positions();
        ov.clear();
        assert!(ov.is_empty());
        assert!(!ov.positions_provisional());
        assert_eq!(ov.to_backing(1), 1);
    }
}
