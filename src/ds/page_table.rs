//! Page table with page-granular recency ordering.
//!
//! Pages live in a slot arena and are linked by `SlotId` into a doubly
//! linked recency list, so lookup, touch and eviction of the least recently
//! accessed page are all O(1) and no raw pointers are involved.
//!
//! ## Architecture
//!
//! ```text
//!   index (FxHashMap<page_index, SlotId>)
//!   ┌────────────┬────────┐
//!   │ page_index │ SlotId │
//!   ├────────────┼────────┤
//!   │     0      │ id_2   │──┐
//!   │     3      │ id_0   │──┼──┐
//!   │     7      │ id_1   │──┼──┼──┐
//!   └────────────┴────────┘  │  │  │
//!                            ▼  ▼  ▼
//!   slots (Vec<Option<Node<T>>>)
//!
//!   head ─► [page 0] ◄──► [page 7] ◄──► [page 3] ◄── tail
//!           (MRU)                        (LRU, evicted first)
//! ```
//!
//! ## Staleness
//!
//! A page can be marked stale without being dropped. Stale pages keep their
//! slot and recency position but must be reloaded before their items are
//! served; the owner decides when to reload.

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

/// Stable handle to a slot in the page arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A contiguous block of items loaded by one provider call.
#[derive(Debug, Clone)]
pub struct Page<T> {
    index: usize,
    items: Vec<T>,
    stale: bool,
}

impl<T> Page<T> {
    pub fn new(index: usize, items: Vec<T>) -> Self {
        Self {
            index,
            items,
            stale: false,
        }
    }

    /// Page index, `floor(offset / batch_size)`.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Item at `offset` within this page.
    pub fn item(&self, offset: usize) -> Option<&T> {
        self.items.get(offset)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

#[derive(Debug)]
struct Node<T> {
    page: Page<T>,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Resident pages keyed by page index, ordered by access recency.
#[derive(Debug)]
pub struct PageTable<T> {
    slots: Vec<Option<Node<T>>>,
    free_list: Vec<usize>,
    index: FxHashMap<usize, SlotId>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> PageTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            index: FxHashMap::default(),
            head: None,
            tail: None,
        }
    }

    /// Number of resident pages, stale ones included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, page_index: usize) -> bool {
        self.index.contains_key(&page_index)
    }

    /// Returns the page without changing recency.
    pub fn peek(&self, page_index: usize) -> Option<&Page<T>> {
        let id = *self.index.get(&page_index)?;
        self.node(id).map(|node| &node.page)
    }

    /// Returns the page and marks it most recently used.
    pub fn touch(&mut self, page_index: usize) -> Option<&Page<T>> {
        let id = *self.index.get(&page_index)?;
        if self.head != Some(id) {
            self.detach(id);
            self.attach_front(id);
        }
        self.node(id).map(|node| &node.page)
    }

    /// Stores `page` as most recently used, replacing a resident page with
    /// the same index in place. Returns the replaced page.
    pub fn insert(&mut self, page: Page<T>) -> Option<Page<T>> {
        let page_index = page.index;
        if let Some(&id) = self.index.get(&page_index) {
            let previous = self
                .node_mut(id)
                .map(|node| std::mem::replace(&mut node.page, page));
            if self.head != Some(id) {
                self.detach(id);
                self.attach_front(id);
            }
            return previous;
        }

        let node = Node {
            page,
            prev: None,
            next: None,
        };
        let id = match self.free_list.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                SlotId(slot)
            },
            None => {
                self.slots.push(Some(node));
                SlotId(self.slots.len() - 1)
            },
        };
        self.index.insert(page_index, id);
        self.attach_front(id);
        None
    }

    /// Removes and returns the least recently used page.
    pub fn pop_lru(&mut self) -> Option<Page<T>> {
        let id = self.tail?;
        self.release(id)
    }

    pub fn remove(&mut self, page_index: usize) -> Option<Page<T>> {
        let id = *self.index.get(&page_index)?;
        self.release(id)
    }

    /// Marks a resident page stale. Returns `false` if it is not resident.
    pub fn mark_stale(&mut self, page_index: usize) -> bool {
        let Some(&id) = self.index.get(&page_index) else {
            return false;
        };
        match self.node_mut(id) {
            Some(node) => {
                node.page.stale = true;
                true
            },
            None => false,
        }
    }

    pub fn mark_all_stale(&mut self) {
        for node in self.slots.iter_mut().flatten() {
            node.page.stale = true;
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Pages from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &Page<T>> {
        let mut current = self.head;
        std::iter::from_fn(move || {
            let node = self.node(current?)?;
            current = node.next;
            Some(&node.page)
        })
    }

    /// Page indices from most to least recently used.
    pub fn recency_order(&self) -> Vec<usize> {
        self.iter().map(Page::index).collect()
    }

    /// Verifies arena, index and list agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head.is_none() != self.tail.is_none() {
            return Err(InvariantError::new("page list head/tail disagree"));
        }

        let mut count = 0usize;
        let mut prev = None;
        let mut current = self.head;
        while let Some(id) = current {
            let node = self
                .node(id)
                .ok_or_else(|| InvariantError::new(format!("dangling page slot {}", id.0)))?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "broken back link at page {}",
                    node.page.index
                )));
            }
            if self.index.get(&node.page.index) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "page {} missing from index",
                    node.page.index
                )));
            }
            count += 1;
            if count > self.index.len() {
                return Err(InvariantError::new("cycle in page recency list"));
            }
            prev = Some(id);
            current = node.next;
        }

        if self.tail != prev {
            return Err(InvariantError::new("page list tail is not the last node"));
        }
        if count != self.index.len() {
            return Err(InvariantError::new(format!(
                "page list has {count} nodes but index has {}",
                self.index.len()
            )));
        }
        Ok(())
    }

    fn node(&self, id: SlotId) -> Option<&Node<T>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: SlotId) -> Option<&mut Node<T>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    fn release(&mut self, id: SlotId) -> Option<Page<T>> {
        self.detach(id);
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.index.remove(&node.page.index);
        Some(node.page)
    }

    fn detach(&mut self, id: SlotId) {
        let Some((prev, next)) = self.node(id).map(|node| (node.prev, node.next)) else {
            return;
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = self.node_mut(prev_id) {
                    prev_node.next = next;
                }
            },
            None => self.head = next,
        }

        match next {
            Some(next_id) => {
                if let Some(next_node) = self.node_mut(next_id) {
                    next_node.prev = prev;
                }
            },
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_front(&mut self, id: SlotId) {
        let old_head = self.head;
        match self.node_mut(id) {
            Some(node) => {
                node.prev = None;
                node.next = old_head;
            },
            None => return,
        }
        match old_head {
            Some(head_id) => {
                if let Some(head_node) = self.node_mut(head_id) {
                    head_node.prev = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }
}

impl<T> Default for PageTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
