//! Copy-on-write paged storage for places.
//!
//! Items live in fixed-size pages behind `Arc`.  Cloning a [`Pages`] copies
//! only the page table; a write goes through `Arc::make_mut`, so it copies
//! the one page it touches while that page is still shared with an older
//! snapshot.  An association batch therefore costs the pages it updates,
//! not the whole catalog.

use std::sync::Arc;

/// Items per page.
pub const PAGE_LEN: usize = 1024;

#[derive(Clone)]
pub struct Pages<T> {
    pages: Vec<Arc<Vec<T>>>,
    len:   usize,
}

impl<T> Default for Pages<T> {
    fn default() -> Self {
        Self { pages: Vec::new(), len: 0 }
    }
}

impl<T: Clone> Pages<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.pages.get(slot / PAGE_LEN)?.get(slot % PAGE_LEN)
    }

    /// Mutable access to one item; unshares its page first.
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        let page = self.pages.get_mut(slot / PAGE_LEN)?;
        Arc::make_mut(page).get_mut(slot % PAGE_LEN)
    }

    /// Append `item` and return its slot.
    pub fn push(&mut self, item: T) -> usize {
        let slot = self.len;
        match self.pages.last_mut() {
            Some(page) if page.len() < PAGE_LEN => Arc::make_mut(page).push(item),
            _ => {
                let mut page = Vec::with_capacity(PAGE_LEN);
                page.push(item);
                self.pages.push(Arc::new(page));
            }
        }
        self.len += 1;
        slot
    }

    /// Items in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.pages.iter().flat_map(|page| page.iter())
    }

    /// Apply `f` to every item matching `pred`.  Pages without a match stay
    /// shared.  Returns the number of items updated.
    pub fn update_where(&mut self, pred: impl Fn(&T) -> bool, mut f: impl FnMut(&mut T)) -> usize {
        let mut updated = 0;
        for page in &mut self.pages {
            if !page.iter().any(&pred) {
                continue;
            }
            for item in Arc::make_mut(page).iter_mut() {
                if pred(&*item) {
                    f(item);
                    updated += 1;
                }
            }
        }
        updated
    }
}
