/// Sparse unbounded bitset backed by lazily materialized pages.
///
/// Pages live in an ordered map keyed by their starting position. A page is
/// created the moment a bit inside its range is first set and removed the
/// moment its last bit is cleared, so an empty page is never reachable.
/// Absence of a covering page means every bit in that range is unset.
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::mem;

use crate::budget::MemoryBudget;
use crate::error::Result;
use crate::page::{page_start, Page};

#[derive(Debug, Default)]
pub struct Bitset {
    pages: BTreeMap<usize, Box<Page>>,
    cardinality: usize,
    budget: MemoryBudget,
}

impl Bitset {
    /// Bitset with an unlimited budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Bitset charging its pages against `budget`
    pub fn with_budget(budget: MemoryBudget) -> Self {
        Self {
            pages: BTreeMap::new(),
            cardinality: 0,
            budget,
        }
    }

    /// Test the bit at `pos`
    pub fn test(&self, pos: usize) -> bool {
        let start = page_start(pos);
        match self.pages.get(&start) {
            Some(page) => page.test(pos - start),
            None => false,
        }
    }

    /// Set the bit at `pos`; `Ok(true)` iff the bit was clear.
    ///
    /// Lazily creates the covering page. The page is charged against the
    /// budget before it is inserted, so a failed charge leaves the bitset
    /// exactly as it was.
    pub fn set(&mut self, pos: usize) -> Result<bool> {
        let start = page_start(pos);
        let page = match self.pages.entry(start) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.budget.charge(mem::size_of::<Page>())?;
                entry.insert(Box::new(Page::new(start)))
            }
        };
        if page.set(pos - start) {
            self.cardinality += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Clear the bit at `pos`; true iff the bit was set.
    ///
    /// Clearing the last bit of a page removes the page immediately.
    pub fn clear(&mut self, pos: usize) -> bool {
        let start = page_start(pos);
        let now_empty = match self.pages.get_mut(&start) {
            Some(page) => {
                if !page.clear(pos - start) {
                    return false;
                }
                page.is_empty()
            }
            None => return false,
        };
        self.cardinality -= 1;
        if now_empty {
            self.pages.remove(&start);
            self.budget.release(mem::size_of::<Page>());
        }
        true
    }

    /// Number of set bits, maintained incrementally
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    /// Number of materialized pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Bytes of page storage currently held
    pub fn mem_used(&self) -> usize {
        self.pages.len() * mem::size_of::<Page>()
    }

    /// First page whose range starts at or after `pos`, if any
    pub(crate) fn first_page_at_or_after(&self, pos: usize) -> Option<&Page> {
        self.pages.range(pos..).next().map(|(_, page)| page.as_ref())
    }
}

impl Drop for Bitset {
    fn drop(&mut self) {
        self.budget.release(self.pages.len() * mem::size_of::<Page>());
    }
}
