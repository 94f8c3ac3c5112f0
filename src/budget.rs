/// Pluggable memory budget shared by every structure in the engine.
///
/// The engine never allocates through a custom allocator; instead, every
/// page allocation and index capacity growth is charged against an injected
/// budget before it happens. A budget with no limit never fails. A limited
/// budget lets callers (and tests) force an allocation failure at an exact
/// point and observe the documented recovery behavior.
use std::cell::Cell;
use std::rc::Rc;

use crate::error::{BitsetError, Result};

/// Cloneable handle to a shared allocation budget.
///
/// All clones observe the same counters. The engine is single-threaded, so
/// the handle is `Rc`-based and deliberately not `Send`.
#[derive(Clone, Debug, Default)]
pub struct MemoryBudget {
    inner: Rc<BudgetInner>,
}

#[derive(Debug, Default)]
struct BudgetInner {
    limit: Option<usize>,
    allocated: Cell<usize>,
}

impl MemoryBudget {
    /// Budget with no limit; charges always succeed
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Budget capped at `limit` live bytes
    pub fn with_limit(limit: usize) -> Self {
        Self {
            inner: Rc::new(BudgetInner {
                limit: Some(limit),
                allocated: Cell::new(0),
            }),
        }
    }

    /// Account for `bytes` of new memory, failing if the limit would be
    /// exceeded. A failed charge changes nothing.
    pub fn charge(&self, bytes: usize) -> Result<()> {
        let allocated = self.inner.allocated.get();
        if let Some(limit) = self.inner.limit {
            if allocated + bytes > limit {
                return Err(BitsetError::memory(
                    format!(
                        "budget exhausted: {} of {} bytes in use",
                        allocated, limit
                    ),
                    bytes,
                ));
            }
        }
        self.inner.allocated.set(allocated + bytes);
        Ok(())
    }

    /// Return `bytes` to the budget
    pub fn release(&self, bytes: usize) {
        let allocated = self.inner.allocated.get();
        self.inner.allocated.set(allocated.saturating_sub(bytes));
    }

    /// Live bytes currently charged
    pub fn allocated(&self) -> usize {
        self.inner.allocated.get()
    }

    /// Configured limit, if any
    pub fn limit(&self) -> Option<usize> {
        self.inner.limit
    }
}
