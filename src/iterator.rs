/// Lazy DNF evaluator over a family of bitsets.
///
/// The iterator never materializes intermediate bitsets. Each conjunction
/// keeps a synchronized page cursor (`page_first_pos`); one page of results
/// is produced at a time by ANDing the positive-term pages at the current
/// position, AND-NOTing the negated-term pages present there and ORing the
/// per-conjunction results together. Matching positions are then scanned
/// out of the result page one by one, in strictly ascending order.
use crate::bitset::Bitset;
use crate::expr::Expr;
use crate::page::{Page, PageCursor, PAGE_BITS};

/// Sentinel position for a conjunction that can contribute no more matches
const EXHAUSTED: usize = usize::MAX;

struct IterTerm<'a> {
    bitset: &'a Bitset,
    negated: bool,
    page: Option<&'a Page>,
}

struct IterConj<'a> {
    /// Position of the page this conjunction is currently parked on,
    /// monotonically non-decreasing; EXHAUSTED once spent
    page_first_pos: usize,
    terms: Vec<IterTerm<'a>>,
}

impl<'a> IterConj<'a> {
    /// Advance every term's page cursor to the first page at or after `pos`.
    ///
    /// The floor rises to the highest first_pos among positive-term pages;
    /// whenever it rises the scan restarts so all positive terms agree on
    /// one page window. A positive term with no page left exhausts the
    /// conjunction. Negated terms impose no requirement: an absent page is
    /// all zeros and AND-NOT with zeros changes nothing.
    fn rewind(&mut self, pos: usize) {
        debug_assert_eq!(pos % PAGE_BITS, 0);
        debug_assert!(self.page_first_pos == EXHAUSTED || self.page_first_pos <= pos);
        if self.terms.is_empty() {
            self.page_first_pos = EXHAUSTED;
            return;
        }

        let mut floor = pos;
        'restart: loop {
            for index in 0..self.terms.len() {
                let bitset = self.terms[index].bitset;
                let page = bitset.first_page_at_or_after(floor);
                self.terms[index].page = page;
                if self.terms[index].negated {
                    continue;
                }
                match page {
                    None => {
                        self.page_first_pos = EXHAUSTED;
                        return;
                    }
                    Some(page) if page.first_pos() > floor => {
                        floor = page.first_pos();
                        continue 'restart;
                    }
                    Some(_) => {}
                }
            }
            break;
        }
        self.page_first_pos = floor;
    }

    /// Combine this conjunction's pages at `page_first_pos` into `dst`
    fn prepare_page(&self, dst: &mut Page) {
        debug_assert!(!self.terms.is_empty());
        debug_assert_ne!(self.page_first_pos, EXHAUSTED);

        dst.set_ones();
        for term in &self.terms {
            if !term.negated {
                // rewound to page_first_pos already
                if let Some(page) = term.page {
                    debug_assert_eq!(page.first_pos(), self.page_first_pos);
                    dst.and_assign(page);
                }
            } else if let Some(page) = term.page {
                // A negated term only contributes when its bitset has a
                // page at exactly this position; otherwise the page is all
                // zeros and AND-NOT is a no-op.
                if page.first_pos() == self.page_first_pos {
                    dst.and_not_assign(page);
                }
            }
        }
    }
}

/// Pull-based iterator over the positions where a DNF expression holds.
///
/// Borrows the bitsets it is bound to, so they cannot be mutated while the
/// iterator is alive. Owns one result page and one scratch page, reused
/// across calls.
pub struct BitsetIterator<'a> {
    conjs: Vec<IterConj<'a>>,
    page: Box<Page>,
    page_tmp: Box<Page>,
    cursor: PageCursor,
}

impl<'a> BitsetIterator<'a> {
    /// Bind `expr`'s bitset ids to `bitsets` and rewind to the start.
    ///
    /// Panics if the expression references an id outside `bitsets`.
    pub fn new(expr: &Expr, bitsets: &[&'a Bitset]) -> Self {
        let mut conjs = Vec::with_capacity(expr.conjs().len());
        for conj in expr.conjs() {
            let mut terms = Vec::with_capacity(conj.len());
            for term in conj {
                assert!(
                    term.bitset_id < bitsets.len(),
                    "expression references bitset {} but only {} are bound",
                    term.bitset_id,
                    bitsets.len()
                );
                terms.push(IterTerm {
                    bitset: bitsets[term.bitset_id],
                    negated: term.negated,
                    page: None,
                });
            }
            conjs.push(IterConj {
                page_first_pos: 0,
                terms,
            });
        }

        let mut it = Self {
            conjs,
            page: Box::new(Page::new(EXHAUSTED)),
            page_tmp: Box::new(Page::new(0)),
            cursor: PageCursor::exhausted(),
        };
        it.rewind();
        it
    }

    /// Reset all conjunctions to position 0 and produce the first page.
    /// Safe to call at any time.
    pub fn rewind(&mut self) {
        for conj in &mut self.conjs {
            conj.page_first_pos = 0;
            conj.rewind(0);
        }
        self.prepare_page();
    }

    /// Produce the result page for the lowest conjunction position
    fn prepare_page(&mut self) {
        self.conjs.sort_unstable_by_key(|conj| conj.page_first_pos);

        let first_pos = match self.conjs.first() {
            Some(conj) => conj.page_first_pos,
            None => EXHAUSTED,
        };
        self.page.set_zeros();
        self.page.set_first_pos(first_pos);
        if first_pos == EXHAUSTED {
            self.cursor = PageCursor::exhausted();
            return;
        }

        for conj in &self.conjs {
            if conj.page_first_pos > first_pos {
                break;
            }
            conj.prepare_page(&mut self.page_tmp);
            self.page.or_assign(&self.page_tmp);
        }

        self.cursor = PageCursor::start(&self.page);
    }

    /// Advance every conjunction parked on the current page and re-produce
    fn next_page(&mut self) {
        let pos = self.page.first_pos();
        for conj in &mut self.conjs {
            if conj.page_first_pos > pos {
                break;
            }
            conj.rewind(pos + PAGE_BITS);
            debug_assert!(conj.page_first_pos >= pos + PAGE_BITS);
        }
        self.prepare_page();
    }

    /// Next matching position, or None once all conjunctions are spent
    pub fn next_pos(&mut self) -> Option<usize> {
        loop {
            if self.page.first_pos() == EXHAUSTED {
                return None;
            }
            if let Some(offset) = self.cursor.next(&self.page) {
                return Some(self.page.first_pos() + offset);
            }
            self.next_page();
        }
    }
}

impl Iterator for BitsetIterator<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.next_pos()
    }
}
