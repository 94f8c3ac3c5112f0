/// Fixed-size bit page: the unit of storage and of bulk boolean work.
///
/// A page covers `PAGE_BITS` consecutive bit positions starting at
/// `first_pos` (always a multiple of `PAGE_BITS`) and keeps its own set-bit
/// count so a bitset can maintain a running total without rescanning.

/// Number of 64-bit words per page
pub const PAGE_WORDS: usize = 16;
/// Page payload size in bytes
pub const PAGE_BYTES: usize = PAGE_WORDS * 8;
/// Bit positions covered by one page
pub const PAGE_BITS: usize = PAGE_BYTES * 8;

/// First position of the page covering `pos`
#[inline]
pub fn page_start(pos: usize) -> usize {
    pos - pos % PAGE_BITS
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    first_pos: usize,
    cardinality: usize,
    words: [u64; PAGE_WORDS],
}

impl Page {
    /// Create a zeroed page starting at `first_pos`
    pub fn new(first_pos: usize) -> Self {
        Self {
            first_pos,
            cardinality: 0,
            words: [0; PAGE_WORDS],
        }
    }

    /// First bit position covered by this page
    #[inline]
    pub fn first_pos(&self) -> usize {
        self.first_pos
    }

    pub(crate) fn set_first_pos(&mut self, first_pos: usize) {
        self.first_pos = first_pos;
    }

    /// Number of set bits in this page
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    /// Test the bit at page-relative `offset`
    #[inline]
    pub fn test(&self, offset: usize) -> bool {
        debug_assert!(offset < PAGE_BITS);
        (self.words[offset / 64] >> (offset % 64)) & 1 == 1
    }

    /// Set the bit at page-relative `offset`; true iff the bit was clear
    pub fn set(&mut self, offset: usize) -> bool {
        debug_assert!(offset < PAGE_BITS);
        let mask = 1u64 << (offset % 64);
        let word = &mut self.words[offset / 64];
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.cardinality += 1;
        true
    }

    /// Clear the bit at page-relative `offset`; true iff the bit was set
    pub fn clear(&mut self, offset: usize) -> bool {
        debug_assert!(offset < PAGE_BITS);
        let mask = 1u64 << (offset % 64);
        let word = &mut self.words[offset / 64];
        if *word & mask == 0 {
            return false;
        }
        *word &= !mask;
        self.cardinality -= 1;
        true
    }

    /// Set every bit in the page
    pub fn set_ones(&mut self) {
        self.words = [u64::MAX; PAGE_WORDS];
        self.cardinality = PAGE_BITS;
    }

    /// Clear every bit in the page
    pub fn set_zeros(&mut self) {
        self.words = [0; PAGE_WORDS];
        self.cardinality = 0;
    }

    /// In-place AND with `other`, word at a time
    pub fn and_assign(&mut self, other: &Page) {
        let mut cardinality = 0;
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word &= *other_word;
            cardinality += word.count_ones() as usize;
        }
        self.cardinality = cardinality;
    }

    /// In-place AND-NOT with `other` (`self &= !other`), word at a time.
    /// An absent operand is all zeros, which makes AND-NOT a no-op; callers
    /// simply skip the call in that case.
    pub fn and_not_assign(&mut self, other: &Page) {
        let mut cardinality = 0;
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word &= !*other_word;
            cardinality += word.count_ones() as usize;
        }
        self.cardinality = cardinality;
    }

    /// In-place OR with `other`, word at a time
    pub fn or_assign(&mut self, other: &Page) {
        let mut cardinality = 0;
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word |= *other_word;
            cardinality += word.count_ones() as usize;
        }
        self.cardinality = cardinality;
    }

    #[inline]
    pub(crate) fn word(&self, index: usize) -> u64 {
        self.words[index]
    }
}

/// Resumable set-bit scanner over a single page.
///
/// Yields ascending page-relative offsets. The cursor keeps only a word
/// index and the unconsumed bits of the current word, so it stays valid
/// across calls as long as it is fed the same page it was started on.
#[derive(Clone, Debug, Default)]
pub struct PageCursor {
    word: usize,
    bits: u64,
}

impl PageCursor {
    /// Cursor positioned at the start of `page`
    pub fn start(page: &Page) -> Self {
        Self {
            word: 0,
            bits: page.word(0),
        }
    }

    /// Cursor that yields nothing
    pub fn exhausted() -> Self {
        Self {
            word: PAGE_WORDS,
            bits: 0,
        }
    }

    /// Next set-bit offset in `page`, or None when the page is consumed
    pub fn next(&mut self, page: &Page) -> Option<usize> {
        loop {
            if self.bits != 0 {
                let offset = self.bits.trailing_zeros() as usize;
                self.bits &= self.bits - 1;
                return Some(self.word * 64 + offset);
            }
            self.word += 1;
            if self.word >= PAGE_WORDS {
                return None;
            }
            self.bits = page.word(self.word);
        }
    }
}
