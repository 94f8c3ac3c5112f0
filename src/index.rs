/// Bitset index: an associative container mapping opaque byte-string keys
/// to unique integer values, organized for bit-pattern queries.
///
/// The index is a compressed bit matrix. Bitset 0 (existence) has bit v set
/// iff value v is present; bitset i+1 has bit v set iff the key stored for
/// value v has bit i set. One key may map to many values, but values are
/// globally unique — which is exactly why the existence bitset's
/// cardinality equals the index's logical size. Lookups by value are O(1)
/// and insert/remove cost scales with the number of set bits in the key,
/// not the key's width.
use std::mem;

use tracing::debug;

use crate::bitset::Bitset;
use crate::budget::MemoryBudget;
use crate::error::Result;
use crate::expr::{key_set_bits, Expr};
use crate::iterator::BitsetIterator;

#[derive(Debug)]
pub struct BitsetIndex {
    /// bitsets[0] is the existence bitset; bitsets[i + 1] tracks key bit i
    bitsets: Vec<Bitset>,
    budget: MemoryBudget,
}

impl BitsetIndex {
    /// Index with an unlimited budget
    pub fn new() -> Self {
        Self::with_budget(MemoryBudget::unlimited())
    }

    /// Index charging all internal bitsets against `budget`
    pub fn with_budget(budget: MemoryBudget) -> Self {
        let bitsets = vec![Bitset::with_budget(budget.clone())];
        Self { bitsets, budget }
    }

    /// Insert a (key, value) pair.
    ///
    /// `value` must not already be present (checked). The operation is
    /// atomic: on allocation failure every bit set during this call is
    /// cleared again and the index is left exactly as it was.
    pub fn insert(&mut self, key: &[u8], value: usize) -> Result<()> {
        assert!(
            !self.contains_value(value),
            "value {} is already present in the index",
            value
        );
        self.reserve_key_bits(key.len() * 8)?;

        let mut touched: Vec<usize> = Vec::with_capacity(key.len() * 8 + 1);
        if let Err(err) = self.set_key_bits(key, value, &mut touched) {
            for id in touched {
                self.bitsets[id].clear(value);
            }
            debug!(value, "rolled back failed bitset index insert");
            return Err(err);
        }
        Ok(())
    }

    fn set_key_bits(
        &mut self,
        key: &[u8],
        value: usize,
        touched: &mut Vec<usize>,
    ) -> Result<()> {
        if self.bitsets[0].set(value)? {
            touched.push(0);
        }
        for bit in key_set_bits(key) {
            if self.bitsets[bit + 1].set(value)? {
                touched.push(bit + 1);
            }
        }
        Ok(())
    }

    /// Grow the bitset array to cover `key_bits` key bits.
    ///
    /// A failed growth removes the partially added bitsets again, leaving
    /// the index unchanged.
    fn reserve_key_bits(&mut self, key_bits: usize) -> Result<()> {
        let needed = key_bits + 1;
        let old = self.bitsets.len();
        if needed <= old {
            return Ok(());
        }
        while self.bitsets.len() < needed {
            if let Err(err) = self.budget.charge(mem::size_of::<Bitset>()) {
                while self.bitsets.len() > old {
                    self.bitsets.pop();
                    self.budget.release(mem::size_of::<Bitset>());
                }
                return Err(err);
            }
            self.bitsets.push(Bitset::with_budget(self.budget.clone()));
        }
        debug!(
            from = old - 1,
            to = needed - 1,
            "grew bitset index key capacity"
        );
        Ok(())
    }

    /// Remove the pair with `value`, whatever its key was
    pub fn remove_value(&mut self, value: usize) {
        for bitset in &mut self.bitsets {
            bitset.clear(value);
        }
    }

    /// True iff some pair with `value` is present
    pub fn contains_value(&self, value: usize) -> bool {
        self.bitsets[0].test(value)
    }

    /// Number of pairs in the index
    pub fn len(&self) -> usize {
        self.bitsets[0].cardinality()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of pairs whose key has `bit` set; 0 beyond capacity
    pub fn count(&self, bit: usize) -> usize {
        if bit + 1 >= self.bitsets.len() {
            return 0;
        }
        self.bitsets[bit + 1].cardinality()
    }

    /// Widest key, in bits, the index currently covers
    pub fn capacity_bits(&self) -> usize {
        self.bitsets.len() - 1
    }

    /// Bytes of page storage held by all internal bitsets
    pub fn mem_used(&self) -> usize {
        self.bitsets.iter().map(Bitset::mem_used).sum()
    }

    /// Bind `expr` against this index's bitsets (id 0 = existence, id i+1 =
    /// key bit i) and return a ready iterator over matching values.
    ///
    /// Panics if the expression references a bit beyond `capacity_bits`;
    /// callers build expressions against keys no wider than the widest key
    /// inserted.
    pub fn iter_expr(&self, expr: &Expr) -> BitsetIterator<'_> {
        let refs: Vec<&Bitset> = self.bitsets.iter().collect();
        BitsetIterator::new(expr, &refs)
    }
}

impl Default for BitsetIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BitsetIndex {
    fn drop(&mut self) {
        // bitset 0 was never charged; growth charges are returned here
        self.budget
            .release((self.bitsets.len() - 1) * mem::size_of::<Bitset>());
    }
}
