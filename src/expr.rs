/// Boolean expressions over bitsets in disjunctive normal form.
///
/// An expression is pure plan data: a list of conjunctions, each a list of
/// (bitset id, negated) terms. It references bitsets only by integer id;
/// ids are resolved when an iterator is bound. Id 0 is the index's
/// existence bitset, id i+1 stands for bit i of the key domain.
use serde::{Deserialize, Serialize};

/// Bitset id of the index's existence bitset
pub const EXISTENCE_ID: usize = 0;

/// One membership test inside a conjunction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprTerm {
    pub bitset_id: usize,
    pub negated: bool,
}

/// DNF expression: OR over conjunctions, AND over each conjunction's terms
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    conjs: Vec<Vec<ExprTerm>>,
}

impl Expr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all conjunctions but keep allocated capacity for reuse
    pub fn clear(&mut self) {
        self.conjs.clear();
    }

    /// Append an empty conjunction
    pub fn add_conj(&mut self) {
        self.conjs.push(Vec::new());
    }

    /// Append a term to the most recently added conjunction.
    ///
    /// Panics if no conjunction has been added yet.
    pub fn add_term(&mut self, bitset_id: usize, negated: bool) {
        let conj = self
            .conjs
            .last_mut()
            .expect("add_term called on an expression with no conjunction");
        conj.push(ExprTerm { bitset_id, negated });
    }

    pub fn conjs(&self) -> &[Vec<ExprTerm>] {
        &self.conjs
    }

    pub fn is_empty(&self) -> bool {
        self.conjs.is_empty()
    }

    /// Matches every value present in the index
    pub fn all() -> Self {
        let mut expr = Self::new();
        expr.add_conj();
        expr.add_term(EXISTENCE_ID, false);
        expr
    }

    /// Matches values whose stored key exactly equals `key`.
    ///
    /// One positive term per set bit, one negated term per clear bit within
    /// the key's byte width, anchored by the existence bitset.
    pub fn equals(key: &[u8]) -> Self {
        let mut expr = Self::new();
        expr.add_conj();
        expr.add_term(EXISTENCE_ID, false);
        for bit in 0..key.len() * 8 {
            expr.add_term(bit + 1, !key_bit(key, bit));
        }
        expr
    }

    /// Matches values where every set bit of `key` is set in the stored key
    pub fn all_set(key: &[u8]) -> Self {
        let mut expr = Self::new();
        expr.add_conj();
        for bit in key_set_bits(key) {
            expr.add_term(bit + 1, false);
        }
        expr
    }

    /// Matches values where at least one set bit of `key` is set in the
    /// stored key: one single-term conjunction per set bit
    pub fn any_set(key: &[u8]) -> Self {
        let mut expr = Self::new();
        for bit in key_set_bits(key) {
            expr.add_conj();
            expr.add_term(bit + 1, false);
        }
        expr
    }

    /// Matches values where every set bit of `key` is clear in the stored
    /// key. The existence term anchors the otherwise all-negated
    /// conjunction to values actually present.
    pub fn all_not_set(key: &[u8]) -> Self {
        let mut expr = Self::new();
        expr.add_conj();
        expr.add_term(EXISTENCE_ID, false);
        for bit in key_set_bits(key) {
            expr.add_term(bit + 1, true);
        }
        expr
    }
}

/// Bit `bit` of `key`, LSB-first within each byte
#[inline]
pub(crate) fn key_bit(key: &[u8], bit: usize) -> bool {
    (key[bit / 8] >> (bit % 8)) & 1 == 1
}

/// Ascending positions of the set bits of `key`
pub(crate) fn key_set_bits(key: &[u8]) -> impl Iterator<Item = usize> + '_ {
    key.iter().enumerate().flat_map(|(byte, &bits)| {
        (0..8).filter_map(move |bit| {
            if (bits >> bit) & 1 == 1 {
                Some(byte * 8 + bit)
            } else {
                None
            }
        })
    })
}
