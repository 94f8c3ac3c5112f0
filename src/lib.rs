//! # Bitset Engine
//!
//! A paged sparse bitset engine with lazy DNF expression evaluation and an
//! associative bitset index built on top of it.
//!
//! ## Quick Start
//!
//! ```rust
//! use bitset_engine::{BitsetIndex, Expr};
//!
//! let mut index = BitsetIndex::new();
//!
//! // keys are opaque byte strings; values must be unique
//! index.insert(&[0b101], 1).unwrap();
//! index.insert(&[0b110], 2).unwrap();
//! index.insert(&[0b111], 3).unwrap();
//!
//! // all values whose key has bit 2 set, in ascending order
//! let values: Vec<usize> = index.iter_expr(&Expr::all_set(&[0b100])).collect();
//! assert_eq!(values, vec![1, 3]);
//! ```
//!
//! ## Features
//!
//! - **Sparse**: bit positions are unbounded; pages materialize lazily and
//!   disappear the moment they empty
//! - **Lazy evaluation**: DNF expressions are evaluated page by page with
//!   bulk word operations, never materializing intermediate bitsets
//! - **Deterministic failure**: an injected [`MemoryBudget`] makes every
//!   allocation fallible and index inserts atomic under failure
//!
//! The engine is single-threaded and does no I/O; callers needing shared
//! access provide their own synchronization.

pub mod bitset;
pub mod budget;
pub mod error;
pub mod expr;
pub mod index;
pub mod iterator;
pub mod page;

pub use bitset::Bitset;
pub use budget::MemoryBudget;
pub use error::{BitsetError, Result};
pub use expr::{Expr, ExprTerm, EXISTENCE_ID};
pub use index::BitsetIndex;
pub use iterator::BitsetIterator;
pub use page::{Page, PAGE_BITS, PAGE_BYTES, PAGE_WORDS};
