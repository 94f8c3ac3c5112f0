/// Integration tests for the bitset index: end-to-end query semantics,
/// insert atomicity under forced allocation failure, and a randomized
/// cross-check against a brute-force model.
use bitset_engine::{BitsetIndex, Expr, MemoryBudget};
use rand::prelude::*;
use std::collections::HashMap;

/// Three 3-bit keys exercising every canonical query builder
fn three_key_index() -> BitsetIndex {
    let mut index = BitsetIndex::new();
    index.insert(&[0b101], 1).unwrap();
    index.insert(&[0b110], 2).unwrap();
    index.insert(&[0b111], 3).unwrap();
    index
}

fn run(index: &BitsetIndex, expr: &Expr) -> Vec<usize> {
    index.iter_expr(expr).collect()
}

#[test]
fn test_three_key_scenario() {
    let index = three_key_index();
    assert_eq!(index.len(), 3);

    assert_eq!(run(&index, &Expr::all()), vec![1, 2, 3]);
    assert_eq!(run(&index, &Expr::all_set(&[0b100])), vec![1, 3]);
    assert_eq!(run(&index, &Expr::any_set(&[0b001])), vec![1, 3]);
    assert_eq!(run(&index, &Expr::all_not_set(&[0b001])), vec![2]);
    assert_eq!(run(&index, &Expr::equals(&[0b110])), vec![2]);
}

#[test]
fn test_equals_distinguishes_subset_keys() {
    let index = three_key_index();
    // 0b111 is a superset of 0b101; equals must not confuse them
    assert_eq!(run(&index, &Expr::equals(&[0b101])), vec![1]);
    assert_eq!(run(&index, &Expr::equals(&[0b111])), vec![3]);
    assert_eq!(run(&index, &Expr::equals(&[0b011])), Vec::<usize>::new());
}

#[test]
fn test_all_set_is_superset_of_equals() {
    let index = three_key_index();
    for key in [[0b101u8], [0b110], [0b111]] {
        let equals = run(&index, &Expr::equals(&key));
        let all_set = run(&index, &Expr::all_set(&key));
        for value in &equals {
            assert!(all_set.contains(value));
        }
    }
}

#[test]
fn test_remove_then_requery() {
    let mut index = three_key_index();
    index.remove_value(3);
    assert_eq!(index.len(), 2);
    assert_eq!(run(&index, &Expr::all_set(&[0b100])), vec![1]);
    assert_eq!(run(&index, &Expr::equals(&[0b111])), Vec::<usize>::new());

    // the freed value can be reused with a different key
    index.insert(&[0b010], 3).unwrap();
    assert_eq!(run(&index, &Expr::equals(&[0b010])), vec![3]);
    assert_eq!(run(&index, &Expr::all_set(&[0b010])), vec![2, 3]);
}

#[test]
fn test_insert_atomic_under_allocation_failure() {
    use bitset_engine::{Bitset, Page};
    use std::mem::size_of;

    // Exactly enough for one 8-bit key: 8 grown bitsets plus the existence
    // page and one key-bit page. The next fresh page must fail.
    let limit = 8 * size_of::<Bitset>() + 2 * size_of::<Page>();
    let mut index = BitsetIndex::with_budget(MemoryBudget::with_limit(limit));
    index.insert(&[0b01], 0).unwrap();

    let len_before = index.len();
    let mem_before = index.mem_used();
    let counts_before: Vec<usize> = (0..8).map(|bit| index.count(bit)).collect();

    // bit 0 lands on an existing page, bit 1 needs a fresh one and fails
    // partway through; the bits already set must be rolled back
    let err = index.insert(&[0b11], 1);
    assert!(err.is_err());

    // full rollback: nothing observable changed
    assert_eq!(index.len(), len_before);
    assert!(!index.contains_value(1));
    assert_eq!(index.mem_used(), mem_before);
    let counts_after: Vec<usize> = (0..8).map(|bit| index.count(bit)).collect();
    assert_eq!(counts_after, counts_before);

    // the index is still usable for inserts that fit
    index.insert(&[0b01], 1).unwrap();
    assert_eq!(index.len(), 2);
}

#[test]
fn test_iterator_outlives_expression() {
    let index = three_key_index();
    let mut it = {
        let expr = Expr::all_set(&[0b100]);
        index.iter_expr(&expr)
        // expr dropped here; the iterator keeps its own bound state
    };
    assert_eq!(it.next(), Some(1));
    assert_eq!(it.next(), Some(3));
    assert_eq!(it.next(), None);
}

#[test]
fn test_randomized_queries_match_model() {
    let mut rng = StdRng::seed_from_u64(0x1dec0de);
    let mut index = BitsetIndex::new();
    let mut model: HashMap<usize, u16> = HashMap::new();

    for value in 0..5000 {
        let key = rng.gen_range(0u16..64);
        index.insert(&key.to_le_bytes(), value).unwrap();
        model.insert(value, key);
    }
    // punch some holes so values are not contiguous
    for value in (0..5000).step_by(7) {
        index.remove_value(value);
        model.remove(&value);
    }

    for _ in 0..20 {
        let probe = rng.gen_range(0u16..64);
        let key = probe.to_le_bytes();

        let mut expect_equals: Vec<usize> = model
            .iter()
            .filter(|(_, k)| **k == probe)
            .map(|(v, _)| *v)
            .collect();
        expect_equals.sort_unstable();
        assert_eq!(run(&index, &Expr::equals(&key)), expect_equals);

        let mut expect_all_set: Vec<usize> = model
            .iter()
            .filter(|(_, k)| **k & probe == probe)
            .map(|(v, _)| *v)
            .collect();
        expect_all_set.sort_unstable();
        if probe != 0 {
            assert_eq!(run(&index, &Expr::all_set(&key)), expect_all_set);
        }

        let mut expect_any: Vec<usize> = model
            .iter()
            .filter(|(_, k)| **k & probe != 0)
            .map(|(v, _)| *v)
            .collect();
        expect_any.sort_unstable();
        assert_eq!(run(&index, &Expr::any_set(&key)), expect_any);

        let mut expect_none: Vec<usize> = model
            .iter()
            .filter(|(_, k)| **k & probe == 0)
            .map(|(v, _)| *v)
            .collect();
        expect_none.sort_unstable();
        assert_eq!(run(&index, &Expr::all_not_set(&key)), expect_none);
    }
}
