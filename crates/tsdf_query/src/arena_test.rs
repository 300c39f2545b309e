use rayon::prelude::*;

use super::*;

#[test]
fn test_push_until_full() {
  let arena = BoundedArena::with_capacity(3);
  assert!(arena.is_empty());
  assert_eq!(arena.push(10), Some(0));
  assert_eq!(arena.push(11), Some(1));
  assert_eq!(arena.push(12), Some(2));
  assert_eq!(arena.push(13), None);
  assert_eq!(arena.push(14), None);

  assert_eq!(arena.len(), 3);
  assert_eq!(arena.claimed(), 5);
  assert_eq!(arena.dropped(), 2);
  assert_eq!(arena.to_vec(), vec![10, 11, 12]);
}

#[test]
fn test_zero_capacity_drops_everything() {
  let arena = BoundedArena::with_capacity(0);
  assert_eq!(arena.push(1u32), None);
  assert_eq!(arena.len(), 0);
  assert_eq!(arena.dropped(), 1);
  assert!(arena.to_vec().is_empty());
}

#[test]
fn test_push_all_is_all_or_nothing() {
  let arena = BoundedArena::with_capacity(5);
  assert_eq!(arena.push_all(vec![1, 2, 3]), Some(0));
  assert_eq!(arena.push_all(vec![4, 5, 6]), None);
  assert_eq!(arena.dropped(), 3);
  // Cursor is past capacity, so later claims fail too
  assert_eq!(arena.push(7), None);
  assert_eq!(arena.to_vec(), vec![1, 2, 3]);
  assert_eq!(arena.get(3), None);
}

#[test]
fn test_reset_reuses_capacity() {
  let mut arena = BoundedArena::with_capacity(2);
  arena.push("a");
  arena.push("b");
  arena.push("c");
  arena.reset();
  assert_eq!(arena.len(), 0);
  assert_eq!(arena.dropped(), 0);
  assert_eq!(arena.push("d"), Some(0));
  assert_eq!(arena.into_vec(), vec!["d"]);
}

#[test]
fn test_parallel_claims_never_exceed_capacity() {
  let arena = BoundedArena::with_capacity(1000);
  (0..5000usize).into_par_iter().for_each(|i| {
    arena.push(i);
  });

  assert_eq!(arena.len(), 1000);
  assert_eq!(arena.dropped(), 4000);
  let mut items = arena.to_vec();
  items.sort_unstable();
  items.dedup();
  assert_eq!(items.len(), 1000, "every stored item is distinct");
}
