#![cfg(feature = "ordered")]
//! Integration tests for TreeMap.
//!
//! Covers ordered insertion, relational queries, removal, fail-fast cursors
//! and the error surface for keys that cannot be compared.

use arbortable::CollectionError;
use arbortable::ordered::{NaturalOrder, Reversed, TreeMap, comparing};
use rstest::{fixture, rstest};

#[fixture]
fn scenario_map() -> TreeMap<i32, String> {
    let mut map = TreeMap::new();
    for key in [5, 3, 8, 1, 4, 7, 9] {
        map.insert(key, format!("v{key}")).unwrap();
    }
    map
}

// =============================================================================
// Construction and Basic Operations
// =============================================================================

#[rstest]
fn test_new_is_empty() {
    let map: TreeMap<i32, i32> = TreeMap::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.first_key(), None);
    assert_eq!(map.last_entry(), None);
    assert_eq!(map.iter().next(), None);
}

#[rstest]
fn test_insert_returns_previous_value() {
    let mut map = TreeMap::new();
    assert_eq!(map.insert("one", 1).unwrap(), None);
    assert_eq!(map.insert("one", 10).unwrap(), Some(1));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&"one").unwrap(), Some(&10));
}

#[rstest]
fn test_get_mut_modifies_in_place(mut scenario_map: TreeMap<i32, String>) {
    if let Some(value) = scenario_map.get_mut(&4).unwrap() {
        value.push('!');
    }
    assert_eq!(scenario_map.get(&4).unwrap().map(String::as_str), Some("v4!"));
    assert_eq!(scenario_map.get_mut(&6).unwrap(), None);
}

#[rstest]
fn test_contains_key_and_value(scenario_map: TreeMap<i32, String>) {
    assert!(scenario_map.contains_key(&7).unwrap());
    assert!(!scenario_map.contains_key(&6).unwrap());
    assert!(scenario_map.contains_value(&"v9".to_string()));
    assert!(!scenario_map.contains_value(&"v6".to_string()));
}

// =============================================================================
// Ordering and Relational Queries
// =============================================================================

#[rstest]
fn test_scenario_ordering(scenario_map: TreeMap<i32, String>) {
    assert_eq!(scenario_map.first_key(), Some(&1));
    assert_eq!(scenario_map.last_key(), Some(&9));
    assert_eq!(scenario_map.floor_key(&6).unwrap(), Some(&5));
    assert_eq!(scenario_map.ceiling_key(&6).unwrap(), Some(&7));
    assert_eq!(
        scenario_map.keys().copied().collect::<Vec<_>>(),
        vec![1, 3, 4, 5, 7, 8, 9]
    );
}

#[rstest]
#[case(5, Some(4), Some(5), Some(5), Some(7))]
#[case(0, None, None, Some(1), Some(1))]
#[case(10, Some(9), Some(9), None, None)]
#[case(2, Some(1), Some(1), Some(3), Some(3))]
fn test_relational_keys(
    scenario_map: TreeMap<i32, String>,
    #[case] probe: i32,
    #[case] lower: Option<i32>,
    #[case] floor: Option<i32>,
    #[case] ceiling: Option<i32>,
    #[case] higher: Option<i32>,
) {
    assert_eq!(scenario_map.lower_key(&probe).unwrap().copied(), lower);
    assert_eq!(scenario_map.floor_key(&probe).unwrap().copied(), floor);
    assert_eq!(scenario_map.ceiling_key(&probe).unwrap().copied(), ceiling);
    assert_eq!(scenario_map.higher_key(&probe).unwrap().copied(), higher);
}

#[rstest]
fn test_relational_entries_carry_values(scenario_map: TreeMap<i32, String>) {
    let (key, value) = scenario_map.higher_entry(&5).unwrap().unwrap();
    assert_eq!((*key, value.as_str()), (7, "v7"));
    assert_eq!(scenario_map.lower_entry(&1).unwrap(), None);
}

#[rstest]
fn test_reversed_comparator_flips_relations() {
    let mut map = TreeMap::with_comparator(Reversed(NaturalOrder));
    for key in [5, 3, 8, 1] {
        map.insert(key, ()).unwrap();
    }
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![8, 5, 3, 1]);
    assert_eq!(map.higher_key(&5).unwrap(), Some(&3));
    assert_eq!(map.lower_key(&5).unwrap(), Some(&8));
}

#[rstest]
fn test_function_comparator() {
    let mut map = TreeMap::with_comparator(comparing(|left: &&str, right: &&str| {
        left.len().cmp(&right.len())
    }));
    map.insert("ccc", 3).unwrap();
    map.insert("a", 1).unwrap();
    assert_eq!(map.insert("b", 2).unwrap(), Some(1));
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["a", "ccc"]);
}

// =============================================================================
// Removal
// =============================================================================

#[rstest]
fn test_remove_keeps_order(mut scenario_map: TreeMap<i32, String>) {
    assert_eq!(scenario_map.remove(&5).unwrap(), Some("v5".to_string()));
    assert_eq!(scenario_map.remove(&5).unwrap(), None);
    assert_eq!(scenario_map.remove_entry(&1).unwrap(), Some((1, "v1".to_string())));
    assert_eq!(
        scenario_map.keys().copied().collect::<Vec<_>>(),
        vec![3, 4, 7, 8, 9]
    );
    assert_eq!(scenario_map.len(), 5);
}

#[rstest]
fn test_removing_root_of_balanced_tree() {
    let mut map: TreeMap<i32, ()> = [4, 2, 6, 1, 3, 5, 7].map(|key| (key, ())).into_iter().collect();
    assert_eq!(map.remove(&4).unwrap(), Some(()));
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 5, 6, 7]);
    assert_eq!(map.floor_key(&4).unwrap(), Some(&3));
    assert_eq!(map.ceiling_key(&4).unwrap(), Some(&5));
}

#[rstest]
fn test_poll_drains_from_both_ends(mut scenario_map: TreeMap<i32, String>) {
    assert_eq!(scenario_map.poll_first_entry().map(|(key, _)| key), Some(1));
    assert_eq!(scenario_map.poll_last_entry().map(|(key, _)| key), Some(9));
    let mut drained = Vec::new();
    while let Some((key, _)) = scenario_map.poll_first_entry() {
        drained.push(key);
    }
    assert_eq!(drained, vec![3, 4, 5, 7, 8]);
    assert_eq!(scenario_map.poll_last_entry(), None);
}

#[rstest]
fn test_clear_then_reuse(mut scenario_map: TreeMap<i32, String>) {
    scenario_map.clear();
    assert!(scenario_map.is_empty());
    scenario_map.insert(2, "two".to_string()).unwrap();
    assert_eq!(scenario_map.first_entry().map(|(key, _)| *key), Some(2));
}

#[rstest]
fn test_large_insert_and_remove_sequence() {
    let mut map = TreeMap::new();
    for key in (0..1000).map(|index| (index * 7919) % 1000) {
        map.insert(key, key * 2).unwrap();
    }
    assert_eq!(map.len(), 1000);
    for key in (0..1000).filter(|key| key % 3 == 0) {
        assert_eq!(map.remove(&key).unwrap(), Some(key * 2));
    }
    let expected: Vec<i32> = (0..1000).filter(|key| key % 3 != 0).collect();
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), expected);
}

// =============================================================================
// Iteration
// =============================================================================

#[rstest]
fn test_double_ended_iteration(scenario_map: TreeMap<i32, String>) {
    let descending: Vec<i32> = scenario_map.iter().rev().map(|(key, _)| *key).collect();
    assert_eq!(descending, vec![9, 8, 7, 5, 4, 3, 1]);
}

#[rstest]
fn test_range_iteration(scenario_map: TreeMap<i32, String>) {
    let keys: Vec<i32> = scenario_map.range(3..=7).unwrap().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec![3, 4, 5, 7]);
    assert!(scenario_map.range(6..6).unwrap().next().is_none());
}

#[rstest]
fn test_display_and_debug(scenario_map: TreeMap<i32, String>) {
    let mut map = TreeMap::new();
    map.insert(2, "b").unwrap();
    map.insert(1, "a").unwrap();
    assert_eq!(format!("{map}"), "{1: a, 2: b}");
    assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
    assert_eq!(scenario_map.values().count(), 7);
}

// =============================================================================
// Cursors
// =============================================================================

#[rstest]
fn test_cursor_removes_while_walking(mut scenario_map: TreeMap<i32, String>) {
    let mut cursor = scenario_map.cursor();
    while let Some((key, _)) = cursor.next(&scenario_map).unwrap() {
        let key = *key;
        if key % 2 == 1 {
            assert_eq!(cursor.remove(&mut scenario_map).unwrap().0, key);
        }
    }
    assert_eq!(scenario_map.keys().copied().collect::<Vec<_>>(), vec![4, 8]);
}

#[rstest]
fn test_descending_cursor(scenario_map: TreeMap<i32, String>) {
    let mut cursor = scenario_map.descending_cursor();
    let mut keys = Vec::new();
    while let Some((key, _)) = cursor.next(&scenario_map).unwrap() {
        keys.push(*key);
    }
    assert_eq!(keys, vec![9, 8, 7, 5, 4, 3, 1]);
    assert!(!cursor.has_next());
}

#[rstest]
fn test_cursor_fails_fast_after_foreign_insert(mut scenario_map: TreeMap<i32, String>) {
    let mut cursor = scenario_map.cursor();
    assert!(cursor.next(&scenario_map).unwrap().is_some());
    scenario_map.insert(6, "v6".to_string()).unwrap();
    let error = cursor.next(&scenario_map).unwrap_err();
    assert!(matches!(error, CollectionError::ConcurrentModification { .. }));
    assert!(error.is_recoverable());
}

#[rstest]
fn test_cursor_remove_without_next_is_illegal(mut scenario_map: TreeMap<i32, String>) {
    let mut cursor = scenario_map.cursor();
    assert!(matches!(
        cursor.remove(&mut scenario_map),
        Err(CollectionError::IllegalState { .. })
    ));
    cursor.next(&scenario_map).unwrap();
    cursor.remove(&mut scenario_map).unwrap();
    assert!(matches!(
        cursor.remove(&mut scenario_map),
        Err(CollectionError::IllegalState { .. })
    ));
}

#[rstest]
fn test_cursor_is_bound_to_its_map() {
    let mut first = TreeMap::new();
    let mut second = TreeMap::new();
    for key in 0..4 {
        first.insert(key, ()).unwrap();
        second.insert(key + 10, ()).unwrap();
    }

    let mut cursor = first.cursor();
    assert!(matches!(
        cursor.next(&second),
        Err(CollectionError::IllegalState { .. })
    ));
    assert_eq!(cursor.next(&first).unwrap(), Some((&0, &())));
    assert!(matches!(
        cursor.remove(&mut second),
        Err(CollectionError::IllegalState { .. })
    ));
    assert_eq!(second.len(), 4);
    assert_eq!(cursor.remove(&mut first).unwrap(), (0, ()));
}

// =============================================================================
// Incomparable Keys
// =============================================================================

#[rstest]
fn test_nan_keys_are_rejected() {
    let mut map = TreeMap::new();
    map.insert(1.0_f64, "one").unwrap();
    let error = map.insert(f64::NAN, "nan").unwrap_err();
    assert!(matches!(error, CollectionError::TypeMismatch { .. }));
    assert!(!error.is_recoverable());
    assert!(map.get(&f64::NAN).is_err());
    assert_eq!(map.len(), 1);
}

#[rstest]
fn test_try_extend_stops_at_first_failure() {
    let mut map = TreeMap::new();
    let result = map.try_extend([(1.0, 'a'), (2.0, 'b'), (f64::NAN, 'c'), (3.0, 'd')]);
    assert!(result.is_err());
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1.0, 2.0]);
}
