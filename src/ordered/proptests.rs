use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16, u32),
    Remove(i16),
    Get(i16),
    Floor(i16),
    Higher(i16),
    PollFirst,
    PollLast,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // A narrow key space keeps removals and overwrites frequent.
    let key = -200i16..200;
    let op = prop_oneof![
        40 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key.clone().prop_map(Op::Remove),
        10 => key.clone().prop_map(Op::Get),
        10 => key.clone().prop_map(Op::Floor),
        10 => key.prop_map(Op::Higher),
        3 => Just(Op::PollFirst),
        2 => Just(Op::PollLast),
    ];
    prop::collection::vec(op, 0..=600)
}

fn bound_strategy() -> impl Strategy<Value = (i16, bool)> {
    (-60i16..60, any::<bool>())
}

fn to_bound(key: i16, inclusive: bool) -> Bound<i16> {
    if inclusive {
        Bound::Included(key)
    } else {
        Bound::Excluded(key)
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_matches_btreemap_and_stays_balanced(ops in ops_strategy()) {
        let mut tree: TreeMap<i16, u32> = TreeMap::new();
        let mut model: BTreeMap<i16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(tree.insert(key, value).unwrap(), model.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(tree.remove(&key).unwrap(), model.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(tree.get(&key).unwrap(), model.get(&key));
                }
                Op::Floor(key) => {
                    let expected = model.range(..=key).next_back().map(|(k, _)| k);
                    prop_assert_eq!(tree.floor_key(&key).unwrap(), expected);
                }
                Op::Higher(key) => {
                    let expected = model
                        .range((Bound::Excluded(key), Bound::Unbounded))
                        .next()
                        .map(|(k, _)| k);
                    prop_assert_eq!(tree.higher_key(&key).unwrap(), expected);
                }
                Op::PollFirst => {
                    prop_assert_eq!(tree.poll_first_entry(), model.pop_first());
                }
                Op::PollLast => {
                    prop_assert_eq!(tree.poll_last_entry(), model.pop_last());
                }
            }
            tree.assert_invariants();
            prop_assert_eq!(tree.len(), model.len());
        }

        let got: Vec<(i16, u32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(i16, u32)> = model.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_windows_match_btreemap_ranges(
        keys in prop::collection::btree_set(-50i16..50, 0..80),
        low in bound_strategy(),
        high in bound_strategy(),
        probe in -60i16..60,
    ) {
        let (low, high) = if low.0 <= high.0 { (low, high) } else { (high, low) };
        // BTreeMap::range panics on an empty exclusive range at one point.
        prop_assume!(!(low.0 == high.0 && !low.1 && !high.1));

        let mut tree: TreeMap<i16, ()> = keys.iter().map(|key| (*key, ())).collect();
        let model: BTreeMap<i16, ()> = keys.iter().map(|key| (*key, ())).collect();
        let range = (to_bound(low.0, low.1), to_bound(high.0, high.1));
        let expected: Vec<i16> = model.range(range).map(|(k, _)| *k).collect();

        let mut view = tree.sub_map(low.0, low.1, high.0, high.1).unwrap();
        let ascending: Vec<i16> = view.keys().unwrap().copied().collect();
        prop_assert_eq!(&ascending, &expected);

        let inside = |key: &i16| expected.contains(key);
        let floor = expected.iter().rev().find(|key| **key <= probe).copied();
        let higher = expected.iter().find(|key| **key > probe).copied();
        prop_assert_eq!(view.floor_key(&probe).unwrap().copied(), floor);
        prop_assert_eq!(view.higher_key(&probe).unwrap().copied(), higher);
        prop_assert_eq!(view.contains_key(&probe).unwrap(), inside(&probe));

        let descending = view.descending_map();
        let reversed: Vec<i16> = descending.keys().unwrap().copied().collect();
        let mut expected_reversed = expected.clone();
        expected_reversed.reverse();
        prop_assert_eq!(reversed, expected_reversed);
        // In a descending view "floor" looks towards larger keys.
        let descending_floor = expected.iter().find(|key| **key >= probe).copied();
        prop_assert_eq!(descending.floor_key(&probe).unwrap().copied(), descending_floor);
    }
}

#[test]
fn every_removal_order_of_a_small_tree_stays_balanced() {
    let keys = [1, 2, 3, 4, 5, 6];
    for rotation in 0..keys.len() {
        for stride in [1, 5] {
            let mut tree: TreeMap<i32, ()> = keys.iter().map(|key| (*key, ())).collect();
            let mut index = rotation;
            for _ in 0..keys.len() {
                let key = keys[index % keys.len()];
                assert_eq!(tree.remove(&key).unwrap(), Some(()));
                tree.assert_invariants();
                index += stride;
            }
            assert!(tree.is_empty());
        }
    }
}
