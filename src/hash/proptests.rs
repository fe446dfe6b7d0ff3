use super::*;

use proptest::prelude::*;
use std::collections::HashMap as StdHashMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i16, u32),
    Remove(i16),
    Get(i16),
    InsertNull(u32),
    RemoveNull,
    PutAll(Vec<(i16, u32)>),
    Clear,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = -300i16..300;
    let op = prop_oneof![
        40 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key.clone().prop_map(Op::Remove),
        15 => key.clone().prop_map(Op::Get),
        4 => any::<u32>().prop_map(Op::InsertNull),
        3 => Just(Op::RemoveNull),
        3 => prop::collection::vec((key, any::<u32>()), 0..80).prop_map(Op::PutAll),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_matches_std_and_keeps_buckets_placed(ops in ops_strategy()) {
        let mut map: HashMap<i16, u32> = HashMap::new();
        let mut model: StdHashMap<Option<i16>, u32> = StdHashMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(map.insert(key, value), model.insert(Some(key), value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(map.remove(&key), model.remove(&Some(key)));
                }
                Op::Get(key) => {
                    prop_assert_eq!(map.get(&key), model.get(&Some(key)));
                }
                Op::InsertNull(value) => {
                    prop_assert_eq!(map.insert_null_key(value), model.insert(None, value));
                }
                Op::RemoveNull => {
                    prop_assert_eq!(map.remove_null_key(), model.remove(&None));
                }
                Op::PutAll(entries) => {
                    model.extend(entries.iter().map(|(key, value)| (Some(*key), *value)));
                    map.put_all(entries);
                }
                Op::Clear => {
                    map.clear();
                    model.clear();
                }
            }
            map.assert_invariants();
            prop_assert_eq!(map.len(), model.len());
            prop_assert!(map.capacity().is_power_of_two());
        }

        let got: StdHashMap<Option<i16>, u32> =
            map.iter().map(|(key, value)| (key.copied(), *value)).collect();
        prop_assert_eq!(got, model);
    }

    #[test]
    fn prop_cursor_removal_matches_retain(
        keys in prop::collection::hash_set(any::<u16>(), 0..200),
        modulus in 2u16..7,
    ) {
        let mut map: HashMap<u16, ()> = keys.iter().map(|key| (*key, ())).collect();
        let mut cursor = map.cursor();
        let mut seen = 0;
        while let Some((key, _)) = cursor.next(&map).unwrap() {
            seen += 1;
            if key.is_some_and(|key| key % modulus == 0) {
                cursor.remove(&mut map).unwrap();
            }
        }
        prop_assert_eq!(seen, keys.len());

        let mut expected: Vec<u16> = keys.into_iter().filter(|key| key % modulus != 0).collect();
        let mut remaining: Vec<u16> = map.keys().flatten().copied().collect();
        expected.sort_unstable();
        remaining.sort_unstable();
        prop_assert_eq!(remaining, expected);
        map.assert_invariants();
    }
}
