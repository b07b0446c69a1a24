use std::collections::HashMap;

use proptest::prelude::*;
use modrun::args::{ParameterDescriptor, build_arguments};
use modrun::types::ParameterType;

// A mix of flagged and indexed parameters with distinct indices, plus a
// value for each. Values never start with '-' so they can be told apart
// from flags in the rendered argv.
fn schema_strategy() -> impl Strategy<Value = (Vec<ParameterDescriptor>, HashMap<String, String>)> {
    proptest::collection::vec((any::<bool>(), "[a-z0-9]{1,6}"), 1..8)
        .prop_flat_map(|specs| {
            let order = Just((0..specs.len()).collect::<Vec<usize>>()).prop_shuffle();
            (Just(specs), order)
        })
        .prop_map(|(specs, order)| {
            let mut descriptors = Vec::new();
            let mut values = HashMap::new();
            for (i, (indexed, value)) in specs.into_iter().enumerate() {
                let name = format!("p{i}");
                let descriptor = if indexed {
                    ParameterDescriptor::indexed(&name, order[i], ParameterType::String)
                } else {
                    ParameterDescriptor::new(&name, ParameterType::String)
                        .with_long_flag(format!("opt{i}"))
                };
                descriptors.push(descriptor);
                values.insert(name, value);
            }
            (descriptors, values)
        })
}

proptest! {
    #[test]
    fn positionals_follow_every_flag_in_index_order((descriptors, values) in schema_strategy()) {
        let args = build_arguments(&descriptors, &values);

        let flagged: Vec<&ParameterDescriptor> =
            descriptors.iter().filter(|d| d.index.is_none()).collect();
        let mut indexed: Vec<&ParameterDescriptor> =
            descriptors.iter().filter(|d| d.index.is_some()).collect();
        indexed.sort_by_key(|d| d.index);

        // Every flagged parameter contributes exactly a flag and a value.
        prop_assert_eq!(args.len(), flagged.len() * 2 + indexed.len());

        for (i, descriptor) in flagged.iter().enumerate() {
            let flag_token = descriptor.flag_token();
            prop_assert_eq!(Some(&args[i * 2]), flag_token.as_ref());
            prop_assert_eq!(&args[i * 2 + 1], &values[&descriptor.name]);
        }

        let tail = &args[flagged.len() * 2..];
        for (arg, descriptor) in tail.iter().zip(indexed) {
            prop_assert_eq!(arg, &values[&descriptor.name]);
        }
    }

    #[test]
    fn multiple_value_element_count_matches_split(elements in proptest::collection::vec("[a-z]{1,4}", 1..6)) {
        let descriptors = vec![
            ParameterDescriptor::new("items", ParameterType::StringVector)
                .with_long_flag("item")
                .allow_multiple(true),
        ];
        let mut values = HashMap::new();
        values.insert("items".to_string(), elements.join(","));

        let args = build_arguments(&descriptors, &values);

        prop_assert_eq!(args.len(), elements.len() * 2);
        for (pair, element) in args.chunks(2).zip(&elements) {
            prop_assert_eq!(pair[0].as_str(), "--item");
            prop_assert_eq!(&pair[1], element);
        }
    }
}
