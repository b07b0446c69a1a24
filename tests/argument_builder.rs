use std::collections::{BTreeMap, HashMap};

use modrun::args::{ParameterDescriptor, TaskDescriptor, build_arguments};
use modrun::types::ParameterType;

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn flagged_values_come_before_positionals_sorted_by_index() {
    let descriptors = vec![
        ParameterDescriptor::indexed("output", 1, ParameterType::Image),
        ParameterDescriptor::new("sigma", ParameterType::Double).with_long_flag("sigma"),
        ParameterDescriptor::indexed("input", 0, ParameterType::Image),
        ParameterDescriptor::new("radius", ParameterType::Integer).with_flag("r"),
    ];
    let values = values(&[
        ("output", "out.nrrd"),
        ("sigma", "2.5"),
        ("input", "in.nrrd"),
        ("radius", "3"),
    ]);

    let args = build_arguments(&descriptors, &values);

    assert_eq!(
        args,
        vec!["--sigma", "2.5", "-r", "3", "in.nrrd", "out.nrrd"]
    );
}

#[test]
fn long_flag_wins_over_short_flag() {
    let descriptors = vec![
        ParameterDescriptor::new("iterations", ParameterType::Integer)
            .with_flag("i")
            .with_long_flag("iterations"),
    ];
    let args = build_arguments(&descriptors, &values(&[("iterations", "10")]));
    assert_eq!(args, vec!["--iterations", "10"]);
}

#[test]
fn boolean_emits_flag_only_when_true() {
    let descriptors = vec![
        ParameterDescriptor::new("verbose", ParameterType::Boolean).with_flag("v"),
        ParameterDescriptor::new("dry", ParameterType::Boolean).with_long_flag("dry"),
        ParameterDescriptor::new("fast", ParameterType::Boolean).with_long_flag("fast"),
    ];
    let values = values(&[("verbose", "TRUE"), ("dry", "false"), ("fast", "yes")]);

    let args = build_arguments(&descriptors, &values);

    assert_eq!(args, vec!["-v"]);
}

#[test]
fn multiple_repeats_the_flag_per_element() {
    let descriptors = vec![
        ParameterDescriptor::new("seeds", ParameterType::IntegerVector)
            .with_long_flag("seed")
            .allow_multiple(true),
    ];
    let args = build_arguments(&descriptors, &values(&[("seeds", "1,2,3")]));
    assert_eq!(args, vec!["--seed", "1", "--seed", "2", "--seed", "3"]);
}

#[test]
fn empty_elements_are_kept_only_for_text_like_types() {
    let descriptors = vec![
        ParameterDescriptor::new("labels", ParameterType::String)
            .with_long_flag("label")
            .allow_multiple(true),
        ParameterDescriptor::new("weights", ParameterType::Double)
            .with_long_flag("weight")
            .allow_multiple(true),
    ];
    let values = values(&[("labels", "a,,b"), ("weights", "0.5,,1.5")]);

    let args = build_arguments(&descriptors, &values);

    assert_eq!(
        args,
        vec![
            "--label", "a", "--label", "", "--label", "b", "--weight", "0.5", "--weight", "1.5",
        ]
    );
}

#[test]
fn missing_values_render_as_empty_strings() {
    let descriptors = vec![
        ParameterDescriptor::new("sigma", ParameterType::Double).with_long_flag("sigma"),
        ParameterDescriptor::new("label", ParameterType::String).with_long_flag("label"),
        ParameterDescriptor::new("verbose", ParameterType::Boolean).with_flag("v"),
        ParameterDescriptor::indexed("input", 0, ParameterType::Image),
    ];
    let args = build_arguments(&descriptors, &values(&[("input", "in.nrrd")]));
    assert_eq!(args, vec!["--label", "", "in.nrrd"]);
}

#[test]
fn missing_positional_keeps_its_slot() {
    let descriptors = vec![
        ParameterDescriptor::indexed("input", 0, ParameterType::Image),
        ParameterDescriptor::indexed("output", 1, ParameterType::Image),
    ];
    let args = build_arguments(&descriptors, &values(&[("output", "out.nrrd")]));
    assert_eq!(args, vec!["", "out.nrrd"]);
}

#[test]
fn descriptor_without_index_or_flag_is_skipped() {
    let descriptors = vec![ParameterDescriptor::new("orphan", ParameterType::String)];
    let args = build_arguments(&descriptors, &values(&[("orphan", "x")]));
    assert!(args.is_empty());
}

#[test]
fn flag_dashes_are_normalised() {
    let descriptor =
        ParameterDescriptor::new("sigma", ParameterType::Double).with_long_flag("--sigma");
    assert_eq!(descriptor.flag_token().as_deref(), Some("--sigma"));

    let descriptor = ParameterDescriptor::new("s", ParameterType::Double).with_flag("-s");
    assert_eq!(descriptor.flag_token().as_deref(), Some("-s"));

    let descriptor = ParameterDescriptor::new("s", ParameterType::Double).with_flag("");
    assert_eq!(descriptor.flag_token(), None);
}

#[test]
fn value_sources_are_interchangeable() {
    let descriptors = vec![
        ParameterDescriptor::new("sigma", ParameterType::Double).with_long_flag("sigma"),
    ];

    let mut tree = BTreeMap::new();
    tree.insert("sigma".to_string(), "1.0".to_string());
    let pairs: &[(&str, &str)] = &[("sigma", "1.0")];

    assert_eq!(
        build_arguments(&descriptors, &tree),
        build_arguments(&descriptors, pairs)
    );
}

#[test]
fn task_descriptor_renders_a_quoted_command_line() {
    let descriptors = vec![
        ParameterDescriptor::new("title", ParameterType::String).with_long_flag("title"),
        ParameterDescriptor::indexed("input", 0, ParameterType::File),
    ];
    let values = values(&[("title", "two words"), ("input", "in.txt")]);

    let task = TaskDescriptor::from_parameters("/opt/mod/blur", &descriptors, &values);

    assert_eq!(task.argv(), ["--title", "two words", "in.txt"]);
    assert_eq!(
        task.command_line(),
        r#"/opt/mod/blur --title "two words" in.txt"#
    );
}

#[test]
fn type_tags_resolve_through_the_shared_table() {
    for kind in ParameterType::ALL {
        assert_eq!(ParameterType::from_tag(kind.tag()), Some(kind));
        assert_eq!(kind.tag().parse::<ParameterType>(), Ok(kind));
    }
    assert_eq!(ParameterType::from_tag("quaternion"), None);
}
