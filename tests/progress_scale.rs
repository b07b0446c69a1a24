use modrun::exec::{
    PROGRESS_FILTER_END, PROGRESS_FULL, PROGRESS_NOT_STARTED, PROGRESS_TERMINATED, ProgressScale,
};

#[test]
fn fractions_map_onto_one_to_one_thousand() {
    let mut scale = ProgressScale::new();
    assert_eq!(scale.current(), PROGRESS_NOT_STARTED);

    assert_eq!(scale.on_fraction(0.0), 1);
    assert_eq!(scale.on_fraction(0.0004), 1);
    assert_eq!(scale.on_fraction(0.25), 250);
    assert_eq!(scale.on_fraction(0.5004), 500);
    assert_eq!(scale.on_fraction(1.0), PROGRESS_FULL);
    assert_eq!(scale.on_fraction(3.0), PROGRESS_FULL);
    assert_eq!(scale.on_fraction(f64::NAN), 1);
}

#[test]
fn start_and_end_are_heartbeats() {
    let mut scale = ProgressScale::new();
    assert_eq!(scale.on_filter_start(), 1);
    scale.on_fraction(0.4);
    assert_eq!(scale.on_filter_end(), 401);
    assert_eq!(scale.on_filter_start(), 402);
}

#[test]
fn end_at_the_top_of_the_scale_becomes_filter_end() {
    let mut scale = ProgressScale::new();
    scale.on_fraction(1.0);
    assert_eq!(scale.on_filter_end(), PROGRESS_FILTER_END);

    let mut scale = ProgressScale::new();
    scale.on_fraction(0.999);
    assert_eq!(scale.on_filter_end(), PROGRESS_FILTER_END);

    // Starting again from 1001 stays capped at 1000.
    assert_eq!(scale.on_filter_start(), PROGRESS_FULL);
}

#[test]
fn termination_is_always_the_last_value() {
    let mut scale = ProgressScale::new();
    scale.on_fraction(0.3);
    assert_eq!(scale.on_terminated(), PROGRESS_TERMINATED);
    assert_eq!(scale.current(), PROGRESS_TERMINATED);
}
