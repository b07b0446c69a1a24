use proptest::prelude::*;
use modrun::progress::{ParserEvent, ProgressEvent, ProgressParser};

const DOCUMENT: &str = "starting up\n\
    <filter-start><filter-name>Threshold</filter-name><filter-comment>binarize &amp; clean</filter-comment></filter-start>\n\
    <filter-progress>0.1</filter-progress>\n\
    some log line with a < sign\n\
    <filter-progress-text progress=\"0.6\">more than half</filter-progress-text>\n\
    <filter-result name=\"count\">17</filter-result>\n\
    <filter-start><filter-progress>0.2</filter-progress></filter-start>\n\
    <filter-end><filter-name>Threshold</filter-name></filter-end>\n\
    all done\n\
    \n\
    <filter-progress>0.9</filter-progress>\n";

fn parse_in_chunks(doc: &[u8], cuts: &[usize]) -> (Vec<ProgressEvent>, Vec<u8>) {
    let mut parser = ProgressParser::new();
    let mut events = Vec::new();
    let mut output = Vec::new();

    let mut batches = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        batches.push(parser.feed(&doc[start..cut]));
        start = cut;
    }
    batches.push(parser.feed(&doc[start..]));
    batches.push(parser.finish());

    for batch in batches {
        for event in batch {
            match event {
                ParserEvent::Progress(event) => events.push(event),
                ParserEvent::Output(bytes) => output.extend_from_slice(&bytes),
            }
        }
    }
    (events, output)
}

fn cuts_strategy(len: usize) -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0..=len, 0..24).prop_map(|mut cuts| {
        cuts.sort_unstable();
        cuts
    })
}

proptest! {
    #[test]
    fn chunk_boundaries_do_not_change_events(cuts in cuts_strategy(DOCUMENT.len())) {
        let doc = DOCUMENT.as_bytes();
        let (expected_events, expected_output) = parse_in_chunks(doc, &[]);
        let (events, output) = parse_in_chunks(doc, &cuts);

        prop_assert_eq!(events, expected_events);
        prop_assert_eq!(output, expected_output);
    }
}

#[test]
fn byte_at_a_time_matches_single_feed() {
    let doc = DOCUMENT.as_bytes();
    let cuts: Vec<usize> = (1..doc.len()).collect();

    let (whole, whole_output) = parse_in_chunks(doc, &[]);
    let (bytewise, bytewise_output) = parse_in_chunks(doc, &cuts);

    assert_eq!(whole, bytewise);
    assert_eq!(whole_output, bytewise_output);
    assert_eq!(
        whole
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Error(_)))
            .count(),
        1
    );
}
