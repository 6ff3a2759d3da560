// tests/telemetry.rs

use serde_json::{json, Map, Value};

use domwatch::{send_telemetry, AnalyticsSink};
use domwatch_test_utils::RecordingSink;

fn tags(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn absent_sink_is_silently_ignored() {
    send_telemetry(None, 1, "click", Map::new());
}

#[test]
fn overrides_reach_the_sink_without_context() {
    let sink = RecordingSink::new();

    send_telemetry(
        Some(&sink as &dyn AnalyticsSink),
        42,
        "click",
        tags(json!({"slot": "hero", "position": 3})),
    );

    let captured = sink.captured();
    assert_eq!(captured.len(), 1);

    let (context, overrides) = &captured[0];
    assert!(context.is_none());
    assert_eq!(overrides.behavior, 42);
    assert_eq!(overrides.action_type, "click");
    assert_eq!(
        serde_json::to_value(overrides).unwrap(),
        json!({
            "behavior": 42,
            "actionType": "click",
            "contentTags": {"slot": "hero", "position": 3}
        })
    );
}

#[test]
fn each_call_forwards_exactly_once() {
    let sink = RecordingSink::new();
    for id in 0..3 {
        send_telemetry(Some(&sink), id, "view", Map::new());
    }
    let behaviors: Vec<i64> = sink.captured().iter().map(|(_, o)| o.behavior).collect();
    assert_eq!(behaviors, vec![0, 1, 2]);
}
