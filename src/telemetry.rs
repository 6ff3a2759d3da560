// src/telemetry.rs

//! Best-effort forwarding of interaction telemetry to an analytics sink.
//!
//! The sink is passed in explicitly. Without one, [`send_telemetry`] does
//! nothing; telemetry never fails the caller.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Overrides attached to a captured page action.
///
/// Serialises as `{"behavior": .., "actionType": .., "contentTags": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageActionOverrides {
    pub behavior: i64,
    pub action_type: String,
    pub content_tags: Map<String, Value>,
}

/// An analytics host capable of capturing page actions.
pub trait AnalyticsSink: Send + Sync {
    /// Capture one page action. `context` is the optional page context the
    /// host may merge the overrides into.
    fn capture_page_action(&self, context: Option<&Value>, overrides: &PageActionOverrides);
}

/// Forward one interaction event to `sink`, if there is one.
pub fn send_telemetry(
    sink: Option<&dyn AnalyticsSink>,
    behavior_id: i64,
    action_type: &str,
    content_tags: Map<String, Value>,
) {
    let Some(sink) = sink else {
        debug!(behavior_id, action_type, "no analytics sink; telemetry dropped");
        return;
    };

    let overrides = PageActionOverrides {
        behavior: behavior_id,
        action_type: action_type.to_string(),
        content_tags,
    };
    sink.capture_page_action(None, &overrides);
}

/// Sink that writes each page action to the `tracing` log as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn capture_page_action(&self, context: Option<&Value>, overrides: &PageActionOverrides) {
        match serde_json::to_string(overrides) {
            Ok(json) => info!(target: "domwatch::telemetry", ?context, overrides = %json, "page action"),
            Err(err) => warn!(target: "domwatch::telemetry", error = %err, "failed to serialise page action"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overrides_serialise_camel_case() {
        let mut tags = Map::new();
        tags.insert("cardId".to_string(), json!("c-1"));
        let overrides = PageActionOverrides {
            behavior: 7,
            action_type: "click".to_string(),
            content_tags: tags,
        };
        let value = serde_json::to_value(&overrides).unwrap();
        assert_eq!(
            value,
            json!({"behavior": 7, "actionType": "click", "contentTags": {"cardId": "c-1"}})
        );
    }

    #[test]
    fn missing_sink_is_a_no_op() {
        send_telemetry(None, 1, "click", Map::new());
    }

    #[test]
    fn tracing_sink_accepts_actions() {
        send_telemetry(Some(&TracingSink), 3, "hover", Map::new());
    }
}
