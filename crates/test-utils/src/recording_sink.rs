use std::sync::{Arc, Mutex};

use domwatch::{AnalyticsSink, PageActionOverrides};
use serde_json::Value;

/// An analytics sink that records every captured page action.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    captured: Arc<Mutex<Vec<(Option<Value>, PageActionOverrides)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<(Option<Value>, PageActionOverrides)> {
        self.captured.lock().unwrap().clone()
    }
}

impl AnalyticsSink for RecordingSink {
    fn capture_page_action(&self, context: Option<&Value>, overrides: &PageActionOverrides) {
        self.captured
            .lock()
            .unwrap()
            .push((context.cloned(), overrides.clone()));
    }
}
