//! Test helpers.

use crate::host::{Host, StateStore};
use crate::patch::Model;
use parking_lot::Mutex;
use serde_json::Value;

/// Unwraps a `json!` object into a model.
pub(crate) fn object(value: Value) -> Model {
    match value {
        Value::Object(model) => model,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// A host that only records state updates, in order.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    updates: Mutex<Vec<Model>>,
}

impl Recorder {
    pub(crate) fn updates(&self) -> Vec<Model> {
        self.updates.lock().clone()
    }

    pub(crate) fn last(&self) -> Option<Model> {
        self.updates.lock().last().cloned()
    }
}

impl StateStore for Recorder {
    fn set_data(&self, update: Model) {
        self.updates.lock().push(update);
    }
}

impl Host for Recorder {
    fn state_store(&self) -> Option<&dyn StateStore> {
        Some(self)
    }
}
