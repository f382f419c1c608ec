//! Merging state patches into a view's model and publishing it to the host.

use crate::error::BindError;
use crate::view::View;
use serde_json::{Map, Value};

/// A view's data model; also the shape of host state updates.
pub type Model = Map<String, Value>;

/// Reserved model key holding the view's own name.
pub const NAME_KEY: &str = "name";

/// Reserved model key holding the view's fully-qualified namespace.
pub const NAMESPACE_KEY: &str = "namespace";

/// Shallow merge: keys in `patch` replace existing keys wholesale, all other keys are kept.
pub fn merge(model: &mut Model, patch: Model) {
    for (key, value) in patch {
        model.insert(key, value);
    }
}

/// (Re)writes the reserved identity keys.
pub(crate) fn refresh_reserved(model: &mut Model, name: &str, namespace: &str) {
    model.insert(NAME_KEY.to_string(), Value::String(name.to_string()));
    model.insert(NAMESPACE_KEY.to_string(), Value::String(namespace.to_string()));
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl View {
    /// Merges `patch` into the local model and publishes a snapshot of the whole model to the
    /// host under this view's namespace.
    ///
    /// Returns the snapshot. Without a reachable host (or one without a state store) only the
    /// local model is updated.
    ///
    /// # Errors
    /// - [`BindError::EmptyName`] if the view has no name; the host is not touched.
    /// - [`BindError::Destroyed`] after [`destroy`](View::destroy).
    /// - [`BindError::NamespaceCollision`] if the collision policy is `Error` and another view
    ///   holds this namespace; the local model is left unchanged.
    pub fn publish(&mut self, patch: Option<Model>) -> Result<Model, BindError> {
        if self.name().is_empty() {
            return Err(BindError::EmptyName);
        }
        self.ensure_live()?;

        let root = self.root();
        if let Some(root) = &root {
            root.claim(&self.namespace, self.id())?;
        }

        if let Some(patch) = patch {
            merge(&mut self.model, patch);
        }
        let name = self.node.name().to_string();
        refresh_reserved(&mut self.model, &name, &self.namespace);

        let snapshot = self.model.clone();
        if let Some(root) = &root {
            self.deliver(root, snapshot.clone());
        }
        Ok(snapshot)
    }

    /// Like [`publish`](View::publish), for patches built with `serde_json::json!`.
    ///
    /// `null` publishes without merging anything; other non-object values are rejected.
    pub fn publish_value(&mut self, patch: Value) -> Result<Model, BindError> {
        match patch {
            Value::Object(patch) => self.publish(Some(patch)),
            Value::Null => self.publish(None),
            other => Err(BindError::PatchNotObject {
                found: kind(&other),
            }),
        }
    }

    /// Sends `snapshot` to the host as `{ namespace: snapshot }`.
    pub(crate) fn deliver(&self, root: &crate::host::Root, snapshot: Model) {
        let mut update = Model::new();
        update.insert(self.namespace.clone(), Value::Object(snapshot));
        if root.set_data(update) {
            tracing::debug!(namespace = %self.namespace, "Published view state");
        } else {
            tracing::debug!(namespace = %self.namespace, "Host has no state store, kept local");
        }
    }
}
