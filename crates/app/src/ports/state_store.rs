//! State store port: path-addressed JSON documents.
//!
//! Every persisted record of the engine lives under a slash-separated path
//! (see [`crate::records`]). The store knows nothing about the shape of the
//! documents; typed access is layered on top.

use std::future::Future;

use serde_json::Value;

use stovepanel_domain::error::PanelError;

/// Hierarchical document store.
pub trait StateStore: Send + Sync {
    /// Read the document at `path`.
    fn get(&self, path: &str) -> impl Future<Output = Result<Option<Value>, PanelError>> + Send;

    /// Overwrite the document at `path`.
    fn set(&self, path: &str, value: Value) -> impl Future<Output = Result<(), PanelError>> + Send;

    /// Apply a JSON merge patch (RFC 7396) to the document at `path`.
    ///
    /// Only the fields present in `patch` change; `null` removes a field.
    /// A missing document is treated as `{}`. The patch is applied
    /// atomically with respect to other writers of the same path.
    fn update(
        &self,
        path: &str,
        patch: Value,
    ) -> impl Future<Output = Result<(), PanelError>> + Send;

    /// Delete the document at `path`. Deleting a missing path is not an error.
    fn remove(&self, path: &str) -> impl Future<Output = Result<(), PanelError>> + Send;

    /// Documents stored directly under `parent`, keyed by their last path segment.
    fn children(
        &self,
        parent: &str,
    ) -> impl Future<Output = Result<Vec<(String, Value)>, PanelError>> + Send;
}

/// Apply an RFC 7396 merge patch to `target` in place.
///
/// Shared by in-memory store implementations.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_patch(target.entry(key.as_str()).or_insert(Value::Null), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_merge_nested_objects() {
        let mut doc = json!({"a": 1, "b": {"c": 2, "d": 3}});
        merge_patch(&mut doc, &json!({"b": {"c": 5}}));
        assert_eq!(doc, json!({"a": 1, "b": {"c": 5, "d": 3}}));
    }

    #[test]
    fn should_remove_fields_set_to_null() {
        let mut doc = json!({"a": 1, "b": 2});
        merge_patch(&mut doc, &json!({"b": null}));
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn should_replace_arrays_wholesale() {
        let mut doc = json!({"slots": {"monday": [1, 2, 3]}});
        merge_patch(&mut doc, &json!({"slots": {"monday": [4]}}));
        assert_eq!(doc, json!({"slots": {"monday": [4]}}));
    }

    #[test]
    fn should_create_object_when_target_is_missing() {
        let mut doc = Value::Null;
        merge_patch(&mut doc, &json!({"enabled": true, "x": null}));
        assert_eq!(doc, json!({"enabled": true}));
    }
}
