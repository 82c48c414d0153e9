//! Storage that helpers use to talk to each other during a render.
//!
//! Values are grouped by an owner, which is a stable name chosen by the
//! helper that writes them, such as `"cycle"`. Two helpers only see each
//! other's values when they agree on the owner.
use crate::{report::Error, view::ViewId};
use serde::{Deserialize, Serialize};
use serde_json::{to_value, Map, Value};
use std::collections::HashMap;

/// Two-level storage of `owner -> key -> value`.
///
/// Serializing the container produces exactly the two-level mapping. The
/// attached view is not part of it and must be set again after a restore.
///
/// # Examples
///
/// ```
/// use stencil::ViewHelperVariableContainer;
/// use serde_json::json;
///
/// let mut container = ViewHelperVariableContainer::new();
/// container.add("tabs", "active", json!("home"));
///
/// assert_eq!(container.get("tabs", "active"), Some(&json!("home")));
/// assert!(!container.exists("tabs", "hidden"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewHelperVariableContainer {
    objects: HashMap<String, Map<String, Value>>,
    #[serde(skip)]
    view: Option<ViewId>,
}

impl ViewHelperVariableContainer {
    /// Create an empty [`ViewHelperVariableContainer`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value stored under the owner and key.
    pub fn add(&mut self, owner: &str, key: &str, value: Value) {
        self.objects
            .entry(owner.to_owned())
            .or_default()
            .insert(key.to_owned(), value);
    }

    /// Set the value stored under the owner and key, replacing any value
    /// that is already there.
    #[inline]
    pub fn add_or_update(&mut self, owner: &str, key: &str, value: Value) {
        self.add(owner, key, value);
    }

    /// Merge a mapping into the values of the owner.
    ///
    /// Nested objects are merged key by key and nested arrays index by index.
    /// In every other case the new value replaces the old one. A list is
    /// merged as a mapping keyed by the index of each item, `"0"`, `"1"` and
    /// so on.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind
    /// [`InvalidArgument`][`crate::ErrorKind::InvalidArgument`] when the
    /// mapping serializes to neither an object nor an array.
    pub fn add_all<T>(&mut self, owner: &str, mapping: T) -> Result<(), Error>
    where
        T: Serialize,
    {
        let incoming = match to_value(mapping) {
            Ok(Value::Object(object)) => object,
            Ok(Value::Array(array)) => array
                .into_iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
            Ok(other) => {
                return Err(Error::invalid_argument("invalid argument").with_help(format!(
                    "`add_all` expects a mapping of keys to values, received `{other}`"
                )))
            }
            Err(error) => {
                return Err(Error::invalid_argument("unserializable value")
                    .with_help(format!("`add_all` could not serialize its input: {error}")))
            }
        };

        let existing = self.objects.entry(owner.to_owned()).or_default();
        for (key, value) in incoming {
            match existing.get_mut(&key) {
                Some(current) => merge(current, value),
                None => {
                    existing.insert(key, value);
                }
            }
        }

        Ok(())
    }

    /// Return the value stored under the owner and key.
    pub fn get(&self, owner: &str, key: &str) -> Option<&Value> {
        self.objects.get(owner).and_then(|values| values.get(key))
    }

    /// Return the value stored under the owner and key, or `default` when
    /// there is none.
    ///
    /// A stored `null` is returned as is.
    pub fn get_or(&self, owner: &str, key: &str, default: Value) -> Value {
        self.get(owner, key).cloned().unwrap_or(default)
    }

    /// Return every value of the owner.
    pub fn get_all(&self, owner: &str) -> Option<&Map<String, Value>> {
        self.objects.get(owner)
    }

    /// Return every value of the owner as an object, or `default` when the
    /// owner has no values.
    pub fn get_all_or(&self, owner: &str, default: Value) -> Value {
        self.get_all(owner)
            .map(|values| Value::Object(values.clone()))
            .unwrap_or(default)
    }

    /// Return true if a value, even `null`, is stored under the owner and key.
    pub fn exists(&self, owner: &str, key: &str) -> bool {
        self.get(owner, key).is_some()
    }

    /// Remove the value stored under the owner and key.
    ///
    /// Removing a value that does not exist does nothing.
    pub fn remove(&mut self, owner: &str, key: &str) {
        if let Some(values) = self.objects.get_mut(owner) {
            values.remove(key);
        }
    }

    /// Attach the container to a view.
    pub fn set_view(&mut self, view: ViewId) {
        self.view = Some(view);
    }

    /// Return the view this container is attached to.
    pub fn view(&self) -> Option<ViewId> {
        self.view
    }
}

/// Merge `incoming` into `current`, recursing through objects and arrays.
fn merge(current: &mut Value, incoming: Value) {
    match (current, incoming) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match current.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        current.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(current), Value::Array(incoming)) => {
            for (index, value) in incoming.into_iter().enumerate() {
                match current.get_mut(index) {
                    Some(existing) => merge(existing, value),
                    None => current.push(value),
                }
            }
        }
        (current, incoming) => *current = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::ViewHelperVariableContainer;
    use crate::{report::ErrorKind, view::ViewId};
    use serde_json::json;

    #[test]
    fn test_add_then_get() {
        let mut container = ViewHelperVariableContainer::new();
        container.add("owner", "key", json!("value"));

        assert_eq!(container.get("owner", "key"), Some(&json!("value")));
        assert!(container.exists("owner", "key"));
        assert!(!container.exists("other", "key"));
    }

    #[test]
    fn test_add_or_update_overwrites() {
        let mut container = ViewHelperVariableContainer::new();
        container.add("owner", "key", json!(1));
        container.add_or_update("owner", "key", json!(2));

        assert_eq!(container.get("owner", "key"), Some(&json!(2)));
    }

    #[test]
    fn test_remove_then_default() {
        let mut container = ViewHelperVariableContainer::new();
        container.add("owner", "key", json!("value"));
        container.remove("owner", "key");

        assert!(!container.exists("owner", "key"));
        assert_eq!(container.get_or("owner", "key", json!("fallback")), json!("fallback"));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut container = ViewHelperVariableContainer::new();
        container.remove("owner", "key");
        container.add("owner", "kept", json!(true));
        container.remove("owner", "key");

        assert_eq!(container.get_all("owner").map(|all| all.len()), Some(1));
    }

    #[test]
    fn test_stored_null_is_present() {
        let mut container = ViewHelperVariableContainer::new();
        container.add("owner", "empty", json!(null));

        assert!(container.exists("owner", "empty"));
        assert_eq!(container.get_or("owner", "empty", json!("fallback")), json!(null));
    }

    #[test]
    fn test_add_all_merges_recursively() {
        let mut container = ViewHelperVariableContainer::new();
        container.add_all("owner", json!({"a": {"x": 1}})).unwrap();
        container.add_all("owner", json!({"a": {"y": 2}})).unwrap();

        assert_eq!(
            container.get_all_or("owner", json!(null)),
            json!({"a": {"x": 1, "y": 2}})
        );
    }

    #[test]
    fn test_add_all_merges_arrays_by_index() {
        let mut container = ViewHelperVariableContainer::new();
        container.add_all("owner", json!({"list": [1, 2, 3]})).unwrap();
        container.add_all("owner", json!({"list": [9]})).unwrap();

        assert_eq!(container.get("owner", "list"), Some(&json!([9, 2, 3])));
    }

    #[test]
    fn test_add_all_new_value_wins_on_conflict() {
        let mut container = ViewHelperVariableContainer::new();
        container.add_all("owner", json!({"a": {"x": 1}, "b": 1})).unwrap();
        container.add_all("owner", json!({"a": "flat", "b": {"nested": true}})).unwrap();

        assert_eq!(container.get("owner", "a"), Some(&json!("flat")));
        assert_eq!(container.get("owner", "b"), Some(&json!({"nested": true})));
    }

    #[test]
    fn test_add_all_keys_list_by_index() {
        let mut container = ViewHelperVariableContainer::new();
        container.add("owner", "1", json!({"x": 1}));
        container.add_all("owner", vec![json!("first"), json!({"y": 2})]).unwrap();

        assert_eq!(container.get("owner", "0"), Some(&json!("first")));
        assert_eq!(container.get("owner", "1"), Some(&json!({"x": 1, "y": 2})));
    }

    #[test]
    fn test_add_all_rejects_non_mapping() {
        let mut container = ViewHelperVariableContainer::new();
        let result = container.add_all("owner", "not-iterable");

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::InvalidArgument));
        assert!(container.get_all("owner").is_none());
    }

    #[test]
    fn test_get_all_or_default() {
        let container = ViewHelperVariableContainer::new();

        assert!(container.get_all("owner").is_none());
        assert_eq!(container.get_all_or("owner", json!({})), json!({}));
    }

    #[test]
    fn test_serialize_only_values() {
        let mut container = ViewHelperVariableContainer::new();
        container.add("cycle", "position", json!(2));
        container.set_view(ViewId::next());

        let serialized = serde_json::to_value(&container).unwrap();
        assert_eq!(serialized, json!({"cycle": {"position": 2}}));

        let restored: ViewHelperVariableContainer = serde_json::from_value(serialized).unwrap();
        assert_eq!(restored.get("cycle", "position"), Some(&json!(2)));
        assert_eq!(restored.view(), None);
    }
}
