use crate::report::Error;
use serde::Serialize;
use serde_json::{to_value, Value};
use std::collections::HashMap;

/// Supplies the template variables that nodes read and write.
///
/// Variables live in frames. Loops push a frame for their own variables and
/// pop it when they finish, so values written inside a loop never leak out.
pub trait VariableProvider: Send {
    /// Set the value of a variable in the top frame.
    fn add(&mut self, key: &str, value: Value);

    /// Return the value of a variable, searching from the top frame down.
    fn get(&self, key: &str) -> Option<&Value>;

    /// Return true if a variable with the given name exists in any frame.
    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a variable from every frame.
    fn remove(&mut self, key: &str);

    /// Push a new, empty frame.
    fn push(&mut self);

    /// Remove the top frame.
    fn pop(&mut self);

    /// Return the names of every visible variable.
    fn names(&self) -> Vec<String>;
}

/// Provides layered storage for template variables.
#[derive(Debug, Clone)]
pub struct StandardVariableProvider {
    frames: Vec<HashMap<String, Value>>,
}

impl StandardVariableProvider {
    /// Create a new [`StandardVariableProvider`] with one empty frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use stencil::StandardVariableProvider;
    ///
    /// let provider = StandardVariableProvider::new();
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Serialize the value and insert it into the top frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use stencil::StandardVariableProvider;
    ///
    /// let mut provider = StandardVariableProvider::new();
    /// let result = provider.insert("name", "taylor");
    ///
    /// assert!(result.is_ok());
    /// ```
    pub fn insert<S, T>(&mut self, key: S, value: T) -> Result<(), Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        let key = key.into();
        let value = to_value(value).map_err(|error| {
            Error::invalid_argument("unserializable value")
                .with_help(format!("value for `{key}` is unserializable: {error}"))
        })?;
        self.add(&key, value);

        Ok(())
    }

    /// Serialize the value and insert it into the top frame.
    ///
    /// # Panics
    ///
    /// Panics if the serialization fails.
    #[inline]
    pub fn insert_must<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Serialize,
    {
        self.add(
            &key.into(),
            to_value(value).expect("value must be serializable"),
        );
    }

    /// Serialize the value and insert it into the top frame.
    ///
    /// Returns the [`StandardVariableProvider`], so additional methods may be
    /// chained.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    #[inline]
    pub fn with<S, T>(mut self, key: S, value: T) -> Result<Self, Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert(key, value)?;

        Ok(self)
    }

    /// Serialize the value and insert it into the top frame.
    ///
    /// Returns the [`StandardVariableProvider`], so additional methods may be
    /// chained.
    ///
    /// # Panics
    ///
    /// Panics if the serialization fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use stencil::{StandardVariableProvider, VariableProvider};
    ///
    /// let provider = StandardVariableProvider::new().with_must("name", "taylor");
    ///
    /// assert_eq!(provider.get("name").unwrap(), "taylor");
    /// ```
    #[inline]
    pub fn with_must<S, T>(mut self, key: S, value: T) -> Self
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert_must(key, value);

        self
    }
}

impl VariableProvider for StandardVariableProvider {
    fn add(&mut self, key: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(key.to_owned(), value);
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(key))
    }

    fn remove(&mut self, key: &str) {
        for frame in self.frames.iter_mut() {
            frame.remove(key);
        }
    }

    #[inline]
    fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Remove the top frame.
    ///
    /// # Panics
    ///
    /// Panics when called on the last remaining frame.
    #[inline]
    fn pop(&mut self) {
        if self.frames.len() == 1 {
            panic!("last scope must never be removed");
        }
        self.frames.pop();
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .frames
            .iter()
            .flat_map(|frame| frame.keys().cloned())
            .collect();
        names.sort();
        names.dedup();

        names
    }
}

impl Default for StandardVariableProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{StandardVariableProvider, VariableProvider};
    use serde_json::json;

    #[test]
    fn test_provider_insert() {
        let mut provider = StandardVariableProvider::new();
        provider.insert_must("one", "two");

        assert!(provider
            .get("one")
            .is_some_and(|t| t.as_str() == Some("two")));
    }

    #[test]
    fn test_provider_insert_fluent() {
        assert!(StandardVariableProvider::new()
            .with_must("three", "four")
            .get("three")
            .is_some_and(|t| t.as_str() == Some("four")))
    }

    #[test]
    fn test_frames_shadow_and_restore() {
        let mut provider = StandardVariableProvider::new()
            .with_must("one", "one")
            .with_must("two", "two");
        provider.push();
        provider.add("one", json!("shadowed one"));

        assert_eq!(provider.get("one"), Some(&json!("shadowed one")));
        assert_eq!(provider.get("two"), Some(&json!("two")));
        provider.pop();

        assert_eq!(provider.get("one"), Some(&json!("one")));
        assert_eq!(provider.get("two"), Some(&json!("two")));
    }

    #[test]
    fn test_remove_from_every_frame() {
        let mut provider = StandardVariableProvider::new().with_must("name", "outer");
        provider.push();
        provider.add("name", json!("inner"));
        provider.remove("name");

        assert!(!provider.exists("name"));
        provider.pop();
        assert!(!provider.exists("name"));
    }

    #[test]
    fn test_stored_null_exists() {
        let provider = StandardVariableProvider::new().with_must("empty", ());

        assert!(provider.exists("empty"));
        assert_eq!(provider.get("empty"), Some(&json!(null)));
    }

    #[test]
    fn test_names_are_unique() {
        let mut provider = StandardVariableProvider::new().with_must("b", 1).with_must("a", 2);
        provider.push();
        provider.add("a", json!(3));

        assert_eq!(provider.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    #[should_panic(expected = "last scope must never be removed")]
    fn test_pop_last_frame() {
        let mut provider = StandardVariableProvider::new();

        provider.pop();
    }
}
