use serde_json::Value;

/// Raw text from the template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    text: String,
}

impl TextNode {
    pub fn new<T>(text: T) -> Self
    where
        T: Into<String>,
    {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Append text to the end of this node.
    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn execute(&self) -> Value {
        Value::String(self.text.clone())
    }
}

/// A value written directly in the template, such as `"name"`, `-12` or
/// `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralNode {
    value: Value,
}

impl LiteralNode {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn execute(&self) -> Value {
        self.value.clone()
    }
}
