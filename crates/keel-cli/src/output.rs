//! Output formatting

use std::collections::BTreeMap;

use serde_json::{json, Value};

/// Collects fields for `--json` and a message for humans, then prints one of them
pub struct Output {
    json_mode: bool,
    fields: BTreeMap<String, Value>,
    lines: Vec<String>,
}

impl Output {
    /// Empty output in the given mode
    pub fn new(json_mode: bool) -> Self {
        Self {
            json_mode,
            fields: BTreeMap::new(),
            lines: Vec::new(),
        }
    }

    /// String field
    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        self.fields
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Numeric field
    pub fn field_u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), Value::Number(value.into()));
        self
    }

    /// Boolean field
    pub fn field_bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), Value::Bool(value));
        self
    }

    /// Arbitrary JSON field
    pub fn field_value(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Add a line to the human-readable message
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Add a `label: value` line, padded so values align
    pub fn labeled(self, label: &str, value: impl std::fmt::Display) -> Self {
        self.line(format!("{:<12}{}", format!("{}:", label), value))
    }

    /// Print to stdout
    pub fn print(self) {
        if self.json_mode {
            let json = json!(self.fields);
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        } else if !self.lines.is_empty() {
            println!("{}", self.lines.join("\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_ordered() {
        let output = Output::new(true)
            .field("status", "success")
            .field_u64("gas_left", 7)
            .field_bool("signed", false);
        let keys: Vec<_> = output.fields.keys().cloned().collect();
        assert_eq!(keys, vec!["gas_left", "signed", "status"]);
    }

    #[test]
    fn test_labeled_aligns() {
        let output = Output::new(false).labeled("Status", "success").labeled("Gas left", 9);
        assert_eq!(output.lines[0], "Status:     success");
        assert_eq!(output.lines[1], "Gas left:   9");
    }
}
