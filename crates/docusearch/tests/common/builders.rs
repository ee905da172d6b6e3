//! Builders for parser metadata maps.

#![allow(dead_code)]

use docusearch::Metadata;
use serde_json::{json, Value};

/// Builds the field map a document parser hands to the core.
pub struct MetadataBuilder {
    fields: Metadata,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self {
            fields: Metadata::new(),
        }
    }

    pub fn title(self, title: &str) -> Self {
        self.field("title", json!(title))
    }

    /// Adds a structured author entry.
    pub fn author(mut self, first: &str, last: &str) -> Self {
        let entry = json!({
            "first_name": first,
            "last_name": last,
            "full_name": format!("{} {}", first, last),
        });
        self.push_author(entry);
        self
    }

    /// Adds a legacy flat-string author entry.
    pub fn legacy_author(mut self, name: &str) -> Self {
        self.push_author(json!(name));
        self
    }

    pub fn topic(self, topic: &str) -> Self {
        self.field("topic", json!(topic))
    }

    pub fn abstract_text(self, text: &str) -> Self {
        self.field("abstract", json!(text))
    }

    pub fn published_date(self, date: &str) -> Self {
        self.field("published_date", json!(date))
    }

    pub fn file_type(self, file_type: &str) -> Self {
        self.field("file_type", json!(file_type))
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Metadata {
        self.fields
    }

    fn push_author(&mut self, entry: Value) {
        match self.fields.get_mut("author") {
            Some(Value::Array(authors)) => authors.push(entry),
            _ => {
                self.fields.insert("author".to_string(), Value::Array(vec![entry]));
            }
        }
    }
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}
