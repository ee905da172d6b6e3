//! Indexed document records and the searchable text built from them.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::jobs::Metadata;

/// Placeholder the metadata extractor emits for fields it could not find.
pub const NOT_FOUND: &str = "Not found";

/// Sequence id assigned at index time. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc_{}", self.0)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorName {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    /// Older extractor output used a single `name` key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// An author entry: either a structured name or a legacy flat string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Structured(AuthorName),
    Legacy(String),
}

impl Author {
    pub fn display_name(&self) -> String {
        match self {
            Author::Legacy(name) => name.trim().to_string(),
            Author::Structured(author) => {
                if !author.full_name.trim().is_empty() {
                    return author.full_name.trim().to_string();
                }
                let joined = format!("{} {}", author.first_name.trim(), author.last_name.trim());
                let joined = joined.trim();
                if !joined.is_empty() {
                    return joined.to_string();
                }
                author.name.trim().to_string()
            }
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Author::Legacy(s.clone())),
            Value::Object(_) => serde_json::from_value(value.clone())
                .ok()
                .map(Author::Structured),
            _ => None,
        }
    }
}

/// Normalized metadata snapshot stored per indexed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedDocument {
    pub doc_id: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub filename: String,
    pub title: Option<String>,
    pub file_type: String,
    pub upload_date: String,
    pub author: Vec<Author>,
    pub topic: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub published_date: String,
}

fn text_field(metadata: &Metadata, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn authors(metadata: &Metadata) -> Vec<Author> {
    match metadata.get("author") {
        Some(Value::Array(items)) => items.iter().filter_map(Author::from_value).collect(),
        Some(value) => Author::from_value(value).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Abstract at top level, falling back to a nested `metadata` object.
fn abstract_text(metadata: &Metadata) -> String {
    text_field(metadata, "abstract")
        .or_else(|| match metadata.get("metadata") {
            Some(Value::Object(nested)) => text_field(nested, "abstract"),
            _ => None,
        })
        .unwrap_or_default()
}

fn is_meaningful(value: &str) -> bool {
    !value.is_empty() && value != NOT_FOUND
}

impl IndexedDocument {
    pub fn from_metadata(
        doc_id: DocumentId,
        job_id: Option<String>,
        filename: &str,
        metadata: &Metadata,
    ) -> Self {
        Self {
            doc_id,
            job_id,
            filename: filename.to_string(),
            title: text_field(metadata, "title"),
            file_type: text_field(metadata, "file_type").unwrap_or_else(|| "Unknown".to_string()),
            upload_date: text_field(metadata, "upload_date").unwrap_or_default(),
            author: authors(metadata),
            topic: text_field(metadata, "topic").unwrap_or_default(),
            abstract_text: abstract_text(metadata),
            published_date: text_field(metadata, "published_date").unwrap_or_default(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Title, author names, topic, abstract and published date joined by
    /// single spaces, skipping empty and "Not found" values.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            parts.push(title.to_string());
        }
        for author in &self.author {
            let name = author.display_name();
            if is_meaningful(&name) {
                parts.push(name);
            }
        }
        for field in [&self.topic, &self.abstract_text, &self.published_date] {
            if is_meaningful(field) {
                parts.push(field.clone());
            }
        }

        parts.join(" ")
    }
}
