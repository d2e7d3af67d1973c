//! Output formatting for CLI commands.
//!
//! Supports text, JSON, and newline-delimited JSON output formats.

use crate::error::Error;
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// A single pretty-printed JSON document.
    Json,
    /// One compact JSON document per line.
    Ndjson,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" => Self::Ndjson,
            _ => Self::Text,
        }
    }

    /// Returns `true` if results can be written as they arrive.
    #[must_use]
    pub const fn is_streaming(self) -> bool {
        !matches!(self, Self::Json)
    }
}

/// One query result: an identifier and, optionally, its object.
#[derive(Debug, Clone, Serialize)]
pub struct QueryItem<'a> {
    /// Object identifier.
    pub id: Uuid,
    /// The cached object, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<&'a Value>,
}

/// Formats a single result line for streaming formats.
#[must_use]
pub fn format_query_item(item: &QueryItem<'_>, format: OutputFormat) -> String {
    match (format, item.object) {
        (OutputFormat::Text, None) => format!("{}\n", item.id),
        (OutputFormat::Text, Some(object)) => format!("{}\t{}\n", item.id, compact(object)),
        (_, Some(object)) => format!("{}\n", compact(object)),
        (_, None) => format!("{}\n", compact(&json!(item.id))),
    }
}

/// Formats all results at once (used for [`OutputFormat::Json`]).
#[must_use]
pub fn format_query_results(items: &[QueryItem<'_>], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            if items.iter().all(|i| i.object.is_none()) {
                let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
                format_json(&ids)
            } else {
                let objects: Vec<&Value> = items.iter().filter_map(|i| i.object).collect();
                format_json(&objects)
            }
        }
        _ => items
            .iter()
            .map(|item| format_query_item(item, format))
            .collect(),
    }
}

/// Formats the result of a save.
#[must_use]
pub fn format_saved(id: Uuid, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("Saved {id}\n"),
        OutputFormat::Json => format_json(&json!({ "ID": id })),
        OutputFormat::Ndjson => format!("{}\n", compact(&json!({ "ID": id }))),
    }
}

/// Formats the result of a delete.
#[must_use]
pub fn format_deleted(id: Uuid, deleted: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text if deleted => format!("Deleted {id}\n"),
        OutputFormat::Text => format!("Not deleted: {id}\n"),
        OutputFormat::Json => format_json(&json!({ "ID": id, "deleted": deleted })),
        OutputFormat::Ndjson => format!("{}\n", compact(&json!({ "ID": id, "deleted": deleted }))),
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(err: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => err.to_string(),
        OutputFormat::Json => format_json(&json!({ "error": err.to_string() }))
            .trim_end()
            .to_string(),
        OutputFormat::Ndjson => compact(&json!({ "error": err.to_string() })),
    }
}

/// Formats a value as pretty JSON with a trailing newline.
fn format_json<T: Serialize>(value: &T) -> String {
    let mut output = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    output.push('\n');
    output
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocumentError, TransportError};

    const ID: &str = "a4f1e0c2-1b2c-4d3e-8f40-5a6b7c8d9e0f";

    fn id() -> Uuid {
        Uuid::try_parse(ID).unwrap()
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("ndjson"), OutputFormat::Ndjson);
        assert_eq!(OutputFormat::parse("jsonl"), OutputFormat::Ndjson);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
        assert!(OutputFormat::Ndjson.is_streaming());
        assert!(!OutputFormat::Json.is_streaming());
    }

    #[test]
    fn test_format_query_item() {
        let object = json!({"ID": ID, "v": 1});
        let bare = QueryItem {
            id: id(),
            object: None,
        };
        let full = QueryItem {
            id: id(),
            object: Some(&object),
        };

        assert_eq!(format_query_item(&bare, OutputFormat::Text), format!("{ID}\n"));
        assert_eq!(
            format_query_item(&full, OutputFormat::Text),
            format!("{ID}\t{{\"ID\":\"{ID}\",\"v\":1}}\n")
        );
        assert_eq!(format_query_item(&bare, OutputFormat::Ndjson), format!("\"{ID}\"\n"));
        assert!(format_query_item(&full, OutputFormat::Ndjson).starts_with("{\"ID\""));
    }

    #[test]
    fn test_format_query_results_json() {
        let object = json!({"ID": ID});
        let ids = [QueryItem {
            id: id(),
            object: None,
        }];
        let json_ids = format_query_results(&ids, OutputFormat::Json);
        let parsed: Vec<String> = serde_json::from_str(&json_ids).unwrap();
        assert_eq!(parsed, vec![ID.to_string()]);

        let objects = [QueryItem {
            id: id(),
            object: Some(&object),
        }];
        let json_objects = format_query_results(&objects, OutputFormat::Json);
        let parsed: Vec<Value> = serde_json::from_str(&json_objects).unwrap();
        assert_eq!(parsed, vec![object.clone()]);

        assert_eq!(format_query_results(&[], OutputFormat::Json), "[]\n");
    }

    #[test]
    fn test_format_saved_and_deleted() {
        assert_eq!(format_saved(id(), OutputFormat::Text), format!("Saved {ID}\n"));
        assert!(format_saved(id(), OutputFormat::Json).contains(ID));
        assert_eq!(format_deleted(id(), true, OutputFormat::Text), format!("Deleted {ID}\n"));
        assert!(format_deleted(id(), false, OutputFormat::Text).starts_with("Not deleted"));
        assert!(format_deleted(id(), false, OutputFormat::Ndjson).contains("\"deleted\":false"));
    }

    #[test]
    fn test_format_error() {
        let err = Error::Document(DocumentError::MissingId { offset: 3 });
        assert!(format_error(&err, OutputFormat::Text).contains("no ID"));

        let err = Error::Transport(TransportError::Body("reset".to_string()));
        let json = format_error(&err, OutputFormat::Json);
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("reset"));
    }
}
