//! Output formatting for the ratewise CLI.
//!
//! Provides text, JSON, and pretty output formats.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON format - machine-readable output
    Json,
    /// Plain text format - one line per record
    #[default]
    Text,
    /// Pretty format - one field per line, records separated by blank lines
    Pretty,
}

impl OutputFormat {
    /// `--json` wins over `--format`.
    #[must_use]
    pub fn resolve(json: bool, format: Option<Self>) -> Self {
        if json {
            Self::Json
        } else {
            format.unwrap_or_default()
        }
    }
}

/// Formatter that can output data in text, JSON, or pretty format
#[derive(Debug, Clone)]
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format data according to the configured output format
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
            OutputFormat::Text => Ok(render_text(&serde_json::to_value(data)?)),
            OutputFormat::Pretty => Ok(render_pretty(&serde_json::to_value(data)?)),
        }
    }

    /// Format and print data to stdout
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn print<T: Serialize>(&self, data: &T) -> Result<()> {
        let output = self.format(data)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{output}")?;
        Ok(())
    }

    /// Format and print a list with a custom empty message
    ///
    /// For JSON, wraps the array in an object with `count` and `advice` fields.
    /// Other formats print the rows, or `empty_message` when there are none.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn print_list<T: Serialize>(
        &self,
        data: &[T],
        empty_message: &str,
        collection_name: &str,
        advice: &[String],
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let envelope = list_envelope(data, collection_name, advice)?;
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", serde_json::to_string_pretty(&envelope)?)?;
                Ok(())
            }
            OutputFormat::Text | OutputFormat::Pretty => {
                let mut stdout = io::stdout().lock();
                if data.is_empty() {
                    writeln!(stdout, "{empty_message}")?;
                } else {
                    writeln!(stdout, "{}", self.format(&data)?)?;
                }
                for line in advice {
                    writeln!(stdout, "  hint: {line}")?;
                }
                Ok(())
            }
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

fn list_envelope<T: Serialize>(
    data: &[T],
    collection_name: &str,
    advice: &[String],
) -> Result<Value> {
    let mut envelope = serde_json::Map::new();
    envelope.insert(collection_name.to_string(), serde_json::to_value(data)?);
    envelope.insert("count".to_string(), serde_json::json!(data.len()));
    envelope.insert("advice".to_string(), serde_json::json!(advice));
    Ok(Value::Object(envelope))
}

/// ID-like fields rendered first, without a label.
const ID_KEYS: [&str; 4] = ["review_id", "comment_id", "id", "slug"];

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(arr) => arr.is_empty(),
        _ => false,
    }
}

/// Render a JSON value as one line per record
fn render_text(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut parts: Vec<String> = ID_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .map(render_field_value)
                .collect();

            parts.extend(
                map.iter()
                    .filter(|(key, val)| !ID_KEYS.contains(&key.as_str()) && !is_blank(val))
                    .map(|(key, val)| format!("{key}:{}", render_field_value(val))),
            );
            parts.join("  ")
        }
        Value::Array(arr) => arr.iter().map(render_text).collect::<Vec<_>>().join("\n"),
        _ => render_field_value(value),
    }
}

/// Render a JSON value as `key: value` lines, nested objects indented
fn render_pretty(value: &Value) -> String {
    fn walk(value: &Value, indent: usize, out: &mut Vec<String>) {
        let pad = "  ".repeat(indent);
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter().filter(|(_, v)| !is_blank(v)) {
                    match val {
                        Value::Object(_) => {
                            out.push(format!("{pad}{key}:"));
                            walk(val, indent + 1, out);
                        }
                        Value::Array(arr) if arr.iter().any(Value::is_object) => {
                            out.push(format!("{pad}{key}: ({})", arr.len()));
                            for item in arr {
                                out.push(format!("{pad}  -"));
                                walk(item, indent + 2, out);
                            }
                        }
                        _ => out.push(format!("{pad}{key}: {}", render_field_value(val))),
                    }
                }
            }
            other => out.push(format!("{pad}{}", render_field_value(other))),
        }
    }

    match value {
        Value::Array(arr) => arr
            .iter()
            .map(render_pretty)
            .collect::<Vec<_>>()
            .join("\n\n"),
        _ => {
            let mut lines = Vec::new();
            walk(value, 0, &mut lines);
            lines.join("\n")
        }
    }
}

/// Render a single field value as concise text
fn render_field_value(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if s.contains(' ') || s.contains('\n') {
                format!("\"{}\"", s.replace('\n', "\\n"))
            } else {
                s.clone()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(render_field_value).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| format!("{k}:{}", render_field_value(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    struct Row {
        review_id: String,
        company: String,
        title: String,
        rating: u8,
        position: Option<String>,
        tags: Vec<String>,
    }

    fn row(id: &str) -> Row {
        Row {
            review_id: id.to_string(),
            company: "Acme".to_string(),
            title: "Great mentors".to_string(),
            rating: 5,
            position: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_resolve_prefers_json_flag() {
        assert_eq!(OutputFormat::resolve(true, Some(OutputFormat::Pretty)), OutputFormat::Json);
        assert_eq!(OutputFormat::resolve(false, Some(OutputFormat::Pretty)), OutputFormat::Pretty);
        assert_eq!(OutputFormat::resolve(false, None), OutputFormat::Text);
    }

    #[test]
    fn test_json_output() {
        let output = Formatter::new(OutputFormat::Json).format(&row("r1")).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["review_id"], "r1");
        assert_eq!(parsed["rating"], 5);
        assert!(parsed["position"].is_null());
    }

    #[test]
    fn test_text_output_leads_with_id_and_skips_blanks() {
        let output = Formatter::new(OutputFormat::Text).format(&row("r1")).unwrap();
        assert!(output.starts_with("r1"));
        assert!(output.contains("company:Acme"));
        assert!(output.contains("title:\"Great mentors\""));
        assert!(output.contains("rating:5"));
        assert!(!output.contains("position"));
        assert!(!output.contains("tags"));
    }

    #[test]
    fn test_text_output_one_line_per_record() {
        let output = Formatter::new(OutputFormat::Text)
            .format(&vec![row("r1"), row("r2")])
            .unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("r2"));
    }

    #[test]
    fn test_pretty_output_nests_objects() {
        let data = serde_json::json!({
            "review_id": "r1",
            "companies": { "name": "Acme", "slug": "acme" },
            "comments": [{ "id": "c1", "content": "Agreed" }],
            "reactions": [],
        });
        let output = Formatter::new(OutputFormat::Pretty).format(&data).unwrap();
        assert!(output.contains("review_id: r1"));
        assert!(output.contains("companies:\n  name: Acme"));
        assert!(output.contains("comments: (1)"));
        assert!(output.contains("content: Agreed"));
        assert!(!output.contains("reactions"));
    }

    #[test]
    fn test_list_envelope() {
        let advice = vec!["ratewise reviews list --page 2".to_string()];
        let envelope = list_envelope(&[row("r1"), row("r2")], "reviews", &advice).unwrap();
        assert_eq!(envelope["count"], 2);
        assert_eq!(envelope["reviews"].as_array().unwrap().len(), 2);
        assert_eq!(envelope["advice"][0], "ratewise reviews list --page 2");
    }
}
