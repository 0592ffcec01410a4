//! Encode INI documents to output formats.
//!
//! TOML and YAML are handled by the CLI tool (binini) with dedicated
//! libraries; this module covers the formats with no dependency.

use crate::document::{Document, Scope};
use crate::value::Value;

/// Output format for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// INI, every line as it was read or last rewritten
    Ini,
    /// INI, every line rebuilt from its fields
    Canonical,
    /// JSON object, one nested object per section
    Json,
}

/// Encode a document in the specified format.
pub fn encode(doc: &Document, format: Format) -> String {
    match format {
        Format::Ini => doc.to_raw_string(),
        Format::Canonical => doc.to_canonical_string(),
        Format::Json => encode_json(doc),
    }
}

// =============================================================================
// JSON Encoder
// =============================================================================

fn encode_json(doc: &Document) -> String {
    let mut items: Vec<String> = encode_json_entries(doc.root(), 1);
    for section in doc.sections() {
        items.push(format!(
            "  {}: {}",
            encode_json_string(section.name()),
            encode_json_scope(section.body(), 1)
        ));
    }
    wrap_object(&items, 0)
}

fn encode_json_scope(scope: &Scope, indent: usize) -> String {
    wrap_object(&encode_json_entries(scope, indent + 1), indent)
}

fn encode_json_entries(scope: &Scope, indent: usize) -> Vec<String> {
    let pad = "  ".repeat(indent);
    scope
        .entries()
        .map(|(key, value)| {
            format!(
                "{}{}: {}",
                pad,
                encode_json_string(key),
                encode_json_value(value)
            )
        })
        .collect()
}

fn wrap_object(items: &[String], indent: usize) -> String {
    if items.is_empty() {
        "{}".to_string()
    } else {
        format!("{{\n{}\n{}}}", items.join(",\n"), "  ".repeat(indent))
    }
}

fn encode_json_value(value: &Value) -> String {
    match value {
        Value::String(s) => encode_json_string(s),
        Value::Float(f) if !f.is_finite() => "null".to_string(), // JSON has no NaN/Infinity
        other => other.encode(),
    }
}

fn encode_json_string(s: &str) -> String {
    let mut result = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x08' => result.push_str("\\b"),
            '\x0c' => result.push_str("\\f"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_json() {
        let doc = Document::parse(
            "selectedPreset = standard\n[high]\npixelFormat = Format48bppRgb\nimageQuality = 100\n[empty]",
        )
        .unwrap();
        let expected = "{\n  \"selectedPreset\": \"standard\",\n  \"high\": {\n    \"pixelFormat\": \"Format48bppRgb\",\n    \"imageQuality\": 100\n  },\n  \"empty\": {}\n}";
        assert_eq!(encode(&doc, Format::Json), expected);
    }

    #[test]
    fn test_encode_json_empty() {
        assert_eq!(encode(&Document::new(), Format::Json), "{}");
    }

    #[test]
    fn test_encode_json_string_escapes() {
        assert_eq!(encode_json_string("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(encode_json_string("\u{1}"), "\"\\u0001\"");
    }
}
