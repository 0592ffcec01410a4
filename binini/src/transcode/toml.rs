//! TOML transcoding: convert between INI documents and TOML text.
//!
//! Mapping from TOML to INI:
//!   - top-level scalar    -> global key
//!   - top-level table     -> section (inline tables too)
//!   - TOML string         -> Value::String
//!   - TOML integer        -> Value::Int
//!   - TOML float          -> Value::Float
//!   - TOML boolean        -> Value::Bool
//!   - TOML datetime       -> Value::String (RFC 3339 representation)
//!
//! Mapping from INI to TOML:
//!   - global keys         -> top-level key/value pairs
//!   - sections            -> tables, in document order
//!
//! Lossy edges:
//!   - Arrays, arrays of tables, and tables nested in tables have no INI form.
//!   - TOML NaN and infinities have no INI form.
//!   - Comments and blank lines are dropped in both directions.

use super::{check_collisions, insert};
use anyhow::{anyhow, bail, Context, Result};
use libini::{Document, Value};
use toml_edit::{DocumentMut, Item, Table};

/// Decode TOML text into an INI document.
pub fn decode(input: &str) -> Result<Document> {
    let toml: DocumentMut = input.parse::<DocumentMut>().context("TOML parse error")?;
    let mut doc = Document::new();

    for (key, item) in toml.as_table().iter() {
        if let Some(table) = item.as_table_like() {
            doc.create_section(key, &[], None)
                .with_context(|| format!("table [{}]", key))?;
            for (inner_key, inner) in table.iter() {
                let value = item_to_value(inner)
                    .with_context(|| format!("{}.{}", key, inner_key))?;
                insert(&mut doc, Some(key), inner_key, value)?;
            }
        } else {
            let value = item_to_value(item).with_context(|| key.to_string())?;
            insert(&mut doc, None, key, value)?;
        }
    }
    Ok(doc)
}

/// Encode an INI document as TOML text.
pub fn encode(doc: &Document) -> Result<String> {
    check_collisions(doc)?;
    let mut out = DocumentMut::new();
    for (key, value) in doc.root().entries() {
        out.insert(key, toml_edit::value(value_to_toml(value)));
    }
    for section in doc.sections() {
        let mut table = Table::new();
        for (key, value) in section.body().entries() {
            table.insert(key, toml_edit::value(value_to_toml(value)));
        }
        out.insert(section.name(), Item::Table(table));
    }
    Ok(out.to_string())
}

fn item_to_value(item: &Item) -> Result<Value> {
    match item {
        Item::Value(v) => toml_value_to_ini(v),
        Item::Table(_) => bail!("nested tables have no INI form"),
        Item::ArrayOfTables(_) => bail!("arrays of tables have no INI form"),
        Item::None => Err(anyhow!("missing value")),
    }
}

fn toml_value_to_ini(v: &toml_edit::Value) -> Result<Value> {
    match v {
        toml_edit::Value::String(s) => Ok(Value::String(s.value().clone())),
        toml_edit::Value::Integer(i) => Ok(Value::Int(*i.value())),
        toml_edit::Value::Float(f) => Ok(Value::Float(*f.value())),
        toml_edit::Value::Boolean(b) => Ok(Value::Bool(*b.value())),
        toml_edit::Value::Datetime(dt) => Ok(Value::String(dt.value().to_string())),
        toml_edit::Value::Array(_) => bail!("arrays have no INI form"),
        toml_edit::Value::InlineTable(_) => bail!("nested tables have no INI form"),
    }
}

fn value_to_toml(value: &Value) -> toml_edit::Value {
    match value {
        Value::String(s) => toml_edit::Value::from(s.as_str()),
        Value::Bool(b) => toml_edit::Value::from(*b),
        Value::Int(n) => toml_edit::Value::from(*n),
        Value::Float(f) => toml_edit::Value::from(*f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tables_to_sections() {
        let doc = decode(
            "selectedPreset = \"standard\"\n\n[high]\npixelFormat = \"Format48bppRgb\"\nimageQuality = 100\nratio = 0.5\n",
        )
        .unwrap();
        assert_eq!(
            doc.search::<String>("selectedPreset").unwrap().as_deref(),
            Some("standard")
        );
        assert_eq!(doc.search_in::<i64>("high", "imageQuality").unwrap(), Some(100));
        assert_eq!(doc.search_in::<f64>("high", "ratio").unwrap(), Some(0.5));
    }

    #[test]
    fn test_decode_inline_table_and_datetime() {
        let doc = decode("when = 1979-05-27T07:32:00Z\nwindow = { left = 10, top = 20 }\n").unwrap();
        assert_eq!(
            doc.search::<String>("when").unwrap().as_deref(),
            Some("1979-05-27T07:32:00Z")
        );
        assert_eq!(doc.search_in::<i64>("window", "top").unwrap(), Some(20));
    }

    #[test]
    fn test_decode_rejects_nesting() {
        assert!(decode("[a.b]\nx = 1\n").is_err());
        assert!(decode("list = [1, 2]\n").is_err());
        assert!(decode("[[items]]\nx = 1\n").is_err());
    }

    #[test]
    fn test_round_trip() {
        let doc = libini::parse("name = \"My Value\"\nflag = true\n[high]\nimageQuality = 100\ndelay = 2.0").unwrap();
        let text = encode(&doc).unwrap();
        let back = decode(&text).unwrap();
        assert_eq!(back.to_canonical_string(), doc.to_canonical_string());
    }

    #[test]
    fn test_encode_rejects_collision() {
        let doc = libini::parse("high = 1\n[high]\nx = 2").unwrap();
        assert!(encode(&doc).is_err());
    }
}
