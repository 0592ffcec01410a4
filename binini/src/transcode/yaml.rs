//! YAML transcoding: convert between INI documents and YAML text.
//!
//! Mapping from YAML to INI:
//!   - top-level scalar   -> global key
//!   - top-level mapping  -> section
//!   - YAML bool          -> Value::Bool
//!   - YAML integer       -> Value::Int (must fit in i64)
//!   - YAML float         -> Value::Float
//!   - YAML string        -> Value::String
//!   - tagged values      -> the inner value, tag dropped
//!
//! Mapping from INI to YAML:
//!   - global keys        -> top-level mapping entries
//!   - sections           -> nested mappings, in document order
//!
//! Nulls, sequences, and mappings nested in sections have no INI form.

use super::{check_collisions, insert};
use anyhow::{bail, Context, Result};
use libini::{Document, Value};

/// Decode YAML text into an INI document.
pub fn decode(input: &str) -> Result<Document> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(input).context("YAML parse error")?;
    let mut doc = Document::new();

    let map = match untag(&yaml) {
        serde_yaml::Value::Mapping(map) => map,
        serde_yaml::Value::Null => return Ok(doc),
        _ => bail!("YAML top-level value must be a mapping"),
    };

    for (k, v) in map {
        let key = yaml_key(k)?;
        if let serde_yaml::Value::Mapping(inner) = untag(v) {
            doc.create_section(&key, &[], None)
                .with_context(|| format!("mapping {:?}", key))?;
            for (ik, iv) in inner {
                let inner_key = yaml_key(ik)?;
                let value =
                    yaml_to_value(iv).with_context(|| format!("{}.{}", key, inner_key))?;
                insert(&mut doc, Some(&key), &inner_key, value)?;
            }
        } else {
            let value = yaml_to_value(v).with_context(|| key.clone())?;
            insert(&mut doc, None, &key, value)?;
        }
    }
    Ok(doc)
}

/// Encode an INI document as YAML text.
pub fn encode(doc: &Document) -> Result<String> {
    check_collisions(doc)?;
    let mut map = serde_yaml::Mapping::new();
    for (key, value) in doc.root().entries() {
        map.insert(key.into(), value_to_yaml(value));
    }
    for section in doc.sections() {
        let mut inner = serde_yaml::Mapping::new();
        for (key, value) in section.body().entries() {
            inner.insert(key.into(), value_to_yaml(value));
        }
        map.insert(section.name().into(), serde_yaml::Value::Mapping(inner));
    }
    serde_yaml::to_string(&serde_yaml::Value::Mapping(map)).context("YAML encode error")
}

fn untag(yaml: &serde_yaml::Value) -> &serde_yaml::Value {
    match yaml {
        serde_yaml::Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn yaml_key(k: &serde_yaml::Value) -> Result<String> {
    match untag(k) {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => bail!("unsupported YAML mapping key: {:?}", other),
    }
}

fn yaml_to_value(yaml: &serde_yaml::Value) -> Result<Value> {
    match untag(yaml) {
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if n.is_f64() {
                n.as_f64()
                    .map(Value::Float)
                    .context("unsupported YAML number")
            } else {
                bail!("integer {} does not fit in 64 bits", n)
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Null => bail!("null has no INI form"),
        serde_yaml::Value::Sequence(_) => bail!("sequences have no INI form"),
        serde_yaml::Value::Mapping(_) => bail!("nested mappings have no INI form"),
        serde_yaml::Value::Tagged(_) => bail!("unsupported YAML tag"),
    }
}

fn value_to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Int(n) => serde_yaml::Value::Number((*n).into()),
        Value::Float(f) => serde_yaml::Value::Number((*f).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mappings_to_sections() {
        let doc = decode(
            "selectedPreset: standard\nhigh:\n  pixelFormat: Format48bppRgb\n  imageQuality: 100\n  enabled: true\n",
        )
        .unwrap();
        assert_eq!(
            doc.search::<String>("selectedPreset").unwrap().as_deref(),
            Some("standard")
        );
        assert_eq!(doc.search_in::<i64>("high", "imageQuality").unwrap(), Some(100));
        assert_eq!(doc.search_in::<bool>("high", "enabled").unwrap(), Some(true));
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_non_scalars() {
        assert!(decode("a: null\n").is_err());
        assert!(decode("a: [1, 2]\n").is_err());
        assert!(decode("a:\n  b:\n    c: 1\n").is_err());
        assert!(decode("- 1\n- 2\n").is_err());
    }

    #[test]
    fn test_round_trip() {
        let doc = libini::parse("name = \"My Value\"\nratio = 0.25\n[high]\nimageQuality = 100\nlabel = \"100\"").unwrap();
        let text = encode(&doc).unwrap();
        let back = decode(&text).unwrap();
        assert_eq!(back.to_canonical_string(), doc.to_canonical_string());
    }
}
