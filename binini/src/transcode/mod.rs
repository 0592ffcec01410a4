//! Conversions between INI documents and other configuration formats.
//!
//! Both directions map one level of tables to sections: top-level scalars are
//! global keys, top-level tables are sections, and anything deeper has no
//! INI form.

pub mod toml;
pub mod yaml;

use anyhow::{bail, Result};
use libini::{AddOptions, Document, Value};

/// Add a decoded global key or section key to `doc`.
fn insert(doc: &mut Document, section: Option<&str>, key: &str, value: Value) -> Result<()> {
    let added = match section {
        Some(name) => doc.add_value_in(name, key, value, AddOptions::default())?,
        None => doc.add_value(key, value, AddOptions::default())?,
    };
    if !added {
        match section {
            Some(name) => bail!("duplicate key {:?} in table {:?}", key, name),
            None => bail!("duplicate key {:?}", key),
        }
    }
    Ok(())
}

/// Fail when a global key and a section share a name.
fn check_collisions(doc: &Document) -> Result<()> {
    for section in doc.sections() {
        if doc.root().contains_key(section.name()) {
            bail!(
                "key {:?} is both a global value and a section",
                section.name()
            );
        }
    }
    Ok(())
}
