//! INI configuration engine.
//!
//! Parses INI text into a typed, ordered document, supports queries and
//! edits, and writes it back. Lines nobody touched come back byte for byte,
//! comments and spacing included; edited lines are rebuilt in canonical form.
//!
//! # Pipeline
//!
//! 1. **Scanner**: splits source text into lines on unescaped line feeds.
//!
//! 2. **Line classifier**: turns each line into an [`IniLine`]: key/value,
//!    section header, comment, or blank. Anything else aborts the parse.
//!
//! 3. **Document model**: groups lines into the global scope and one level of
//!    sections, rejecting repeated keys within a scope and repeated sections.
//!
//! # Example
//!
//! ```
//! use libini::{parse, AddOptions, CommentUpdate};
//!
//! let mut doc = parse("selectedPreset = standard\n[high]\nimageQuality = 100").unwrap();
//! assert_eq!(doc.search_in::<i64>("high", "imageQuality").unwrap(), Some(100));
//!
//! doc.set_value_in("high", "imageQuality", 70, CommentUpdate::Keep).unwrap();
//! doc.add_value("name", "My Value", AddOptions::default()).unwrap();
//! assert!(doc.to_raw_string().contains("name = \"My Value\""));
//! ```

mod document;
mod encode;
mod error;
mod escape;
mod line;
mod scanner;
mod value;

pub use document::{AddOptions, Document, Position, Scope, Section};
pub use encode::{encode, Format};
pub use error::{IniError, ParseContext, Result};
pub use line::{Comment, CommentUpdate, IniLine, LineType};
pub use value::{FromValue, Value, ValueType};

use log::warn;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Parse an INI document from a string.
pub fn parse(input: &str) -> Result<Document> {
    parse_with_filename(input, None)
}

/// Parse an INI document from a string with a filename for error messages.
pub fn parse_with_filename(input: &str, filename: Option<&str>) -> Result<Document> {
    let ctx = ParseContext::new(filename);
    Document::parse_with_context(input, &ctx)
}

/// Read and parse an INI file.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse_with_filename(&text, Some(&display_name(path)))
}

/// Write a document to a file, using each line's raw text.
pub fn write<P: AsRef<Path>>(path: P, doc: &Document) -> Result<()> {
    fs::write(path, doc.to_raw_string())?;
    Ok(())
}

/// How [`read_or_default`] obtained its document.
#[derive(Debug)]
pub enum Recovery {
    /// The file parsed cleanly.
    Parsed,
    /// The file does not exist; the document is empty.
    Missing,
    /// The file is malformed; the document is empty and should be rebuilt
    /// from defaults and written back.
    Reset(IniError),
}

impl Recovery {
    /// Returns `true` if the file should be rewritten.
    pub fn needs_write(&self) -> bool {
        !matches!(self, Recovery::Parsed)
    }
}

/// Read an INI file, starting over from an empty document when the file is
/// missing or malformed. Other I/O errors are returned.
pub fn read_or_default<P: AsRef<Path>>(path: P) -> Result<(Document, Recovery)> {
    let path = path.as_ref();
    match read(path) {
        Ok(doc) => Ok((doc, Recovery::Parsed)),
        Err(IniError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found, starting from an empty document", path.display());
            Ok((Document::new(), Recovery::Missing))
        }
        Err(e) if e.is_malformed_document() => {
            warn!("{}: {}; starting from an empty document", path.display(), e);
            Ok((Document::new(), Recovery::Reset(e)))
        }
        Err(e) => Err(e),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
