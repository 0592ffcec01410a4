//! Error types for INI parsing and editing.

use crate::value::ValueType;
use thiserror::Error;

/// Result type for INI operations.
pub type Result<T> = std::result::Result<T, IniError>;

/// Parse context carrying filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub filename: Option<String>,
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a location suffix for error messages. `line` is zero-based.
    pub fn loc_suffix(&self, line: usize) -> String {
        match &self.filename {
            Some(name) => format!(" at line {} of <{}>", line + 1, name),
            None => format!(" at line {}", line + 1),
        }
    }
}

/// Error type for INI parsing and editing.
#[derive(Error, Debug)]
pub enum IniError {
    /// A line that fits none of the line grammars.
    #[error("Malformed line: {reason}{location}")]
    MalformedLine {
        reason: &'static str,
        location: String,
    },

    /// A key repeated within one scope.
    #[error("Duplicate key \"{key}\" in {scope}{location}")]
    DuplicateKey {
        key: String,
        scope: String,
        location: String,
    },

    /// A section name used twice in one document.
    #[error("Duplicate section [{name}]{location}")]
    DuplicateSection { name: String, location: String },

    /// A section header among the body lines handed to a new section.
    #[error("Section header not allowed in section body{0}")]
    HeaderInBody(String),

    /// A key exists but holds another kind of value.
    #[error("Type mismatch for \"{key}\": expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: ValueType,
        found: ValueType,
    },

    /// Key is empty, contains whitespace, or starts with a reserved character.
    #[error("Invalid key \"{0}\"")]
    InvalidKey(String),

    /// Comment is empty, lacks a `;`/`#` marker, or spans lines.
    #[error("Invalid comment {0:?}")]
    InvalidComment(String),

    /// Section name is empty, padded, bracketed, or spans lines.
    #[error("Invalid section name \"{0}\"")]
    InvalidSectionName(String),

    /// Value that has no INI encoding.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Operation that does not apply to the target.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IniError {
    /// Create an error with location information.
    pub fn with_location(self, ctx: &ParseContext, line: usize) -> Self {
        let location = ctx.loc_suffix(line);
        match self {
            IniError::MalformedLine { reason, .. } => IniError::MalformedLine { reason, location },
            IniError::DuplicateKey { key, scope, .. } => IniError::DuplicateKey {
                key,
                scope,
                location,
            },
            IniError::DuplicateSection { name, .. } => IniError::DuplicateSection { name, location },
            IniError::HeaderInBody(_) => IniError::HeaderInBody(location),
            other => other,
        }
    }

    /// Returns `true` if this error means a document could not be built.
    ///
    /// Callers answer these by starting over from an empty document.
    pub fn is_malformed_document(&self) -> bool {
        matches!(
            self,
            IniError::MalformedLine { .. }
                | IniError::DuplicateKey { .. }
                | IniError::DuplicateSection { .. }
                | IniError::HeaderInBody(_)
        )
    }

    /// Returns `true` for a type mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, IniError::TypeMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loc_suffix() {
        let ctx = ParseContext::new(Some("capture.ini"));
        assert_eq!(ctx.loc_suffix(2), " at line 3 of <capture.ini>");
        assert_eq!(ParseContext::new(None).loc_suffix(0), " at line 1");
    }

    #[test]
    fn test_with_location_keeps_reason() {
        let err = IniError::MalformedLine {
            reason: "missing '=' separator",
            location: String::new(),
        }
        .with_location(&ParseContext::new(Some("a.ini")), 4);
        assert_eq!(
            err.to_string(),
            "Malformed line: missing '=' separator at line 5 of <a.ini>"
        );
        assert!(err.is_malformed_document());
    }

    #[test]
    fn test_type_mismatch_is_not_malformed_document() {
        let err = IniError::TypeMismatch {
            key: "imageQuality".to_string(),
            expected: ValueType::Int,
            found: ValueType::String,
        };
        assert!(!err.is_malformed_document());
        assert!(err.is_type_mismatch());
        assert_eq!(
            err.to_string(),
            "Type mismatch for \"imageQuality\": expected int, found string"
        );
    }
}
