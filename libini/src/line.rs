//! Line classifier.
//!
//! Classifies one physical line into a typed record and renders it back,
//! either verbatim (`raw`) or rebuilt from its fields (`canonical`).
//!
//! Classification order:
//! 1. Whitespace-only lines are blank.
//! 2. Lines starting with `;` or `#` are comments.
//! 3. Lines starting with `[` are section headers (or malformed).
//! 4. Everything else must be `key = value`, optionally followed by an
//!    inline comment.

use crate::error::{IniError, ParseContext, Result};
use crate::escape::{find_unescaped, has_dangling_escape, has_line_break, is_comment_marker};
use crate::value::{Value, ValueType};
use std::fmt;

/// What a line is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineType {
    KeyValue,
    SectionHeader,
    FullyCommented,
    Blank,
    Invalid,
}

/// Comment text, including its leading `;` or `#`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment(String);

impl Comment {
    /// Validate comment text: non-empty, starts with a marker, single line,
    /// and no trailing backslash that would swallow the next line.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !text.starts_with(is_comment_marker)
            || has_line_break(&text)
            || has_dangling_escape(text.trim_end())
        {
            return Err(IniError::InvalidComment(text));
        }
        Ok(Comment(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do with an inline comment when a value is rewritten.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CommentUpdate {
    /// Keep whatever comment the line had.
    #[default]
    Keep,
    /// Drop the comment.
    Remove,
    /// Replace (or add) the comment.
    Replace(Comment),
}

/// One classified line.
#[derive(Clone, Debug, PartialEq)]
pub struct IniLine {
    line_type: LineType,
    key: Option<String>,
    value: Option<Value>,
    inline_comment: Option<Comment>,
    section_header: Option<String>,
    raw: String,
}

/// Structure found by the classifier, before value decoding.
enum Shape<'a> {
    Blank,
    Comment(&'a str),
    Header {
        name: &'a str,
        comment: Option<&'a str>,
    },
    KeyValue {
        key: &'a str,
        text: &'a str,
        comment: Option<&'a str>,
    },
}

impl IniLine {
    /// Classify a line. Lines that fit no grammar come back as `Invalid`.
    pub fn parse(raw: &str) -> IniLine {
        match classify(raw) {
            Ok(shape) => {
                Self::from_shape(raw, shape, None).unwrap_or_else(|_| Self::invalid(raw))
            }
            Err(_) => Self::invalid(raw),
        }
    }

    /// Classify a line, failing if it fits no grammar.
    pub fn parse_valid(raw: &str) -> Result<IniLine> {
        classify(raw)
            .map_err(malformed)
            .and_then(|shape| Self::from_shape(raw, shape, None))
    }

    /// Classify a line that must be `key = value` with a value of the declared
    /// kind. Type inference is skipped.
    pub fn parse_as(raw: &str, value_type: ValueType) -> Result<IniLine> {
        match classify(raw).map_err(malformed)? {
            shape @ Shape::KeyValue { .. } => Self::from_shape(raw, shape, Some(value_type)),
            _ => Err(malformed("expected a key/value line")),
        }
    }

    /// Classify a line from a document, attaching its location to any error.
    pub(crate) fn parse_at(raw: &str, ctx: &ParseContext, line_num: usize) -> Result<IniLine> {
        Self::parse_valid(raw).map_err(|e| e.with_location(ctx, line_num))
    }

    fn from_shape(raw: &str, shape: Shape<'_>, declared: Option<ValueType>) -> Result<IniLine> {
        let line = match shape {
            Shape::Blank => IniLine::new(LineType::Blank, raw),
            Shape::Comment(text) => IniLine {
                inline_comment: Some(Comment(text.to_string())),
                ..IniLine::new(LineType::FullyCommented, raw)
            },
            Shape::Header { name, comment } => IniLine {
                section_header: Some(name.to_string()),
                inline_comment: comment.map(|c| Comment(c.to_string())),
                ..IniLine::new(LineType::SectionHeader, raw)
            },
            Shape::KeyValue { key, text, comment } => {
                let value = match declared {
                    None => Value::infer(text),
                    Some(expected) => {
                        Value::decode_as(text, expected).map_err(|found| IniError::TypeMismatch {
                            key: key.to_string(),
                            expected,
                            found,
                        })?
                    }
                };
                IniLine {
                    key: Some(key.to_string()),
                    value: Some(value),
                    inline_comment: comment.map(|c| Comment(c.to_string())),
                    ..IniLine::new(LineType::KeyValue, raw)
                }
            }
        };
        Ok(line)
    }

    fn new(line_type: LineType, raw: &str) -> IniLine {
        IniLine {
            line_type,
            key: None,
            value: None,
            inline_comment: None,
            section_header: None,
            raw: raw.to_string(),
        }
    }

    fn invalid(raw: &str) -> IniLine {
        IniLine::new(LineType::Invalid, raw)
    }

    /// Build a `key = value` line.
    pub fn key_value(key: &str, value: Value, comment: Option<Comment>) -> Result<IniLine> {
        validate_key(key)?;
        validate_value(&value)?;
        let mut line = IniLine {
            key: Some(key.to_string()),
            value: Some(value),
            inline_comment: comment,
            ..IniLine::new(LineType::KeyValue, "")
        };
        line.raw = line.canonical();
        Ok(line)
    }

    /// Build a `[name]` line.
    pub fn section_header(name: &str, comment: Option<Comment>) -> Result<IniLine> {
        validate_section_name(name)?;
        let mut line = IniLine {
            section_header: Some(name.to_string()),
            inline_comment: comment,
            ..IniLine::new(LineType::SectionHeader, "")
        };
        line.raw = line.canonical();
        Ok(line)
    }

    /// Build a whole-line comment.
    pub fn comment(comment: Comment) -> IniLine {
        IniLine {
            raw: comment.as_str().to_string(),
            inline_comment: Some(comment),
            ..IniLine::new(LineType::FullyCommented, "")
        }
    }

    /// Build an empty line.
    pub fn blank() -> IniLine {
        IniLine::new(LineType::Blank, "")
    }

    pub fn line_type(&self) -> LineType {
        self.line_type
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.value.as_ref().map(Value::value_type)
    }

    pub fn inline_comment(&self) -> Option<&Comment> {
        self.inline_comment.as_ref()
    }

    pub fn section_name(&self) -> Option<&str> {
        self.section_header.as_deref()
    }

    /// The text this line was parsed from, or last rebuilt to.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The line rebuilt from its fields.
    pub fn canonical(&self) -> String {
        let comment_suffix = match &self.inline_comment {
            Some(c) => format!(" {}", c),
            None => String::new(),
        };
        match self.line_type {
            LineType::KeyValue => match (&self.key, &self.value) {
                (Some(key), Some(value)) => {
                    format!("{} = {}{}", key, value.encode(), comment_suffix)
                }
                _ => self.raw.clone(),
            },
            LineType::SectionHeader => match &self.section_header {
                Some(name) => format!("[{}]{}", name, comment_suffix),
                None => self.raw.clone(),
            },
            LineType::FullyCommented => match &self.inline_comment {
                Some(c) => c.to_string(),
                None => self.raw.clone(),
            },
            LineType::Blank => String::new(),
            LineType::Invalid => self.raw.clone(),
        }
    }

    /// Replace the value, keeping its kind.
    pub fn set_value(&mut self, value: Value, comment: CommentUpdate) -> Result<()> {
        let current = self.require_key_value()?;
        if current != value.value_type() {
            return Err(IniError::TypeMismatch {
                key: self.key.clone().unwrap_or_default(),
                expected: current,
                found: value.value_type(),
            });
        }
        self.change_value_type(value, comment)
    }

    /// Replace the value, letting its kind change.
    pub fn change_value_type(&mut self, value: Value, comment: CommentUpdate) -> Result<()> {
        self.require_key_value()?;
        validate_value(&value)?;
        self.value = Some(value);
        match comment {
            CommentUpdate::Keep => {}
            CommentUpdate::Remove => self.inline_comment = None,
            CommentUpdate::Replace(c) => self.inline_comment = Some(c),
        }
        self.raw = self.canonical();
        Ok(())
    }

    fn require_key_value(&self) -> Result<ValueType> {
        match (self.line_type, self.value_type()) {
            (LineType::KeyValue, Some(value_type)) => Ok(value_type),
            _ => Err(IniError::InvalidOperation(format!(
                "cannot set a value on a {:?} line",
                self.line_type
            ))),
        }
    }
}

fn malformed(reason: &'static str) -> IniError {
    IniError::MalformedLine {
        reason,
        location: String::new(),
    }
}

/// Find the structure of one line.
fn classify(raw: &str) -> std::result::Result<Shape<'_>, &'static str> {
    if find_unescaped(raw, |c| c == '\n').is_some() {
        return Err("unescaped line feed inside line");
    }
    if has_dangling_escape(raw) {
        return Err("dangling backslash at end of line");
    }
    let line = raw.trim();
    if line.is_empty() {
        return Ok(Shape::Blank);
    }
    if line.starts_with(is_comment_marker) {
        return check_comment(line).map(Shape::Comment);
    }
    if let Some(rest) = line.strip_prefix('[') {
        return classify_header(rest);
    }
    classify_key_value(line)
}

fn classify_header(rest: &str) -> std::result::Result<Shape<'_>, &'static str> {
    let close = find_unescaped(rest, |c| c == ']').ok_or("unterminated section header")?;
    let name = rest[..close].trim();
    if name.is_empty() {
        return Err("empty section name");
    }
    if name.contains(['[', ']']) {
        return Err("bracket inside section name");
    }
    if name.contains('\\') {
        return Err("backslash inside section name");
    }
    if has_line_break(name) {
        return Err("line break inside section name");
    }
    let tail = rest[close + 1..].trim();
    let comment = if tail.is_empty() {
        None
    } else if tail.starts_with(is_comment_marker) {
        Some(check_comment(tail)?)
    } else {
        return Err("unexpected text after section header");
    };
    Ok(Shape::Header { name, comment })
}

fn classify_key_value(line: &str) -> std::result::Result<Shape<'_>, &'static str> {
    let eq = find_unescaped(line, |c| c == '=').ok_or("missing '=' separator")?;
    let key = line[..eq].trim();
    let right = &line[eq + 1..];
    if key.is_empty() {
        return Err("empty key");
    }
    if !is_valid_key(key) {
        return Err("invalid key");
    }
    let (text, comment) = match find_unescaped(right, is_comment_marker) {
        Some(pos) => (right[..pos].trim(), Some(right[pos..].trim())),
        None => (right.trim(), None),
    };
    if text.is_empty() {
        return Err("empty value");
    }
    let comment = comment.map(check_comment).transpose()?;
    Ok(Shape::KeyValue { key, text, comment })
}

fn check_comment(comment: &str) -> std::result::Result<&str, &'static str> {
    if has_line_break(comment) {
        Err("line break inside comment")
    } else if has_dangling_escape(comment) {
        Err("dangling backslash in comment")
    } else {
        Ok(comment)
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.chars().any(|c| c.is_whitespace() || c == '=')
        && !key.starts_with(|c: char| c == '[' || is_comment_marker(c))
}

/// Check a key for use in a new line.
pub fn validate_key(key: &str) -> Result<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(IniError::InvalidKey(key.to_string()))
    }
}

/// Check a section name for use in a new header.
pub fn validate_section_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.trim() == name
        && !name.contains(['[', ']', '\\'])
        && !has_line_break(name);
    if valid {
        Ok(())
    } else {
        Err(IniError::InvalidSectionName(name.to_string()))
    }
}

fn validate_value(value: &Value) -> Result<()> {
    if value.is_encodable() {
        Ok(())
    } else {
        Err(IniError::InvalidValue(format!("{:?} has no INI encoding", value)))
    }
}
