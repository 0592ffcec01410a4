//! Document model.
//!
//! A [`Document`] is the global scope plus named [`Section`]s. Sections own a
//! body but never sections of their own, so nesting cannot be expressed.
//! Keys are unique within each [`Scope`].

use crate::error::{IniError, ParseContext, Result};
use crate::line::{validate_section_name, Comment, CommentUpdate, IniLine, LineType};
use crate::scanner::{self, ScanLine};
use crate::value::{FromValue, Value};
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::fmt;

/// Where a new line goes within its scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Position {
    /// After the last line.
    #[default]
    End,
    /// Before the line currently at this index.
    At(usize),
}

/// Options for adding a value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddOptions {
    pub position: Position,
    pub comment: Option<Comment>,
}

impl AddOptions {
    /// Insert at `index` instead of appending.
    pub fn at(index: usize) -> Self {
        Self {
            position: Position::At(index),
            comment: None,
        }
    }

    /// Attach an inline comment to the new line.
    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// Ordered lines of one scope: the global scope or a section body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    lines: Vec<IniLine>,
}

impl Scope {
    pub fn lines(&self) -> &[IniLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Keys in line order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(IniLine::key)
    }

    /// Key/value pairs in line order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.lines
            .iter()
            .filter_map(|line| Some((line.key()?, line.value()?)))
    }

    fn position_of(&self, key: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.key() == Some(key))
    }

    /// The line holding `key`.
    pub fn find(&self, key: &str) -> Option<&IniLine> {
        self.position_of(key).map(|i| &self.lines[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position_of(key).is_some()
    }

    /// The value stored under `key`, whatever its kind.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.find(key).and_then(IniLine::value)
    }

    /// Look up `key` as a `T`.
    ///
    /// Absent keys are `Ok(None)`. A key holding another kind of value is a
    /// `TypeMismatch`, so callers can tell a corrupt value from a missing one.
    pub fn search<T: FromValue>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match T::from_value(value) {
            Some(v) => Ok(Some(v)),
            None => Err(IniError::TypeMismatch {
                key: key.to_string(),
                expected: T::VALUE_TYPE,
                found: value.value_type(),
            }),
        }
    }

    /// Rewrite the value of an existing key of the same kind.
    /// Returns `Ok(false)` if the key is absent.
    pub fn set_value(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        comment: CommentUpdate,
    ) -> Result<bool> {
        match self.position_of(key) {
            Some(i) => self.lines[i].set_value(value.into(), comment).map(|_| true),
            None => Ok(false),
        }
    }

    /// Rewrite the value of an existing key, allowing its kind to change.
    /// Returns `Ok(false)` if the key is absent.
    pub fn set_value_ignoring_type(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        comment: CommentUpdate,
    ) -> Result<bool> {
        match self.position_of(key) {
            Some(i) => self.lines[i]
                .change_value_type(value.into(), comment)
                .map(|_| true),
            None => Ok(false),
        }
    }

    /// Add a new `key = value` line. Returns `Ok(false)` if the key exists.
    pub fn add_value(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        options: AddOptions,
    ) -> Result<bool> {
        if self.contains_key(key) {
            return Ok(false);
        }
        let line = IniLine::key_value(key, value.into(), options.comment)?;
        self.insert(line, options.position)?;
        Ok(true)
    }

    /// Remove the first line holding `key`.
    pub fn remove_value(&mut self, key: &str) -> bool {
        match self.position_of(key) {
            Some(i) => {
                self.lines.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> bool {
        if index < self.lines.len() {
            self.lines.remove(index);
            true
        } else {
            false
        }
    }

    /// Insert a whole-line comment.
    pub fn add_comment(&mut self, comment: Comment, position: Position) -> Result<()> {
        self.insert(IniLine::comment(comment), position)
    }

    /// Insert an empty line.
    pub fn add_blank_line(&mut self, position: Position) -> Result<()> {
        self.insert(IniLine::blank(), position)
    }

    fn insert(&mut self, line: IniLine, position: Position) -> Result<()> {
        match position {
            Position::End => self.lines.push(line),
            Position::At(i) if i <= self.lines.len() => self.lines.insert(i, line),
            Position::At(i) => {
                return Err(IniError::InvalidOperation(format!(
                    "index {} is beyond a scope of {} lines",
                    i,
                    self.lines.len()
                )))
            }
        }
        Ok(())
    }
}

/// A named section: its header line and its body.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    header: IniLine,
    body: Scope,
}

impl Section {
    pub fn name(&self) -> &str {
        self.header.section_name().unwrap_or_default()
    }

    pub fn header(&self) -> &IniLine {
        &self.header
    }

    pub fn body(&self) -> &Scope {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Scope {
        &mut self.body
    }
}

/// A whole INI document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    root: Scope,
    sections: Vec<Section>,
}

/// Tracks keys of the scope being assembled.
struct ScopeBuilder {
    label: String,
    lines: Vec<IniLine>,
    keys: HashSet<String>,
}

impl ScopeBuilder {
    fn new(label: String) -> Self {
        Self {
            label,
            lines: Vec::new(),
            keys: HashSet::new(),
        }
    }

    fn push(&mut self, line: IniLine, ctx: &ParseContext, line_num: usize) -> Result<()> {
        if let Some(key) = line.key() {
            if !self.keys.insert(key.to_string()) {
                return Err(IniError::DuplicateKey {
                    key: key.to_string(),
                    scope: self.label.clone(),
                    location: String::new(),
                }
                .with_location(ctx, line_num));
            }
        }
        self.lines.push(line);
        Ok(())
    }

    fn finish(self) -> Scope {
        Scope { lines: self.lines }
    }
}

fn section_label(name: &str) -> String {
    format!("section [{}]", name)
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from text.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_context(text, &ParseContext::default())
    }

    pub(crate) fn parse_with_context(text: &str, ctx: &ParseContext) -> Result<Self> {
        Self::from_scan_lines(&scanner::scan(text), ctx)
    }

    /// Build a document from already split lines.
    pub fn from_lines(lines: &[&str]) -> Result<Self> {
        let scanned: Vec<ScanLine<'_>> = lines
            .iter()
            .enumerate()
            .map(|(line_num, &text)| ScanLine { text, line_num })
            .collect();
        Self::from_scan_lines(&scanned, &ParseContext::default())
    }

    fn from_scan_lines(lines: &[ScanLine<'_>], ctx: &ParseContext) -> Result<Self> {
        let mut root = ScopeBuilder::new("global scope".to_string());
        let mut sections: Vec<Section> = Vec::new();
        let mut open: Option<(IniLine, ScopeBuilder)> = None;
        let mut names: HashSet<String> = HashSet::new();

        for sl in lines {
            let line = IniLine::parse_at(sl.text, ctx, sl.line_num)?;
            trace!("line {}: {:?}", sl.line_num + 1, line.line_type());

            if line.line_type() == LineType::SectionHeader {
                let name = line.section_name().unwrap_or_default().to_string();
                if !names.insert(name.clone()) {
                    return Err(IniError::DuplicateSection {
                        name,
                        location: String::new(),
                    }
                    .with_location(ctx, sl.line_num));
                }
                if let Some((header, body)) = open.take() {
                    sections.push(Section {
                        header,
                        body: body.finish(),
                    });
                }
                open = Some((line, ScopeBuilder::new(section_label(&name))));
                continue;
            }

            match open.as_mut() {
                Some((_, body)) => body.push(line, ctx, sl.line_num)?,
                None => root.push(line, ctx, sl.line_num)?,
            }
        }

        if let Some((header, body)) = open {
            sections.push(Section {
                header,
                body: body.finish(),
            });
        }

        let doc = Document {
            root: root.finish(),
            sections,
        };
        debug!(
            "parsed {} lines into {} global lines and {} sections",
            lines.len(),
            doc.root.len(),
            doc.sections.len()
        );
        Ok(doc)
    }

    /// Drop every line and section.
    pub fn clear(&mut self) {
        self.root = Scope::default();
        self.sections.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.sections.is_empty()
    }

    /// The global scope.
    pub fn root(&self) -> &Scope {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Scope {
        &mut self.root
    }

    /// Sections in document order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name() == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name() == name)
    }

    pub fn section_exists(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Create a section from a name, body lines, and an optional header
    /// comment. Returns `Ok(false)` if the name is taken.
    ///
    /// Body lines follow the parse rules: any malformed line, any section
    /// header, and any repeated key rejects the whole section.
    pub fn create_section(
        &mut self,
        name: &str,
        body: &[&str],
        comment: Option<Comment>,
    ) -> Result<bool> {
        validate_section_name(name)?;
        if self.section_exists(name) {
            return Ok(false);
        }
        let header = IniLine::section_header(name, comment)?;
        let ctx = ParseContext::default();
        let mut builder = ScopeBuilder::new(section_label(name));
        for (line_num, text) in body.iter().enumerate() {
            let line = IniLine::parse_at(text, &ctx, line_num)?;
            if line.line_type() == LineType::SectionHeader {
                return Err(IniError::HeaderInBody(String::new()).with_location(&ctx, line_num));
            }
            builder.push(line, &ctx, line_num)?;
        }
        self.sections.push(Section {
            header,
            body: builder.finish(),
        });
        Ok(true)
    }

    /// Remove a section and its body.
    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name() != name);
        self.sections.len() != before
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn get_in(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section).and_then(|s| s.body.get(key))
    }

    /// See [`Scope::search`].
    pub fn search<T: FromValue>(&self, key: &str) -> Result<Option<T>> {
        self.root.search(key)
    }

    /// Like [`Document::search`], within a section. A missing section is `Ok(None)`.
    pub fn search_in<T: FromValue>(&self, section: &str, key: &str) -> Result<Option<T>> {
        match self.section(section) {
            Some(s) => s.body.search(key),
            None => Ok(None),
        }
    }

    pub fn set_value(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        comment: CommentUpdate,
    ) -> Result<bool> {
        self.root.set_value(key, value, comment)
    }

    pub fn set_value_in(
        &mut self,
        section: &str,
        key: &str,
        value: impl Into<Value>,
        comment: CommentUpdate,
    ) -> Result<bool> {
        match self.section_mut(section) {
            Some(s) => s.body.set_value(key, value, comment),
            None => Ok(false),
        }
    }

    pub fn set_value_ignoring_type(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        comment: CommentUpdate,
    ) -> Result<bool> {
        self.root.set_value_ignoring_type(key, value, comment)
    }

    pub fn set_value_ignoring_type_in(
        &mut self,
        section: &str,
        key: &str,
        value: impl Into<Value>,
        comment: CommentUpdate,
    ) -> Result<bool> {
        match self.section_mut(section) {
            Some(s) => s.body.set_value_ignoring_type(key, value, comment),
            None => Ok(false),
        }
    }

    pub fn add_value(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        options: AddOptions,
    ) -> Result<bool> {
        self.root.add_value(key, value, options)
    }

    /// Add a value to a section. Returns `Ok(false)` if the section is missing
    /// or already holds the key.
    pub fn add_value_in(
        &mut self,
        section: &str,
        key: &str,
        value: impl Into<Value>,
        options: AddOptions,
    ) -> Result<bool> {
        match self.section_mut(section) {
            Some(s) => s.body.add_value(key, value, options),
            None => Ok(false),
        }
    }

    pub fn remove_value(&mut self, key: &str) -> bool {
        self.root.remove_value(key)
    }

    pub fn remove_value_in(&mut self, section: &str, key: &str) -> bool {
        self.section_mut(section)
            .is_some_and(|s| s.body.remove_value(key))
    }

    pub fn remove_line(&mut self, index: usize) -> bool {
        self.root.remove_line(index)
    }

    pub fn remove_line_in(&mut self, section: &str, index: usize) -> bool {
        self.section_mut(section)
            .is_some_and(|s| s.body.remove_line(index))
    }

    pub fn add_comment(&mut self, comment: Comment, position: Position) -> Result<()> {
        self.root.add_comment(comment, position)
    }

    /// Add a comment to a section. Returns `Ok(false)` if the section is missing.
    pub fn add_comment_in(
        &mut self,
        section: &str,
        comment: Comment,
        position: Position,
    ) -> Result<bool> {
        match self.section_mut(section) {
            Some(s) => s.body.add_comment(comment, position).map(|_| true),
            None => Ok(false),
        }
    }

    /// Read a setting, repairing it in place when it is missing or corrupt.
    ///
    /// A missing key (or section) is added with `default`; a key holding
    /// another kind of value is overwritten with `default`. Either way the
    /// default is returned.
    pub fn get_or_repair<T>(&mut self, section: Option<&str>, key: &str, default: T) -> Result<T>
    where
        T: FromValue + Into<Value> + Clone,
    {
        let scope = match section {
            Some(name) => {
                if !self.section_exists(name) {
                    self.create_section(name, &[], None)?;
                }
                match self.section_mut(name) {
                    Some(s) => &mut s.body,
                    None => {
                        return Err(IniError::InvalidOperation(format!(
                            "section [{}] could not be created",
                            name
                        )))
                    }
                }
            }
            None => &mut self.root,
        };

        match scope.search::<T>(key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                warn!("setting {} is missing, adding default", key);
                scope.add_value(key, default.clone(), AddOptions::default())?;
                Ok(default)
            }
            Err(IniError::TypeMismatch { expected, found, .. }) => {
                warn!(
                    "setting {} holds a {} instead of a {}, resetting to default",
                    key, found, expected
                );
                scope.set_value_ignoring_type(key, default.clone(), CommentUpdate::Keep)?;
                Ok(default)
            }
            Err(e) => Err(e),
        }
    }

    fn render(&self, render_line: impl Fn(&IniLine) -> String) -> String {
        let mut out: Vec<String> = self.root.lines.iter().map(&render_line).collect();
        for section in &self.sections {
            out.push(render_line(&section.header));
            out.extend(section.body.lines.iter().map(&render_line));
        }
        out.join("\n")
    }

    /// Serialize using each line's raw text. Untouched lines come back byte for byte.
    pub fn to_raw_string(&self) -> String {
        self.render(|line| line.raw().to_string())
    }

    /// Serialize using each line's canonical form.
    pub fn to_canonical_string(&self) -> String {
        self.render(IniLine::canonical)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    const PRESETS: &str = "selectedPreset = standard\n[high]\npixelFormat = Format48bppRgb\nimageQuality = 100";

    #[test]
    fn test_sections_split_at_headers() {
        let doc = Document::parse(PRESETS).unwrap();
        assert_eq!(doc.root().len(), 1);
        assert_eq!(doc.sections().len(), 1);
        let high = doc.section("high").unwrap();
        assert_eq!(high.header().raw(), "[high]");
        assert_eq!(
            high.body().keys().collect::<Vec<_>>(),
            vec!["pixelFormat", "imageQuality"]
        );
    }

    #[test]
    fn test_last_section_runs_to_end() {
        let doc = Document::parse("[a]\nx = 1\n[b]\ny = 2\n; tail\n").unwrap();
        let b = doc.section("b").unwrap();
        assert_eq!(b.body().len(), 3);
        assert_eq!(b.body().lines()[2].line_type(), LineType::Blank);
        assert!(doc.root().is_empty());
    }

    #[test]
    fn test_first_header_not_in_global_scope() {
        let doc = Document::parse("; top\n[only]\nk = v").unwrap();
        assert_eq!(doc.root().len(), 1);
        assert_eq!(doc.root().lines()[0].line_type(), LineType::FullyCommented);
        assert_eq!(doc.section("only").unwrap().body().len(), 1);
    }

    #[test]
    fn test_same_key_in_different_scopes() {
        let doc = Document::parse("k = 1\n[a]\nk = 2\n[b]\nk = 3").unwrap();
        assert_eq!(doc.search::<i64>("k").unwrap(), Some(1));
        assert_eq!(doc.search_in::<i64>("a", "k").unwrap(), Some(2));
        assert_eq!(doc.search_in::<i64>("b", "k").unwrap(), Some(3));
    }

    #[test]
    fn test_duplicate_key_location() {
        let err = Document::parse("[a]\nk = 1\n\nk = 2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate key \"k\" in section [a] at line 4"
        );
    }

    #[test]
    fn test_duplicate_section() {
        let err = Document::parse("[a]\n[a]").unwrap_err();
        assert!(err.is_malformed_document());
        assert_eq!(err.to_string(), "Duplicate section [a] at line 2");
    }

    #[test]
    fn test_insert_position() {
        let mut doc = Document::parse("a = 1\nc = 3").unwrap();
        assert!(doc.add_value("b", 2, AddOptions::at(1)).unwrap());
        assert_eq!(doc.to_raw_string(), "a = 1\nb = 2\nc = 3");
        let err = doc.add_value("z", 26, AddOptions::at(9)).unwrap_err();
        assert!(matches!(err, IniError::InvalidOperation(_)));
        assert!(!doc.root().contains_key("z"));
    }

    #[test]
    fn test_remove_line() {
        let mut doc = Document::parse("; c\na = 1").unwrap();
        assert!(doc.remove_line(0));
        assert!(!doc.remove_line(5));
        assert_eq!(doc.to_raw_string(), "a = 1");
    }

    #[test]
    fn test_get_or_repair() {
        let mut doc = Document::parse("[high]\nimageQuality = oops").unwrap();
        let quality = doc.get_or_repair(Some("high"), "imageQuality", 90i64).unwrap();
        assert_eq!(quality, 90);
        assert_eq!(doc.search_in::<i64>("high", "imageQuality").unwrap(), Some(90));

        let delay = doc.get_or_repair(Some("timer"), "delay", 2.5).unwrap();
        assert_eq!(delay, 2.5);
        assert!(doc.section_exists("timer"));

        let kept = doc.get_or_repair(Some("high"), "imageQuality", 10i64).unwrap();
        assert_eq!(kept, 90);
        assert_eq!(
            doc.section("high")
                .and_then(|s| s.body().find("imageQuality"))
                .and_then(IniLine::value_type),
            Some(ValueType::Int)
        );
    }

    #[test]
    fn test_canonical_rendering() {
        let doc = Document::parse("a=1;x\n[ s ]   # c\nname   =   \"v\"").unwrap();
        assert_eq!(doc.to_canonical_string(), "a = 1 ;x\n[s] # c\nname = v");
        assert_eq!(doc.to_string(), doc.to_canonical_string());
    }
}
