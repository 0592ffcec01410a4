//! Escaping and quoting rules for INI text.
//!
//! A backslash escapes the character after it. Escaped characters never act
//! as structure: `\=` does not separate a key from its value, `\;` and `\#`
//! do not start a comment, `\"` does not close a quoted string, and a
//! backslash before a line feed keeps the line feed inside the line.

/// Characters that start a comment.
pub const COMMENT_MARKERS: [char; 2] = [';', '#'];

/// Returns `true` for `;` and `#`.
pub fn is_comment_marker(c: char) -> bool {
    COMMENT_MARKERS.contains(&c)
}

/// Returns `true` if the text contains a raw line feed or carriage return.
pub fn has_line_break(s: &str) -> bool {
    s.contains(['\n', '\r'])
}

/// Returns `true` if the text ends in a backslash with nothing left to escape.
/// Written out, such text would escape whatever follows it.
pub fn has_dangling_escape(s: &str) -> bool {
    s.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Byte offset of the first character matching `pred` that is not escaped.
pub fn find_unescaped(s: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if c == '\\' {
            escape = true;
            continue;
        }
        if pred(c) {
            return Some(i);
        }
    }
    None
}

/// Escape a string for use as an INI value.
pub fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            ';' => result.push_str("\\;"),
            '#' => result.push_str("\\#"),
            c => result.push(c),
        }
    }
    result
}

/// Resolve escape sequences. Unknown escapes are kept as written, so
/// `C:\Users` reads back unchanged.
pub fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some(c @ ('"' | '\\' | ';' | '#' | '\n')) => result.push(c),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Returns `true` if the text is wrapped in one pair of unescaped double quotes.
pub fn is_quoted(s: &str) -> bool {
    if s.len() < 2 || !s.starts_with('"') {
        return false;
    }
    match find_unescaped(&s[1..], |c| c == '"') {
        Some(close) => close + 1 == s.len() - 1,
        None => false,
    }
}

/// Decode the text of a string value: strip one layer of quotes, then unescape.
pub fn decode_string(s: &str) -> String {
    if is_quoted(s) {
        unescape(&s[1..s.len() - 1])
    } else {
        unescape(s)
    }
}

/// Encode a string value. The result is quoted when it contains a space, is
/// empty, has padding that trimming would eat, or would otherwise read back as
/// a bool, int, or float.
pub fn encode_string(s: &str) -> String {
    let escaped = escape(s);
    let needs_quotes = s.is_empty()
        || s.contains(' ')
        || s.trim() != s
        || crate::value::ValueType::infer(&escaped) != crate::value::ValueType::String;
    if needs_quotes {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}
