//! Scanner
//!
//! Splits source text into physical lines. A line feed preceded by an escaping
//! backslash stays inside its line, so one scanned line may span several lines
//! of the file. Joining the scanned lines with `\n` reproduces the source.

/// A single line after scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLine<'a> {
    /// Line content without the terminating line feed.
    pub text: &'a str,
    /// Zero-based line number of the line's first character in the source.
    pub line_num: usize,
}

/// Split source text on unescaped line feeds.
///
/// Empty input has no lines. Input ending in a line feed ends with an empty
/// line, which keeps the trailing line feed through a round trip.
pub fn scan(source: &str) -> Vec<ScanLine<'_>> {
    let mut lines = Vec::new();
    if source.is_empty() {
        return lines;
    }

    let mut start = 0;
    let mut start_line = 0;
    let mut line_num = 0;
    let mut escape = false;

    for (i, c) in source.char_indices() {
        if c == '\n' {
            line_num += 1;
        }
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            '\n' => {
                lines.push(ScanLine {
                    text: &source[start..i],
                    line_num: start_line,
                });
                start = i + 1;
                start_line = line_num;
            }
            _ => {}
        }
    }

    lines.push(ScanLine {
        text: &source[start..],
        line_num: start_line,
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(lines: &[ScanLine<'a>]) -> Vec<&'a str> {
        lines.iter().map(|l| l.text).collect()
    }

    #[test]
    fn test_scan_simple() {
        let lines = scan("a = 1\n[b]\nc = 2");
        assert_eq!(texts(&lines), vec!["a = 1", "[b]", "c = 2"]);
        assert_eq!(lines[2].line_num, 2);
    }

    #[test]
    fn test_scan_empty() {
        assert!(scan("").is_empty());
        assert_eq!(texts(&scan("\n")), vec!["", ""]);
    }

    #[test]
    fn test_scan_trailing_newline() {
        assert_eq!(texts(&scan("a = 1\n")), vec!["a = 1", ""]);
    }

    #[test]
    fn test_scan_escaped_line_feed() {
        let lines = scan("text = one\\\ntwo\nnext = 3");
        assert_eq!(texts(&lines), vec!["text = one\\\ntwo", "next = 3"]);
        assert_eq!(lines[1].line_num, 2);
    }

    #[test]
    fn test_scan_escaped_backslash_before_line_feed() {
        let lines = scan("path = C:\\\\\nnext = 1");
        assert_eq!(texts(&lines), vec!["path = C:\\\\", "next = 1"]);
    }

    #[test]
    fn test_scan_crlf() {
        let lines = scan("a = 1\r\nb = 2\r\n");
        assert_eq!(texts(&lines), vec!["a = 1\r", "b = 2\r", ""]);
    }
}
