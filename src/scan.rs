//! Top-level delimiter scanning.
//!
//! Every composite decoder (record, sequence, map, tuple, multi-dimensional
//! array) splits its body with the same [`Scanner`]. The scanner walks a span
//! left to right, tracking
//!
//! - the bracket depth (`( [ {` open, `) ] }` close),
//! - whether it is inside a `"string"` or `'c'` literal,
//! - whether the previous character was a `\` inside such a literal.
//!
//! A delimiter is *top-level* when the depth is zero and the scanner is not
//! inside a literal. Finding successive top-level `,` and `:` is all a composite
//! decoder needs; there is no separate tokenizer.

use crate::grammar::{
    CHAR_QUOTE, COMPLEX_KEY, ESCAPE, LIST_CLOSE, LIST_OPEN, RECORD_CLOSE, RECORD_OPEN,
    STRING_QUOTE, TUPLE_CLOSE, TUPLE_OPEN,
};
use crate::{Error, Result};

/// A half-open byte range `start..end` into the scanned text.
pub type Span = (usize, usize);

/// Cursor over one span of canonical (whitespace-stripped) text.
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    end: usize,
    depth: usize,
    quote: Option<u8>,
    escaped: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner over `text[start..end]`.
    ///
    /// `text` is the whole document so errors can report absolute offsets.
    pub fn new(text: &'a str, start: usize, end: usize) -> Self {
        Scanner {
            text,
            pos: start,
            end,
            depth: 0,
            quote: None,
            escaped: false,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_in_string(&self) -> bool {
        self.quote.is_some()
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        if self.at_end() {
            None
        } else {
            Some(self.text.as_bytes()[self.pos])
        }
    }

    fn error(&self, at: usize, msg: &str) -> Error {
        Error::format(self.text, at, msg)
    }

    /// Consumes one byte and updates depth and literal state.
    fn step(&mut self) -> Result<()> {
        let b = self.text.as_bytes()[self.pos];
        match self.quote {
            Some(_) if self.escaped => self.escaped = false,
            Some(_) if b == ESCAPE => self.escaped = true,
            Some(q) if b == q => self.quote = None,
            Some(_) => {}
            None => match b {
                STRING_QUOTE | CHAR_QUOTE => self.quote = Some(b),
                RECORD_OPEN | LIST_OPEN | TUPLE_OPEN => self.depth += 1,
                RECORD_CLOSE | LIST_CLOSE | TUPLE_CLOSE => {
                    if self.depth == 0 {
                        return Err(self.error(self.pos, "unbalanced closing bracket"));
                    }
                    self.depth -= 1;
                }
                ESCAPE => return Err(self.error(self.pos, "escape outside of a string")),
                _ => {}
            },
        }
        self.pos += 1;
        Ok(())
    }

    fn check_closed(&self, start: usize) -> Result<()> {
        if self.quote.is_some() {
            return Err(self.error(start, "unterminated string or char literal"));
        }
        if self.depth != 0 {
            return Err(self.error(start, "unbalanced brackets"));
        }
        Ok(())
    }

    /// Advances to the next top-level byte contained in `stops`.
    ///
    /// Returns its offset and moves past it, or `None` when the span ends first.
    /// Reaching the end inside a literal or an open bracket is a format error.
    pub fn next_top_level(&mut self, stops: &[u8]) -> Result<Option<usize>> {
        let start = self.pos;
        while !self.at_end() {
            let b = self.text.as_bytes()[self.pos];
            if self.quote.is_none() && self.depth == 0 && stops.contains(&b) {
                self.pos += 1;
                return Ok(Some(self.pos - 1));
            }
            self.step()?;
        }
        self.check_closed(start)?;
        Ok(None)
    }

    /// Consumes one bracketed or quoted unit starting at the current position
    /// and returns the offset just past its closing character.
    pub fn skip_unit(&mut self) -> Result<usize> {
        let start = self.pos;
        match self.peek() {
            Some(RECORD_OPEN | LIST_OPEN | TUPLE_OPEN | STRING_QUOTE | CHAR_QUOTE) => {}
            _ => return Err(self.error(start, "expected a bracketed value")),
        }
        self.step()?;
        while (self.depth > 0 || self.quote.is_some()) && !self.at_end() {
            self.step()?;
        }
        self.check_closed(start)?;
        Ok(self.pos)
    }
}

/// Checks that `text[start..end]` is wrapped in `open`/`close` and returns the
/// span between them.
pub fn body(text: &str, (start, end): Span, open: u8, close: u8, what: &str) -> Result<Span> {
    let bytes = text.as_bytes();
    if end < start + 2 || bytes[start] != open || bytes[end - 1] != close {
        return Err(Error::format(text, start, &format!("expected {}", what)));
    }
    Ok((start + 1, end - 1))
}

/// Splits a composite body on top-level commas.
///
/// An empty body yields no pieces; an empty piece is a format error.
pub fn split_elements(text: &str, (start, end): Span) -> Result<Vec<Span>> {
    let mut pieces = Vec::new();
    if start >= end {
        return Ok(pieces);
    }

    let mut scanner = Scanner::new(text, start, end);
    let mut piece_start = start;
    loop {
        let stop = scanner.next_top_level(b",")?;
        let piece_end = stop.unwrap_or(end);
        if piece_end == piece_start {
            return Err(Error::format(text, piece_start, "missing element"));
        }
        pieces.push((piece_start, piece_end));
        match stop {
            Some(at) => piece_start = at + 1,
            None => break,
        }
    }
    Ok(pieces)
}

/// One `name:value` pair of a record or tuple body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: Span,
    pub value: Span,
}

/// Splits a record or tuple body into its fields.
///
/// A name that is not followed by a top-level `:` is a dangling field name.
pub fn split_fields(text: &str, (start, end): Span) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    if start >= end {
        return Ok(fields);
    }

    let mut scanner = Scanner::new(text, start, end);
    let mut field_start = start;
    while field_start < end {
        let name_end = match scanner.next_top_level(b":,")? {
            Some(at) if text.as_bytes()[at] == b':' => at,
            _ => return Err(Error::format(text, field_start, "field name without a value")),
        };
        if name_end == field_start {
            return Err(Error::format(text, field_start, "missing field name"));
        }
        let value_start = name_end + 1;
        let value_end = scanner.next_top_level(b",")?.unwrap_or(end);
        if value_end == value_start {
            return Err(Error::format(text, value_start, "missing field value"));
        }
        fields.push(Field {
            name: (field_start, name_end),
            value: (value_start, value_end),
        });
        field_start = value_end + 1;
        if value_end < end && field_start >= end {
            return Err(Error::format(text, value_end, "trailing comma"));
        }
    }
    Ok(fields)
}

/// One `key:value` entry of a map body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub key: Span,
    pub complex: bool,
    pub value: Span,
}

/// Splits a map body into its entries.
///
/// A key starting with `@` is consumed as one bracketed unit before the entry's
/// `:` is looked for.
pub fn split_entries(text: &str, (start, end): Span) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    if start >= end {
        return Ok(entries);
    }

    let bytes = text.as_bytes();
    let mut entry_start = start;
    while entry_start < end {
        let mut scanner = Scanner::new(text, entry_start, end);
        let complex = bytes[entry_start] == COMPLEX_KEY;
        let key = if complex {
            let mut unit = Scanner::new(text, entry_start + 1, end);
            let key_end = unit.skip_unit()?;
            if bytes.get(key_end) != Some(&b':') || key_end >= end {
                return Err(Error::format(text, key_end, "expected ':' after complex key"));
            }
            scanner = Scanner::new(text, key_end + 1, end);
            (entry_start + 1, key_end)
        } else {
            match scanner.next_top_level(b":,")? {
                Some(at) if bytes[at] == b':' && at > entry_start => (entry_start, at),
                _ => return Err(Error::format(text, entry_start, "map key without a value")),
            }
        };
        let value_start = scanner.position();
        let value_end = scanner.next_top_level(b",")?.unwrap_or(end);
        if value_end == value_start {
            return Err(Error::format(text, value_start, "missing map value"));
        }
        entries.push(Entry {
            key,
            complex,
            value: (value_start, value_end),
        });
        entry_start = value_end + 1;
        if value_end < end && entry_start >= end {
            return Err(Error::format(text, value_end, "trailing comma"));
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slices<'a>(text: &'a str, spans: &[Span]) -> Vec<&'a str> {
        spans.iter().map(|&(s, e)| &text[s..e]).collect()
    }

    #[test]
    fn test_next_top_level_skips_nested_and_strings() {
        let text = "a:[1,2],b:\"x,y\",c:'\\''";
        let mut scanner = Scanner::new(text, 0, text.len());
        assert_eq!(scanner.next_top_level(b":").unwrap(), Some(1));
        assert_eq!(scanner.next_top_level(b",").unwrap(), Some(7));
        assert_eq!(scanner.next_top_level(b",").unwrap(), Some(15));
        assert_eq!(scanner.next_top_level(b",").unwrap(), None);
        assert_eq!(scanner.depth(), 0);
        assert!(!scanner.is_in_string());
    }

    #[test]
    fn test_unterminated_string_is_format_error() {
        let text = "\"abc";
        let mut scanner = Scanner::new(text, 0, text.len());
        assert!(matches!(
            scanner.next_top_level(b","),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_unbalanced_brackets_are_format_errors() {
        let text = "[1,2";
        let mut scanner = Scanner::new(text, 0, text.len());
        assert!(scanner.next_top_level(b",").is_err());

        let text = "1]";
        let mut scanner = Scanner::new(text, 0, text.len());
        assert!(scanner.next_top_level(b",").is_err());
    }

    #[test]
    fn test_split_elements() {
        let text = "1,[2,3],\"a,b\",(Item1:4)";
        let pieces = split_elements(text, (0, text.len())).unwrap();
        assert_eq!(slices(text, &pieces), vec!["1", "[2,3]", "\"a,b\"", "(Item1:4)"]);

        assert!(split_elements("", (0, 0)).unwrap().is_empty());
        assert!(split_elements("1,,2", (0, 4)).is_err());
        assert!(split_elements("1,", (0, 2)).is_err());
    }

    #[test]
    fn test_split_fields() {
        let text = "a:1,b:{c:2,d:3},e:\"x:y\"";
        let fields = split_fields(text, (0, text.len())).unwrap();
        let names: Vec<_> = fields.iter().map(|f| &text[f.name.0..f.name.1]).collect();
        let values: Vec<_> = fields.iter().map(|f| &text[f.value.0..f.value.1]).collect();
        assert_eq!(names, vec!["a", "b", "e"]);
        assert_eq!(values, vec!["1", "{c:2,d:3}", "\"x:y\""]);
    }

    #[test]
    fn test_dangling_field_name() {
        let text = "a:1,b";
        let err = split_fields(text, (0, text.len())).unwrap_err();
        match err {
            Error::Format { offset, msg, .. } => {
                assert_eq!(offset, 4);
                assert!(msg.contains("without a value"));
            }
            other => panic!("Expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_split_entries_with_complex_keys() {
        let text = "1:2,@{a:1}:\"x\",@[1,2]:3";
        let entries = split_entries(text, (0, text.len())).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(!entries[0].complex);
        assert!(entries[1].complex);
        assert_eq!(&text[entries[1].key.0..entries[1].key.1], "{a:1}");
        assert_eq!(&text[entries[1].value.0..entries[1].value.1], "\"x\"");
        assert_eq!(&text[entries[2].key.0..entries[2].key.1], "[1,2]");
        assert_eq!(&text[entries[2].value.0..entries[2].value.1], "3");
    }

    #[test]
    fn test_body_requires_brackets() {
        assert_eq!(body("{a:1}", (0, 5), b'{', b'}', "record").unwrap(), (1, 4));
        assert!(body("[a:1}", (0, 5), b'{', b'}', "record").is_err());
        assert!(body("{", (0, 1), b'{', b'}', "record").is_err());
    }
}
