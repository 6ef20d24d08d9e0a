//! TSON Format Grammar
//!
//! This module documents the TSON (Typed Serialized Object Notation) text format
//! and holds the pieces of it shared by the encoder and the decoder: literal
//! spellings, the escape table, whitespace stripping and the date/time layout.
//!
//! # Overview
//!
//! TSON is a human-readable format for typed values. Every composite kind has its
//! own bracket pair, so a decoder that knows the target type can split any
//! composite body with a single forward scan for top-level `,` and `:`.
//!
//! # Productions
//!
//! Whitespace outside string and char literals is insignificant; the grammar is
//! stated for text with that whitespace removed.
//!
//! ```text
//! value      := scalar | string | char | datetime | record | sequence | map
//!             | tuple | multiarray | null
//! record     := '{' (field (',' field)*)? '}'          field := name ':' value
//! name       := identifier | string
//! sequence   := '[' (value (',' value)*)? ']'
//! map        := '[' (key ':' value (',' key ':' value)*)? ']'
//! key        := value | '@' value                      '@' marks a composite key
//! tuple      := '(' (item (',' item)*)? ')'            item := ItemN ':' value
//!                                                            | 'Rest' ':' tuple
//! multiarray := '[' '<' int (',' int)* '>' value (',' value)* ']'
//! string     := '"' escaped-char* '"'
//! char       := '\'' escaped-char '\''
//! null       := '()'
//! ```
//!
//! Member and variant names that are not identifiers (`first name`, `a:b`) are
//! written as string literals: `{"first name":"Ann"}`.
//!
//! An empty tuple has the same spelling as null. It is written `()` and reads
//! back as null wherever the target does not ask for a tuple.
//!
//! ## Scalars
//!
//! | Type | Syntax | Example |
//! |------|--------|---------|
//! | Boolean | `True` or `False` | `active:True` |
//! | Integer | Decimal digits, optional `-` | `count:42` |
//! | Float | Shortest round-trip decimal | `price:19.99` |
//! | Enum | Variant name (ordinal accepted on input) | `status:Active` |
//! | DateTime | Quoted `dd.MM.yyyy HH:mm:ss.fffffffff`, UTC | `"15.01.2024 10:30:00.000000000"` |
//! | Null | `()` | `parent:()` |
//!
//! Booleans are capitalized; the format is not JSON compatible.
//!
//! ## Escape Table
//!
//! Applied inside string and char bodies:
//!
//! ```text
//! "          \"
//! \          \\
//! newline    \n
//! CR         \r
//! tab        \t
//! backspace  \b
//! form feed  \f
//! '          \'   (char bodies only)
//! ```
//!
//! Everything else is written literally. On input, `\` escapes exactly the next
//! character; unknown escapes decode to that character.
//!
//! ## Tuples
//!
//! Tuple items are named `Item1` to `Item7`. Longer tuples nest the remaining
//! items in a `Rest` tuple, seven at a time:
//!
//! ```text
//! (Item1:1,Item2:"x")
//! (Item1:1,...,Item7:7,Rest:(Item1:8,Item2:9))
//! ```
//!
//! ## Multi-dimensional Arrays
//!
//! The dimension sizes come first, then the elements in row-major order. The
//! element count must equal the product of the dimensions:
//!
//! ```text
//! [<2,2>1,2,3,4]
//! ```
//!
//! ## Pretty Layout
//!
//! With indentation enabled, every non-empty composite puts its children on
//! their own lines, one tab deeper than the composite, with one space after each
//! `:`. Empty composites stay on one line.
//!
//! ```text
//! {
//! 	name: "Alice",
//! 	tags: [
//! 		"admin"
//! 	]
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::borrow::Cow;

pub const TRUE_LITERAL: &str = "True";
pub const FALSE_LITERAL: &str = "False";
pub const NULL_LITERAL: &str = "()";

pub const RECORD_OPEN: u8 = b'{';
pub const RECORD_CLOSE: u8 = b'}';
pub const LIST_OPEN: u8 = b'[';
pub const LIST_CLOSE: u8 = b']';
pub const TUPLE_OPEN: u8 = b'(';
pub const TUPLE_CLOSE: u8 = b')';
pub const DIMS_OPEN: u8 = b'<';
pub const DIMS_CLOSE: u8 = b'>';
pub const COMPLEX_KEY: u8 = b'@';
pub const STRING_QUOTE: u8 = b'"';
pub const CHAR_QUOTE: u8 = b'\'';
pub const ESCAPE: u8 = b'\\';

pub const TUPLE_ITEM: &str = "Item";
pub const TUPLE_REST: &str = "Rest";
/// Items held directly by one tuple level before the `Rest` tuple takes over.
pub const TUPLE_ARITY: usize = 7;

// Names of the serde tokens that carry TSON-only kinds through the serde data
// model. Other serde formats see plain newtypes and structs.
pub(crate) const DATETIME_TOKEN: &str = "$serde_tson::DateTime";
pub(crate) const ENUM_TOKEN: &str = "$serde_tson::Enum";
pub(crate) const RECORD_TOKEN: &str = "$serde_tson::Record";
pub(crate) const MULTIARRAY_TOKEN: &str = "$serde_tson::MultiArray";
pub(crate) const MULTIARRAY_FIELDS: &[&str] = &["dims", "data"];
pub(crate) const IGNORED_TOKEN: &str = "$serde_tson::Ignored";
pub(crate) const CONFIG_TOKEN: &str = "$serde_tson::TypeConfig";

/// Output layout of date/time values.
pub const DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S%.9f";
const DATETIME_INPUT_FORMAT: &str = "%d.%m.%Y %H:%M:%S%.f";

/// Appends `s` as a quoted string literal.
pub fn write_string(output: &mut String, s: &str) {
    output.push('"');
    escape_into(output, s, false);
    output.push('"');
}

/// Appends a member or variant name, quoted unless it is an identifier.
pub fn write_name(output: &mut String, name: &str) {
    if is_identifier(name) {
        output.push_str(name);
    } else {
        write_string(output, name);
    }
}

/// Appends `c` as a quoted char literal.
pub fn write_char(output: &mut String, c: char) {
    output.push('\'');
    let mut buf = [0u8; 4];
    escape_into(output, c.encode_utf8(&mut buf), true);
    output.push('\'');
}

fn escape_into(output: &mut String, s: &str, char_body: bool) {
    for ch in s.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            '\u{0008}' => output.push_str("\\b"),
            '\u{000C}' => output.push_str("\\f"),
            '\'' if char_body => output.push_str("\\'"),
            _ => output.push(ch),
        }
    }
}

/// Decodes the body of a string or char literal (without its quotes).
///
/// Borrows the body when it contains no escapes.
pub fn unescape(body: &str) -> Cow<'_, str> {
    if !body.contains('\\') {
        return Cow::Borrowed(body);
    }

    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('b') => result.push('\u{0008}'),
            Some('f') => result.push('\u{000C}'),
            Some(other) => result.push(other),
            // a trailing backslash is rejected by the scanner before we get here
            None => result.push('\\'),
        }
    }
    Cow::Owned(result)
}

/// Removes all whitespace outside string and char literals.
///
/// The result decodes exactly like the input, and stripping it again changes
/// nothing. Text without removable whitespace is returned borrowed.
///
/// # Examples
///
/// ```rust
/// use serde_tson::strip_whitespace;
///
/// let text = "{\n\tname: \"Ann Lee\",\n\tage: 40\n}";
/// assert_eq!(strip_whitespace(text), "{name:\"Ann Lee\",age:40}");
/// ```
pub fn strip_whitespace(text: &str) -> Cow<'_, str> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut first_space = None;

    for (i, ch) in text.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if ch == '\\' => escaped = true,
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch.is_whitespace() => {
                first_space = Some(i);
                break;
            }
            None => {}
        }
    }

    let Some(start) = first_space else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    for ch in text[start..].chars() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if ch == '\\' => escaped = true,
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch.is_whitespace() => continue,
            None => {}
        }
        out.push(ch);
    }
    Cow::Owned(out)
}

/// Formats a date/time in the TSON layout, normalized to UTC.
pub fn format_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.with_timezone(&Utc).format(DATETIME_FORMAT).to_string()
}

/// Parses the TSON date/time layout. RFC 3339 text is accepted as well.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DATETIME_INPUT_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Returns `true` if `s` can be written as a bare member or variant name.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_table() {
        let mut out = String::new();
        write_string(&mut out, "a\"b\\c\nd\re\tf\u{8}g\u{c}h'i");
        assert_eq!(out, "\"a\\\"b\\\\c\\nd\\re\\tf\\bg\\fh'i\"");
    }

    #[test]
    fn test_names_are_quoted_unless_identifiers() {
        let mut out = String::new();
        write_name(&mut out, "first_name");
        out.push(',');
        write_name(&mut out, "first name");
        out.push(',');
        write_name(&mut out, "a:b");
        out.push(',');
        write_name(&mut out, "1st");
        assert_eq!(out, "first_name,\"first name\",\"a:b\",\"1st\"");
    }

    #[test]
    fn test_char_quote_is_escaped_in_char_bodies() {
        let mut out = String::new();
        write_char(&mut out, '\'');
        assert_eq!(out, "'\\''");

        out.clear();
        write_char(&mut out, '"');
        assert_eq!(out, "'\\\"'");
    }

    #[test]
    fn test_unescape_inverts_escape() {
        let original = "tab\there \"quoted\" back\\slash\nline\u{8}\u{c}\r";
        let mut out = String::new();
        write_string(&mut out, original);
        let body = &out[1..out.len() - 1];
        assert_eq!(unescape(body), original);
    }

    #[test]
    fn test_unescape_borrows_plain_text() {
        assert!(matches!(unescape("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_strip_whitespace_keeps_literals() {
        let text = "[ \"a b\" , ' ' ,\t\"c\\\" d\" ]";
        assert_eq!(strip_whitespace(text), "[\"a b\",' ',\"c\\\" d\"]");
    }

    #[test]
    fn test_strip_whitespace_is_idempotent() {
        let text = "{\n\ta: \"x y\",\n\tb: [\n\t\t1,\n\t\t2\n\t]\n}";
        let once = strip_whitespace(text).into_owned();
        let twice = strip_whitespace(&once).into_owned();
        assert_eq!(once, twice);
        assert!(matches!(strip_whitespace(&once), Cow::Borrowed(_)));
    }

    #[test]
    fn test_datetime_layout() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap();
        let text = format_datetime(&dt);
        assert_eq!(text, "15.01.2024 10:30:05.000000000");
        assert_eq!(parse_datetime(&text), Some(dt));
    }

    #[test]
    fn test_datetime_normalizes_to_utc() {
        let offset = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_datetime(&dt), "01.06.2024 10:00:00.000000000");
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("name"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }
}
