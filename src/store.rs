//! Multi-record append files.
//!
//! A record file holds any number of independently encoded values, each
//! tagged by an id line:
//!
//! ```text
//! ~alice~
//! {name:"Alice",age:30}
//!
//! ~bob~
//! {name:"Bob",age:25}
//! ```
//!
//! Ids are non-empty and made of letters and digits. The id [`SHARED_ID`] is
//! reserved for the shared overlay written by [`set_shared`]: its fields are
//! spliced after a record's own fields before decoding, so on a name clash the
//! shared value wins.
//!
//! The text helpers ([`find_segment`], [`append_segment`],
//! [`rewrite_segment`], [`overlay_shared`]) work on file contents in memory;
//! the remaining functions read and rewrite whole files. There is no locking:
//! two writers on the same file can lose each other's updates.

use crate::grammar::{CHAR_QUOTE, ESCAPE, RECORD_CLOSE, RECORD_OPEN, STRING_QUOTE};
use crate::scan::Span;
use crate::{classify_type, Error, Kind, Result, TsonSettings, TsonValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Id of the shared overlay segment.
pub const SHARED_ID: &str = "SharedData";

const MARKER: char = '~';

/// One `~id~` block of a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub id: &'a str,
    /// Offset of the opening `~`.
    pub marker: usize,
    /// The encoded body, without surrounding blank lines.
    pub body: Span,
}

impl<'a> Segment<'a> {
    pub fn body_text(&self, text: &'a str) -> &'a str {
        &text[self.body.0..self.body.1]
    }
}

/// Checks that `id` is non-empty and made of ASCII letters and digits.
pub fn validate_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        "id is empty"
    } else if !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        "id may only contain ASCII letters and digits"
    } else {
        return Ok(());
    };
    warn!(id, reason, "rejected segment id");
    Err(Error::invalid_id(id, reason))
}

fn validate_user_id(id: &str) -> Result<()> {
    validate_id(id)?;
    if id == SHARED_ID {
        warn!(id, "rejected reserved segment id");
        return Err(Error::invalid_id(id, "id is reserved for shared data"));
    }
    Ok(())
}

fn header_id(line: &str) -> Option<&str> {
    let id = line.strip_prefix(MARKER)?.strip_suffix(MARKER)?;
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Some(id)
    } else {
        None
    }
}

/// Lists the segments of a record file in file order.
///
/// A segment starts at a line consisting of `~id~` and runs until the next
/// such line. String literals never span lines, so a marker line cannot be
/// part of one.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut found: Vec<Segment<'_>> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if let Some(id) = header_id(content) {
            if let Some(last) = found.last_mut() {
                last.body.1 = offset;
            }
            let body_start = offset + line.len();
            found.push(Segment {
                id,
                marker: offset,
                body: (body_start, text.len()),
            });
        }
        offset += line.len();
    }
    for segment in &mut found {
        let body = &text[segment.body.0..segment.body.1];
        segment.body.1 = segment.body.0 + body.trim_end().len();
    }
    found
}

/// Finds the segment with `id`.
pub fn find_segment<'a>(text: &'a str, id: &str) -> Result<Option<Segment<'a>>> {
    validate_id(id)?;
    Ok(segments(text).into_iter().find(|s| s.id == id))
}

/// Looks for the literal `~id~` anywhere outside string and char literals.
///
/// This also matches a marker pattern embedded in the middle of a line.
pub fn text_contains_id(text: &str, id: &str) -> Result<bool> {
    validate_id(id)?;
    let pattern = format!("{MARKER}{id}{MARKER}");
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if b == ESCAPE => escaped = true,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == STRING_QUOTE || b == CHAR_QUOTE => quote = Some(b),
            None if bytes[i..].starts_with(pattern.as_bytes()) => return Ok(true),
            None => {}
        }
    }
    Ok(false)
}

/// Returns `text` with a new `~id~` segment holding `body` appended.
pub fn append_segment(text: &str, id: &str, body: &str) -> Result<String> {
    validate_id(id)?;
    if segments(text).iter().any(|s| s.id == id) {
        return Err(Error::DuplicateId { id: id.to_string() });
    }
    let mut out = String::with_capacity(text.len() + id.len() + body.len() + 5);
    out.push_str(text);
    if !text.trim().is_empty() {
        if !text.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out.push(MARKER);
    out.push_str(id);
    out.push(MARKER);
    out.push('\n');
    out.push_str(body);
    out.push('\n');
    Ok(out)
}

/// Returns `text` with the body of segment `id` replaced by `body`.
///
/// Everything outside the old body is kept verbatim.
pub fn rewrite_segment(text: &str, id: &str, body: &str) -> Result<String> {
    let segment = find_segment(text, id)?.ok_or_else(|| Error::MissingSegment {
        id: id.to_string(),
    })?;
    let (start, end) = segment.body;
    let mut out = String::with_capacity(text.len() - (end - start) + body.len());
    out.push_str(&text[..start]);
    out.push_str(body);
    out.push_str(&text[end..]);
    Ok(out)
}

fn record_inner<'a>(text: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 && bytes[0] == RECORD_OPEN && bytes[bytes.len() - 1] == RECORD_CLOSE {
        Ok(&trimmed[1..trimmed.len() - 1])
    } else {
        let found: String = trimmed.chars().take(24).collect();
        Err(Error::type_mismatch(None, what, &found))
    }
}

/// Splices the fields of the `shared` record after the fields of `body`.
///
/// Decoding the result assigns the shared values last, so they override
/// same-named fields of the record.
///
/// # Examples
///
/// ```rust
/// use serde_tson::store::overlay_shared;
///
/// assert_eq!(overlay_shared("{a:1,b:2}", "{b:9}").unwrap(), "{a:1,b:2,b:9}");
/// assert_eq!(overlay_shared("{}", "{b:9}").unwrap(), "{b:9}");
/// ```
pub fn overlay_shared(body: &str, shared: &str) -> Result<String> {
    let own = record_inner(body, "record")?.trim_end();
    let extra = record_inner(shared, "shared record")?.trim();
    let mut out = String::with_capacity(own.len() + extra.len() + 3);
    out.push(RECORD_OPEN as char);
    out.push_str(own);
    if !own.trim().is_empty() && !extra.is_empty() {
        out.push(',');
    }
    out.push_str(extra);
    out.push(RECORD_CLOSE as char);
    Ok(out)
}

fn io_error(action: &str, path: &Path, err: io::Error) -> Error {
    Error::io(format!("{} {}: {}", action, path.display(), err))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error("read", path, e))
}

/// Reads a file that may not exist yet.
fn read_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(io_error("read", path, e)),
    }
}

fn write(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| io_error("write", path, e))
}

fn segment_body(path: &Path, text: &str, id: &str) -> Result<String> {
    let segment = find_segment(text, id)?.ok_or_else(|| Error::MissingSegment {
        id: id.to_string(),
    })?;
    debug!(path = %path.display(), id, "found segment");
    Ok(segment.body_text(text).to_string())
}

/// Returns `true` if the file at `path` contains the marker `~id~`.
///
/// A missing file contains no ids.
pub fn contains_id<P: AsRef<Path>>(path: P, id: &str) -> Result<bool> {
    text_contains_id(&read_or_empty(path.as_ref())?, id)
}

/// Lists the ids of all segments in the file, in file order.
pub fn segment_ids<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = read_or_empty(path.as_ref())?;
    Ok(segments(&text).iter().map(|s| s.id.to_string()).collect())
}

/// Encodes `value` and appends it to the file as segment `id`.
///
/// The file is created if missing.
///
/// # Errors
///
/// Fails with [`Error::DuplicateId`] when the file already has a segment
/// `id`, and with [`Error::InvalidId`] for malformed or reserved ids.
pub fn append_to_file<P, T>(path: P, value: &T, id: &str, settings: TsonSettings) -> Result<()>
where
    P: AsRef<Path>,
    T: ?Sized + Serialize,
{
    let path = path.as_ref();
    validate_user_id(id)?;
    let body = crate::to_string_with_settings(value, settings)?;
    let text = append_segment(&read_or_empty(path)?, id, &body)?;
    write(path, &text)?;
    debug!(path = %path.display(), id, bytes = body.len(), "appended segment");
    Ok(())
}

/// Encodes `value` and replaces the body of segment `id` with it.
///
/// # Errors
///
/// Fails with [`Error::MissingSegment`] when the file has no segment `id`.
pub fn rewrite_appended<P, T>(path: P, value: &T, id: &str, settings: TsonSettings) -> Result<()>
where
    P: AsRef<Path>,
    T: ?Sized + Serialize,
{
    let path = path.as_ref();
    validate_user_id(id)?;
    let body = crate::to_string_with_settings(value, settings)?;
    let text = rewrite_segment(&read(path)?, id, &body)?;
    write(path, &text)?;
    debug!(path = %path.display(), id, bytes = body.len(), "rewrote segment");
    Ok(())
}

/// Writes `value` as the file's shared overlay, creating or replacing it.
///
/// The value must encode as a record. Null and default members are left out
/// so that they cannot override record fields.
pub fn set_shared<P, T>(path: P, value: &T, settings: TsonSettings) -> Result<()>
where
    P: AsRef<Path>,
    T: ?Sized + Serialize,
{
    let path = path.as_ref();
    let settings = settings.for_shared();
    let value = crate::to_value_with_settings(value, settings)?;
    if !matches!(value, TsonValue::Record(_)) {
        return Err(Error::type_mismatch(None, "record", &value.kind().to_string()));
    }
    let mut body = String::new();
    crate::ser::write_value(&mut body, &value, &settings, 0);

    let text = read_or_empty(path)?;
    let text = if find_segment(&text, SHARED_ID)?.is_some() {
        rewrite_segment(&text, SHARED_ID, &body)?
    } else {
        append_segment(&text, SHARED_ID, &body)?
    };
    write(path, &text)?;
    debug!(path = %path.display(), id = SHARED_ID, "stored shared data");
    Ok(())
}

/// Decodes segment `id` of the file.
pub fn from_appended<P, T>(path: P, id: &str) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let body = segment_body(path, &read(path)?, id)?;
    crate::from_str(&body)
}

/// Decodes segment `id` with the shared overlay's fields applied on top.
///
/// Shared fields override same-named fields of the segment. Without a shared
/// segment this is the same as [`from_appended`].
///
/// # Errors
///
/// Fails with [`Error::TypeMismatch`] when `T` is not a record type.
pub fn from_appended_with_shared<P, T>(path: P, id: &str) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned + 'static,
{
    let kind = classify_type::<T>();
    if kind != Kind::Record {
        return Err(Error::type_mismatch(None, "record type", &kind.to_string()));
    }
    let path = path.as_ref();
    let text = read(path)?;
    let body = segment_body(path, &text, id)?;
    match find_segment(&text, SHARED_ID)? {
        Some(shared) => {
            let merged = overlay_shared(&body, shared.body_text(&text))?;
            crate::from_str(&merged)
        }
        None => {
            debug!(path = %path.display(), id, "no shared data, decoding segment alone");
            crate::from_str(&body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "~a~\n{x:1}\n\n~b~\n{x:\"~c~\"}\n";

    #[test]
    fn test_segments() {
        let found = segments(FILE);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "a");
        assert_eq!(found[0].body_text(FILE), "{x:1}");
        assert_eq!(found[1].id, "b");
        assert_eq!(found[1].body_text(FILE), "{x:\"~c~\"}");
        assert_eq!(found[1].marker, FILE.find("~b~").unwrap());
    }

    #[test]
    fn test_non_ascii_header_is_not_a_segment() {
        let text = "~a~\n{x:1}\n~é1~\n{x:2}\n";
        let found = segments(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[test]
    fn test_contains_id_skips_strings() {
        assert!(text_contains_id(FILE, "a").unwrap());
        assert!(text_contains_id(FILE, "b").unwrap());
        assert!(!text_contains_id(FILE, "c").unwrap());
        assert!(text_contains_id("x~a~b~", "b").unwrap());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("abc123").is_ok());
        assert!(matches!(validate_id(""), Err(Error::InvalidId { .. })));
        assert!(matches!(validate_id("a-b"), Err(Error::InvalidId { .. })));
        assert!(matches!(validate_id("é1"), Err(Error::InvalidId { .. })));
        assert!(matches!(validate_id("\u{663}"), Err(Error::InvalidId { .. })));
        assert!(matches!(validate_user_id(SHARED_ID), Err(Error::InvalidId { .. })));
    }

    #[test]
    fn test_append_segment() {
        let text = append_segment("", "a", "{x:1}").unwrap();
        assert_eq!(text, "~a~\n{x:1}\n");
        let text = append_segment(&text, "b", "{x:2}").unwrap();
        assert_eq!(text, "~a~\n{x:1}\n\n~b~\n{x:2}\n");
        assert!(matches!(
            append_segment(&text, "a", "{}"),
            Err(Error::DuplicateId { ref id }) if id == "a"
        ));
    }

    #[test]
    fn test_rewrite_segment_keeps_surroundings() {
        let text = rewrite_segment(FILE, "a", "{\n\tx: 5\n}").unwrap();
        assert_eq!(text, "~a~\n{\n\tx: 5\n}\n\n~b~\n{x:\"~c~\"}\n");
        assert!(matches!(
            rewrite_segment(FILE, "z", "{}"),
            Err(Error::MissingSegment { ref id }) if id == "z"
        ));
    }

    #[test]
    fn test_overlay_shared() {
        assert_eq!(overlay_shared("{a:1}", "{}").unwrap(), "{a:1}");
        assert_eq!(
            overlay_shared("{\n\ta: 1\n}", "{\n\tb: 2\n}").unwrap(),
            "{\n\ta: 1,b: 2}"
        );
        assert!(matches!(
            overlay_shared("[1]", "{b:1}"),
            Err(Error::TypeMismatch { .. })
        ));
    }
}
