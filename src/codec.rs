//! Identifier codec
//!
//! Database names, table names and row keys travel as single URL path
//! segments. The encoding keeps ASCII alphanumerics, `_` and `-` as-is and
//! writes every other byte of the UTF-8 form as `~XX` (uppercase hex). `.` is
//! always escaped, so a trailing `.json` on a segment is unambiguously a
//! format suffix and never part of a name.
//!
//! Decoding is lenient: lowercase hex and characters that would have been
//! escaped are accepted. Such input decodes fine but is not canonical, which
//! the row lookup uses to redirect to the canonical path.
//!
//! Row-key components may also be one of two tags, neither of which an
//! encoded name can produce since `~` is always followed by a hex digit
//! there: [`NULL_COMPONENT`] for a NULL value, and [`TEXT_TAG`] in front of
//! text that would otherwise read as a number.

use std::collections::HashMap;

use crate::error::{BrowseError, Result};

const ESCAPE: u8 = b'~';
const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Separator between the components of a compound row key.
pub const KEY_SEPARATOR: char = ',';

/// Row-key component standing for NULL.
pub const NULL_COMPONENT: &str = "~N";

/// Prefix marking a row-key component as text.
pub const TEXT_TAG: &str = "~T";

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// Encode a name into its canonical path token.
pub fn encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for &byte in name.as_bytes() {
        if is_plain(byte) {
            out.push(byte as char);
        } else {
            out.push(ESCAPE as char);
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        }
    }
    out
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decode a path token back into the name it stands for.
///
/// Returns `None` for a dangling or non-hex `~` escape, or when the escapes
/// do not form valid UTF-8.
pub fn decode(token: &str) -> Option<String> {
    let bytes = token.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == ESCAPE {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Decode a database or table token, reporting a miss as `NotFound`.
pub fn decode_name(kind: &str, token: &str) -> Result<String> {
    decode(token).ok_or_else(|| BrowseError::not_found(kind, token))
}

/// Join key component values into a row-key token.
pub fn encode_row_key<S: AsRef<str>>(components: &[S]) -> String {
    components
        .iter()
        .map(|c| encode(c.as_ref()))
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string())
}

/// Split a row-key token into exactly `arity` decoded components.
pub fn decode_row_key(token: &str, arity: usize) -> Result<Vec<String>> {
    let parts: Vec<&str> = token.split(KEY_SEPARATOR).collect();
    if parts.len() != arity {
        return Err(BrowseError::malformed_key(
            token,
            format!("expected {} component(s), got {}", arity, parts.len()),
        ));
    }
    parts
        .into_iter()
        .map(|part| {
            decode(part).ok_or_else(|| BrowseError::malformed_key(token, "invalid escape"))
        })
        .collect()
}

/// Output shape requested through a path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// `.json` (also the default): rows as arrays aligned to `columns`.
    #[default]
    Arrays,
    /// `.jsono`: rows as column-keyed objects.
    Objects,
}

/// Strip a `.json` / `.jsono` suffix from a raw path segment.
pub fn split_format(segment: &str) -> (&str, Format) {
    if let Some(stem) = segment.strip_suffix(".jsono") {
        (stem, Format::Objects)
    } else if let Some(stem) = segment.strip_suffix(".json") {
        (stem, Format::Arrays)
    } else {
        (segment, Format::Arrays)
    }
}

/// Fail if two distinct names map to the same token.
///
/// Run once over the database names and once per database over its tables
/// and views, before serving.
pub fn ensure_unambiguous<'a, I>(names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<String, &'a str> = HashMap::new();
    for name in names {
        let token = encode(name);
        if let Some(first) = seen.get(&token) {
            return Err(BrowseError::AmbiguousIdentifier {
                first: (*first).to_string(),
                second: name.to_string(),
                token,
            });
        }
        seen.insert(token, name);
    }
    Ok(())
}
