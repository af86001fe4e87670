//! Tokenizer and serializer for PDF syntax. `header`/`binary_mark`/
//! `xref_start`/`xref_and_trailer`/`indirect_object` are the entry points the
//! reader drives the file with; `object` is the standalone grammar entry
//! point used where there is no indirect-object frame (object-stream
//! members). [`writer`] is the inverse direction.

mod tokenizer;
mod xref_table;
pub mod writer;

use std::collections::HashSet;

use nom_locate::LocatedSpan;

use crate::error::ParseError;
use crate::object::{Object, ObjectId};
use crate::reader::Reader;
use crate::Result;

pub use xref_table::xref_and_trailer;

/// Wraps the byte slice a parse runs over together with a human-readable
/// label, so error messages can say which stage of the document the failure
/// happened in without threading a separate context argument everywhere.
pub type ParserInput<'a> = LocatedSpan<&'a [u8], &'static str>;

/// Parses the `%PDF-x.y` header, returning the version string (`"x.y"`).
pub fn header(input: ParserInput) -> Option<String> {
    let buf = *input.fragment();
    let pos = tokenizer::expect_keyword(buf, 0, b"%PDF-")?;
    let start = pos;
    let mut p = pos;
    while p < buf.len() && (buf[p].is_ascii_digit() || buf[p] == b'.') {
        p += 1;
    }
    if p == start {
        return None;
    }
    std::str::from_utf8(&buf[start..p]).ok().map(|s| s.to_string())
}

/// Parses the binary marker comment conventionally placed on the header's
/// second line (a `%` followed by four-or-more high-bit bytes).
pub fn binary_mark(input: ParserInput) -> Option<Vec<u8>> {
    let buf = *input.fragment();
    if buf.first() != Some(&b'%') {
        return None;
    }
    let start = 1;
    let mut p = start;
    while p < buf.len() && buf[p] != b'\n' && buf[p] != b'\r' {
        p += 1;
    }
    let bytes = buf[start..p].to_vec();
    if bytes.len() >= 4 {
        Some(bytes)
    } else {
        None
    }
}

/// Parses `startxref\n<offset>`, returning the offset.
pub fn xref_start(input: ParserInput) -> Option<i64> {
    let buf = *input.fragment();
    let pos = tokenizer::expect_keyword(buf, 0, b"startxref")?;
    let pos = tokenizer::skip_ws(buf, pos);
    let (val, _) = tokenizer::parse_uint(buf, pos)?;
    Some(val as i64)
}

/// Parses a single free-standing object, with no `N G obj` frame. Used to
/// unpack object-stream members, which can never themselves be streams.
pub fn object(input: ParserInput) -> Option<Object> {
    let buf = *input.fragment();
    tokenizer::parse_object(buf, 0, 0).map(|(obj, _)| obj)
}

/// Parses the indirect object starting at `offset` in `input`'s buffer.
/// `expected_id` overrides the id read from the `N G obj` header, for the
/// rare case a caller already knows which object this offset must resolve
/// to. Decryption is applied by the caller afterwards, not here: at parse
/// time the file key may not be available yet.
pub fn indirect_object(
    input: ParserInput, offset: usize, expected_id: Option<ObjectId>, _reader: &Reader, _already_seen: &mut HashSet<ObjectId>,
) -> Result<(ObjectId, Object)> {
    let buf = *input.fragment();
    if offset > buf.len() {
        return Err(crate::Error::InvalidOffset(offset));
    }

    let pos = tokenizer::skip_ws(buf, offset);
    let (num, p) = tokenizer::parse_uint(buf, pos).ok_or(ParseError::InvalidDictionary)?;
    let p = tokenizer::skip_ws(buf, p);
    let (gen, p) = tokenizer::parse_uint(buf, p).ok_or(ParseError::InvalidDictionary)?;
    let p = tokenizer::skip_ws(buf, p);
    let p = tokenizer::expect_keyword(buf, p, b"obj").ok_or(ParseError::InvalidDictionary)?;

    let parsed_id: ObjectId = (num as u32, gen as u16);
    let id = expected_id.unwrap_or(parsed_id);

    let (mut value, pos) = tokenizer::parse_object(buf, p, 0).ok_or(ParseError::InvalidDictionary)?;

    if matches!(value, Object::Dictionary(_)) {
        let dict = match &value {
            Object::Dictionary(d) => d.clone(),
            _ => unreachable!(),
        };

        let after_dict = tokenizer::skip_ws(buf, pos);
        if let Some(p2) = tokenizer::expect_keyword(buf, after_dict, b"stream") {
            let mut p2 = p2;
            if buf.get(p2) == Some(&b'\r') && buf.get(p2 + 1) == Some(&b'\n') {
                p2 += 2;
            } else if buf.get(p2) == Some(&b'\n') {
                p2 += 1;
            }
            let stream_start = p2;

            let length = dict.get(b"Length").ok().and_then(|v| v.as_i64().ok());
            let content = match length {
                Some(len) if len >= 0 && stream_start + (len as usize) <= buf.len() => {
                    buf[stream_start..stream_start + len as usize].to_vec()
                }
                // `/Length` is an indirect reference we can't resolve yet (no
                // other objects are loaded during a single-offset parse); the
                // reader fixes this up afterwards via `read_stream_content`.
                _ => Vec::new(),
            };

            let mut stream = crate::stream::Stream::new(dict.clone(), Vec::new());
            stream.dict = dict;
            stream.set_encryption_transformed_content(content);
            stream.start_position = Some(stream_start);
            value = Object::Stream(stream);
        }
    }

    Ok((id, value))
}
