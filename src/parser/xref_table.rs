//! Parses the two cross-reference table encodings (§4.3): the classic
//! plain-text `xref`/`trailer` pair, and the PDF 1.5+ xref stream, which
//! packs the same information (plus doubling as the trailer) into a
//! compressed binary stream.

use crate::dictionary::Dictionary;
use crate::error::{ParseError, XrefError};
use crate::object::Object;
use crate::reader::Reader;
use crate::xref::{XrefEntry, XrefTable};
use crate::Result;

use super::tokenizer::{self, expect_keyword, parse_uint, skip_ws};
use super::ParserInput;

pub fn xref_and_trailer(input: ParserInput, reader: &Reader) -> Result<(XrefTable, Dictionary)> {
    let buf = *input.fragment();
    let pos = skip_ws(buf, 0);

    if let Some(after_xref) = expect_keyword(buf, pos, b"xref") {
        parse_classic(buf, after_xref)
    } else {
        parse_xref_stream(buf, pos, reader)
    }
}

fn parse_classic(buf: &[u8], mut pos: usize) -> Result<(XrefTable, Dictionary)> {
    let mut table = XrefTable::new(0);

    loop {
        pos = skip_ws(buf, pos);
        if expect_keyword(buf, pos, b"trailer").is_some() {
            break;
        }

        let (start, p) = parse_uint(buf, pos).ok_or(ParseError::InvalidXref)?;
        let p = skip_ws(buf, p);
        let (count, p) = parse_uint(buf, p).ok_or(ParseError::InvalidXref)?;
        pos = p;

        for i in 0..count {
            pos = skip_ws(buf, pos);
            let (offset, p) = parse_uint(buf, pos).ok_or(ParseError::InvalidXref)?;
            let p = skip_ws(buf, p);
            let (generation, p) = parse_uint(buf, p).ok_or(ParseError::InvalidXref)?;
            let p = skip_ws(buf, p);
            let kind = *buf.get(p).ok_or(ParseError::InvalidXref)?;
            pos = p + 1;

            let object_number = (start + i) as u32;
            let entry = match kind {
                b'n' => XrefEntry::Normal {
                    offset: offset as u32,
                    generation: generation as u16,
                },
                b'f' => XrefEntry::Free {
                    next: offset as u32,
                    generation: generation as u16,
                },
                _ => return Err(ParseError::InvalidXref.into()),
            };
            table.add_entry(object_number, entry);
        }
    }

    let pos = expect_keyword(buf, pos, b"trailer").ok_or(ParseError::InvalidTrailer)?;
    let pos = skip_ws(buf, pos);
    let (trailer_obj, _) = tokenizer::parse_object(buf, pos, 0).ok_or(ParseError::InvalidTrailer)?;
    let trailer = match trailer_obj {
        Object::Dictionary(d) => d,
        _ => return Err(ParseError::InvalidTrailer.into()),
    };

    table.size = trailer.get(b"Size").and_then(Object::as_i64).unwrap_or(0).max(0) as u32;
    Ok((table, trailer))
}

fn parse_xref_stream(buf: &[u8], pos: usize, _reader: &Reader) -> Result<(XrefTable, Dictionary)> {
    let p = skip_ws(buf, pos);
    let (_num, p) = parse_uint(buf, p).ok_or(XrefError::Start)?;
    let p = skip_ws(buf, p);
    let (_gen, p) = parse_uint(buf, p).ok_or(XrefError::Start)?;
    let p = skip_ws(buf, p);
    let p = expect_keyword(buf, p, b"obj").ok_or(XrefError::Start)?;

    let (value, p) = tokenizer::parse_object(buf, p, 0).ok_or(XrefError::Start)?;
    let dict = match value {
        Object::Dictionary(d) => d,
        _ => return Err(XrefError::Start.into()),
    };

    let p = skip_ws(buf, p);
    let p = expect_keyword(buf, p, b"stream").ok_or(XrefError::Start)?;
    let mut p = p;
    if buf.get(p) == Some(&b'\r') && buf.get(p + 1) == Some(&b'\n') {
        p += 2;
    } else if buf.get(p) == Some(&b'\n') {
        p += 1;
    }

    let length = dict.get(b"Length").and_then(Object::as_i64).map_err(|_| XrefError::Start)? as usize;
    let end = p.checked_add(length).filter(|&e| e <= buf.len()).ok_or(XrefError::Start)?;
    let raw = &buf[p..end];
    let decoded = crate::filters::decode(&dict, raw)?;

    let widths_obj = dict.get(b"W").and_then(Object::as_array).map_err(|_| XrefError::MalformedWidths)?;
    if widths_obj.len() != 3 {
        return Err(XrefError::MalformedWidths.into());
    }
    let widths: Vec<usize> = widths_obj.iter().map(|o| o.as_i64().unwrap_or(0).max(0) as usize).collect();
    let row_len = widths[0] + widths[1] + widths[2];
    if row_len == 0 {
        return Err(XrefError::MalformedWidths.into());
    }

    let size = dict.get(b"Size").and_then(Object::as_i64).unwrap_or(0).max(0) as u32;
    let index_pairs: Vec<(u32, u32)> = match dict.get(b"Index").and_then(Object::as_array) {
        Ok(arr) => arr
            .chunks_exact(2)
            .filter_map(|pair| Some((pair[0].as_i64().ok()? as u32, pair[1].as_i64().ok()? as u32)))
            .collect(),
        Err(_) => vec![(0, size)],
    };

    let mut table = XrefTable::new(size);
    let mut cursor = 0usize;
    for (start, count) in index_pairs {
        for i in 0..count {
            if cursor + row_len > decoded.len() {
                break;
            }
            let row = &decoded[cursor..cursor + row_len];
            cursor += row_len;

            let mut off = 0usize;
            let field_type = if widths[0] == 0 {
                1
            } else {
                read_be(&row[off..off + widths[0]]) as u8
            };
            off += widths[0];
            let field2 = read_be(&row[off..off + widths[1]]);
            off += widths[1];
            let field3 = read_be(&row[off..off + widths[2]]);

            let object_number = start + i;
            let entry = match field_type {
                0 => XrefEntry::Free {
                    next: field2 as u32,
                    generation: field3 as u16,
                },
                1 => XrefEntry::Normal {
                    offset: field2 as u32,
                    generation: field3 as u16,
                },
                2 => XrefEntry::Compressed {
                    container: field2 as u32,
                    index: field3 as u16,
                },
                other => return Err(XrefError::InvalidEntryType(other).into()),
            };
            table.add_entry(object_number, entry);
        }
    }

    Ok((table, dict))
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}
