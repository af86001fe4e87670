//! Hand-rolled recursive-descent tokenizer for the PDF object grammar (ISO
//! 32000-1 §7.3). Scanning is byte-oriented rather than composed from `nom`
//! combinators: the grammar backtracks (an integer may turn out to be the
//! first half of an indirect reference) in a way that reads more plainly as
//! direct position arithmetic than as combinator chains, the same tradeoff
//! `Reader::extract_raw_object` already makes for the outer object frame.

use crate::dictionary::Dictionary;
use crate::object::{Object, StringFormat};
use crate::reader::MAX_BRACKET;

pub(super) fn skip_ws(buf: &[u8], mut pos: usize) -> usize {
    loop {
        while pos < buf.len() && is_whitespace(buf[pos]) {
            pos += 1;
        }
        if pos < buf.len() && buf[pos] == b'%' {
            while pos < buf.len() && buf[pos] != b'\n' && buf[pos] != b'\r' {
                pos += 1;
            }
            continue;
        }
        break;
    }
    pos
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0c | 0x00)
}

fn is_regular(b: u8) -> bool {
    !is_delimiter(b) && !is_whitespace(b)
}

pub(super) fn expect_keyword(buf: &[u8], pos: usize, kw: &[u8]) -> Option<usize> {
    if buf.get(pos..pos + kw.len())? == kw {
        Some(pos + kw.len())
    } else {
        None
    }
}

pub(super) fn parse_uint(buf: &[u8], pos: usize) -> Option<(u64, usize)> {
    let start = pos;
    let mut p = pos;
    while p < buf.len() && buf[p].is_ascii_digit() {
        p += 1;
    }
    if p == start {
        return None;
    }
    std::str::from_utf8(&buf[start..p]).ok()?.parse().ok().map(|v| (v, p))
}

/// Entry point for the object grammar. `depth` bounds array/dictionary
/// nesting so a malformed or adversarial document can't blow the stack.
pub fn parse_object(buf: &[u8], pos: usize, depth: usize) -> Option<(Object, usize)> {
    if depth > 256 {
        return None;
    }
    let pos = skip_ws(buf, pos);
    let b = *buf.get(pos)?;

    match b {
        b'/' => parse_name(buf, pos),
        b'(' => parse_literal_string(buf, pos),
        b'<' if buf.get(pos + 1) == Some(&b'<') => parse_dictionary(buf, pos, depth),
        b'<' => parse_hex_string(buf, pos),
        b'[' => parse_array(buf, pos, depth),
        b't' if expect_keyword(buf, pos, b"true").is_some() => Some((Object::Boolean(true), pos + 4)),
        b'f' if expect_keyword(buf, pos, b"false").is_some() => Some((Object::Boolean(false), pos + 5)),
        b'n' if expect_keyword(buf, pos, b"null").is_some() => Some((Object::Null, pos + 4)),
        b'+' | b'-' | b'.' | b'0'..=b'9' => parse_number_or_reference(buf, pos),
        _ => None,
    }
}

fn parse_name(buf: &[u8], pos: usize) -> Option<(Object, usize)> {
    let mut p = pos + 1;
    let mut out = Vec::new();
    while p < buf.len() && is_regular(buf[p]) {
        if buf[p] == b'#' && p + 2 < buf.len() && buf[p + 1].is_ascii_hexdigit() && buf[p + 2].is_ascii_hexdigit() {
            let hex = std::str::from_utf8(&buf[p + 1..p + 3]).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            p += 3;
        } else {
            out.push(buf[p]);
            p += 1;
        }
    }
    Some((Object::Name(out), p))
}

fn parse_literal_string(buf: &[u8], pos: usize) -> Option<(Object, usize)> {
    let mut p = pos + 1;
    let mut depth = 1usize;
    let mut out = Vec::new();

    while depth > 0 {
        let b = *buf.get(p)?;
        match b {
            b'\\' => {
                p += 1;
                let esc = *buf.get(p)?;
                match esc {
                    b'n' => {
                        out.push(b'\n');
                        p += 1;
                    }
                    b'r' => {
                        out.push(b'\r');
                        p += 1;
                    }
                    b't' => {
                        out.push(b'\t');
                        p += 1;
                    }
                    b'b' => {
                        out.push(0x08);
                        p += 1;
                    }
                    b'f' => {
                        out.push(0x0c);
                        p += 1;
                    }
                    b'(' => {
                        out.push(b'(');
                        p += 1;
                    }
                    b')' => {
                        out.push(b')');
                        p += 1;
                    }
                    b'\\' => {
                        out.push(b'\\');
                        p += 1;
                    }
                    b'\r' => {
                        p += 1;
                        if buf.get(p) == Some(&b'\n') {
                            p += 1;
                        }
                    }
                    b'\n' => {
                        p += 1;
                    }
                    b'0'..=b'7' => {
                        let mut val: u16 = 0;
                        let mut n = 0;
                        while n < 3 && matches!(buf.get(p), Some(b'0'..=b'7')) {
                            val = val * 8 + (buf[p] - b'0') as u16;
                            p += 1;
                            n += 1;
                        }
                        out.push((val & 0xff) as u8);
                    }
                    other => {
                        out.push(other);
                        p += 1;
                    }
                }
            }
            b'(' => {
                depth += 1;
                if depth > MAX_BRACKET {
                    return None;
                }
                out.push(b'(');
                p += 1;
            }
            b')' => {
                depth -= 1;
                p += 1;
                if depth > 0 {
                    out.push(b')');
                }
            }
            other => {
                out.push(other);
                p += 1;
            }
        }
    }

    Some((Object::String(out, StringFormat::Literal), p))
}

fn parse_hex_string(buf: &[u8], pos: usize) -> Option<(Object, usize)> {
    let mut p = pos + 1;
    let mut nibbles = Vec::new();
    loop {
        let b = *buf.get(p)?;
        if b == b'>' {
            p += 1;
            break;
        }
        if b.is_ascii_hexdigit() {
            nibbles.push(b);
        } else if !is_whitespace(b) {
            return None;
        }
        p += 1;
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(b'0');
    }
    let bytes: Option<Vec<u8>> = nibbles
        .chunks_exact(2)
        .map(|pair| u8::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok())
        .collect();
    Some((Object::String(bytes?, StringFormat::Hexadecimal), p))
}

fn parse_array(buf: &[u8], pos: usize, depth: usize) -> Option<(Object, usize)> {
    let mut p = pos + 1;
    let mut items = Vec::new();
    loop {
        p = skip_ws(buf, p);
        if *buf.get(p)? == b']' {
            p += 1;
            break;
        }
        let (item, next) = parse_object(buf, p, depth + 1)?;
        items.push(item);
        p = next;
    }
    Some((Object::Array(items), p))
}

fn parse_dictionary(buf: &[u8], pos: usize, depth: usize) -> Option<(Object, usize)> {
    let mut p = pos + 2;
    let mut dict = Dictionary::new();
    loop {
        p = skip_ws(buf, p);
        if buf.get(p..p + 2) == Some(b">>") {
            p += 2;
            break;
        }
        let (key, next) = parse_name(buf, p)?;
        let key = match key {
            Object::Name(n) => n,
            _ => unreachable!(),
        };
        p = skip_ws(buf, next);
        let (value, next) = parse_object(buf, p, depth + 1)?;
        dict.set(key, value);
        p = next;
    }
    Some((Object::Dictionary(dict), p))
}

fn parse_number_or_reference(buf: &[u8], pos: usize) -> Option<(Object, usize)> {
    let (text, end, is_integer) = scan_number(buf, pos)?;

    if is_integer {
        if let Ok(int_val) = text.parse::<i64>() {
            if int_val >= 0 {
                let after_first = skip_ws(buf, end);
                if let Some((gen_text, gen_end, true)) = scan_number(buf, after_first) {
                    if let Ok(gen_val) = gen_text.parse::<i64>() {
                        if gen_val >= 0 {
                            let after_gen = skip_ws(buf, gen_end);
                            if buf.get(after_gen) == Some(&b'R')
                                && !buf.get(after_gen + 1).copied().map(is_regular).unwrap_or(false)
                            {
                                return Some((Object::Reference((int_val as u32, gen_val as u16)), after_gen + 1));
                            }
                        }
                    }
                }
            }
            return Some((Object::Integer(int_val), end));
        }
    }

    text.parse::<f64>().ok().map(|f| (Object::Real(f), end))
}

/// Scans one numeric token, returning its text, end position, and whether it
/// is a bare integer (no `.`) so the caller can attempt reference lookahead.
fn scan_number(buf: &[u8], pos: usize) -> Option<(String, usize, bool)> {
    let start = pos;
    let mut p = pos;
    if matches!(buf.get(p), Some(b'+') | Some(b'-')) {
        p += 1;
    }
    let mut saw_digit = false;
    let mut saw_dot = false;
    while let Some(&b) = buf.get(p) {
        match b {
            b'0'..=b'9' => {
                saw_digit = true;
                p += 1;
            }
            b'.' if !saw_dot => {
                saw_dot = true;
                p += 1;
            }
            _ => break,
        }
    }
    if !saw_digit {
        return None;
    }
    let text = std::str::from_utf8(&buf[start..p]).ok()?.to_string();
    Some((text, p, !saw_dot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reference() {
        let (obj, pos) = parse_object(b"12 0 R rest", 0, 0).unwrap();
        assert_eq!(obj, Object::Reference((12, 0)));
        assert_eq!(&b"12 0 R rest"[pos..], b" rest");
    }

    #[test]
    fn backtracks_when_not_a_reference() {
        let (obj, pos) = parse_object(b"12 0 /Name", 0, 0).unwrap();
        assert_eq!(obj, Object::Integer(12));
        assert_eq!(pos, 2);
    }

    #[test]
    fn parses_nested_dictionary_and_array() {
        let (obj, _) = parse_object(b"<< /Kids [1 0 R 2 0 R] /Count 2 >>", 0, 0).unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get(b"Count").unwrap().as_i64().unwrap(), 2);
        assert_eq!(dict.get(b"Kids").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn literal_string_escapes_decode() {
        let (obj, _) = parse_object(br"(Hello \(World\)\n)", 0, 0).unwrap();
        assert_eq!(obj.as_str().unwrap(), b"Hello (World)\n");
    }

    #[test]
    fn hex_string_odd_length_pads_last_nibble() {
        let (obj, _) = parse_object(b"<4E6F2>", 0, 0).unwrap();
        assert_eq!(obj.as_str().unwrap(), b"No ");
    }

    #[test]
    fn over_deep_literal_string_fails() {
        let mut s = vec![b'('; MAX_BRACKET + 2];
        s.extend(std::iter::repeat(b')').take(MAX_BRACKET + 2));
        assert!(parse_literal_string(&s, 0).is_none());
    }
}
