//! Serialises a single [`Object`] back to PDF syntax. The inverse of
//! [`super::tokenizer`]; kept alongside it since the two sides of the
//! grammar share the same escaping/delimiter rules. Used both to pack
//! object-stream members (no indirect header, no stream objects allowed)
//! and, via [`write_indirect`], by the top-level document writer.

use crate::dictionary::Dictionary;
use crate::object::{Object, ObjectId, StringFormat};

/// Writes `object`'s value syntax (no `N G obj`/`endobj` wrapper).
pub fn write_object(out: &mut Vec<u8>, object: &Object) {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(true) => out.extend_from_slice(b"true"),
        Object::Boolean(false) => out.extend_from_slice(b"false"),
        Object::Integer(i) => {
            let mut buf = itoa::Buffer::new();
            out.extend_from_slice(buf.format(*i).as_bytes());
        }
        Object::Real(f) => write_real(out, *f),
        Object::Name(name) => write_name(out, name),
        Object::String(bytes, format) => write_string(out, bytes, *format),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => write_dictionary(out, dict),
        Object::Stream(stream) => {
            write_dictionary(out, &stream.dict);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.content);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Reference(id) => {
            write_uint(out, id.0 as i64);
            out.push(b' ');
            write_uint(out, id.1 as i64);
            out.extend_from_slice(b" R");
        }
    }
}

/// Writes `id N 0 obj ... endobj`, the form every free-standing indirect
/// object takes in a saved file body.
pub fn write_indirect(out: &mut Vec<u8>, id: ObjectId, object: &Object) {
    write_uint(out, id.0 as i64);
    out.push(b' ');
    write_uint(out, id.1 as i64);
    out.extend_from_slice(b" obj\n");
    write_object(out, object);
    out.extend_from_slice(b"\nendobj\n");
}

fn write_uint(out: &mut Vec<u8>, v: i64) {
    let mut buf = itoa::Buffer::new();
    out.extend_from_slice(buf.format(v).as_bytes());
}

fn write_real(out: &mut Vec<u8>, f: f64) {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        out.extend_from_slice(format!("{}", f as i64).as_bytes());
    } else {
        out.extend_from_slice(format!("{f}").as_bytes());
    }
}

fn write_name(out: &mut Vec<u8>, name: &[u8]) {
    out.push(b'/');
    for &b in name {
        if b.is_ascii_graphic() && !matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#') {
            out.push(b);
        } else {
            out.push(b'#');
            out.extend_from_slice(format!("{b:02X}").as_bytes());
        }
    }
}

fn write_string(out: &mut Vec<u8>, bytes: &[u8], format: StringFormat) {
    match format {
        StringFormat::Hexadecimal => {
            out.push(b'<');
            for &b in bytes {
                out.extend_from_slice(format!("{b:02X}").as_bytes());
            }
            out.push(b'>');
        }
        StringFormat::Literal => {
            out.push(b'(');
            for &b in bytes {
                match b {
                    b'(' | b')' | b'\\' => {
                        out.push(b'\\');
                        out.push(b);
                    }
                    b'\n' => out.extend_from_slice(b"\\n"),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    _ => out.push(b),
                }
            }
            out.push(b')');
        }
    }
}

fn write_dictionary(out: &mut Vec<u8>, dict: &Dictionary) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        out.push(b' ');
        write_name(out, key);
        out.push(b' ');
        write_object(out, value);
    }
    out.extend_from_slice(b" >>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_tokenizer() {
        let dict = crate::dictionary! {
            "Type" => "Page",
            "Count" => Object::Integer(3),
        };
        let mut out = Vec::new();
        write_object(&mut out, &Object::Dictionary(dict));

        let (parsed, _) = crate::parser::tokenizer::parse_object(&out, 0, 0).unwrap();
        assert_eq!(parsed.as_dict().unwrap().get(b"Count").unwrap().as_i64().unwrap(), 3);
    }

    #[test]
    fn escapes_parens_in_literal_strings() {
        let mut out = Vec::new();
        write_string(&mut out, b"a(b)c", StringFormat::Literal);
        assert_eq!(out, b"(a\\(b\\)c)");
    }
}
