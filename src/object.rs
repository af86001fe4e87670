use crate::dictionary::Dictionary;
use crate::stream::Stream;
use crate::{Error, Result};

/// The object number / generation number pair identifying a PDF indirect object.
///
/// `ObjectId`s are lookup keys into the document's xref table; they carry no
/// ownership of the object they name; dereferencing is always an explicit
/// operation (see [`crate::document::Document::deref`]).
pub type ObjectId = (u32, u16);

/// How a PDF string literal was lexed, preserved so re-serialisation can pick
/// the same syntax back (this has no semantic effect: both forms decode to
/// the same byte string).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

/// A PDF object. Every case here corresponds 1:1 to a production in the PDF
/// object grammar (ISO 32000-1 §7.3); dispatch on this enum replaces the
/// class-hierarchy style some PDF libraries use.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(s: S) -> Self {
        Object::String(s.into(), StringFormat::Literal)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Object::Boolean(b) => Ok(*b),
            _ => Err(Error::Type { expected: "Boolean" }),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Object::Integer(i) => Ok(*i),
            Object::Real(f) => Ok(*f as i64),
            _ => Err(Error::Type { expected: "Integer" }),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(f) => Ok(*f),
            _ => Err(Error::Type { expected: "Real" }),
        }
    }

    pub fn as_name(&self) -> Result<&[u8]> {
        match self {
            Object::Name(n) => Ok(n),
            _ => Err(Error::Type { expected: "Name" }),
        }
    }

    pub fn as_str(&self) -> Result<&[u8]> {
        match self {
            Object::String(s, _) => Ok(s),
            _ => Err(Error::Type { expected: "String" }),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::Type { expected: "Array" }),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::Type { expected: "Array" }),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&s.dict),
            _ => Err(Error::Type { expected: "Dictionary" }),
        }
    }

    pub fn as_dict_mut(&mut self) -> Result<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&mut s.dict),
            _ => Err(Error::Type { expected: "Dictionary" }),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::Type { expected: "Stream" }),
        }
    }

    pub fn as_stream_mut(&mut self) -> Result<&mut Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::Type { expected: "Stream" }),
        }
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        match self {
            Object::Reference(id) => Ok(*id),
            _ => Err(Error::Type { expected: "Reference" }),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    #[cfg(feature = "chrono")]
    pub fn as_datetime(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        crate::reader::metadata::parse_pdf_date(self.as_str().ok()?)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<f64> for Object {
    fn from(f: f64) -> Self {
        Object::Real(f)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::Name(s.as_bytes().to_vec())
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Object::Name(s.into_bytes())
    }
}

impl From<Vec<Object>> for Object {
    fn from(a: Vec<Object>) -> Self {
        Object::Array(a)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}

impl From<Stream> for Object {
    fn from(s: Stream) -> Self {
        Object::Stream(s)
    }
}

impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}

#[cfg(feature = "chrono")]
impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Object {
    fn from(dt: chrono::DateTime<Tz>) -> Self {
        Object::string_literal(crate::reader::metadata::format_pdf_date(dt.fixed_offset()))
    }
}
