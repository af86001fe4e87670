//! Object streams (`/Type /ObjStm`, §4.3): a stream packing several
//! non-stream indirect objects together so they share one compressed
//! payload, the dominant space saving in modern PDF writers.

use std::collections::BTreeMap;

use nom::character::complete::{digit1, multispace0};
use nom::multi::many0;
use nom::sequence::{preceded, separated_pair};
use nom::Parser;

use crate::error::ParseError;
use crate::object::{Object, ObjectId};
use crate::parser::{self, ParserInput};
use crate::stream::Stream;
use crate::Result;

/// A decoded object stream: the objects it contains, keyed by `(object
/// number, generation 0)` since compressed objects are always generation 0.
pub struct ObjectStream {
    pub objects: BTreeMap<ObjectId, Object>,
}

impl ObjectStream {
    /// Decodes `stream`'s filter chain and parses out every packed object.
    pub fn new(stream: &mut Stream) -> Result<Self> {
        let dict = stream.dict.clone();
        let n = dict
            .get(b"N")
            .and_then(Object::as_i64)
            .map_err(|_| ParseError::InvalidObjectStream)? as usize;
        let first = dict
            .get(b"First")
            .and_then(Object::as_i64)
            .map_err(|_| ParseError::InvalidObjectStream)? as usize;

        let content = stream.decompressed_content()?;
        if first > content.len() {
            return Err(ParseError::InvalidObjectStream.into());
        }

        let (header, body) = content.split_at(first);
        let header_pairs = parse_header(header, n)?;

        let mut objects = BTreeMap::new();
        for (object_number, rel_offset) in header_pairs {
            if rel_offset > body.len() {
                continue;
            }
            let slice = &body[rel_offset..];
            if let Some(object) = parser::object(ParserInput::new_extra(slice, "objstm member")) {
                objects.insert((object_number, 0), object);
            }
        }

        Ok(ObjectStream { objects })
    }
}

/// Parses the `N` pairs of `object_number offset` integers that precede the
/// packed object bodies.
fn parse_header(header: &[u8], n: usize) -> Result<Vec<(u32, usize)>> {
    let pair = separated_pair(digit1::<_, nom::error::Error<_>>, multispace0, digit1);
    let mut parser = many0(preceded(multispace0, pair));

    let (_, pairs) = parser
        .parse(header)
        .map_err(|_| ParseError::InvalidObjectStream)?;

    let pairs: Vec<(u32, usize)> = pairs
        .into_iter()
        .filter_map(|(num, off)| {
            let num: u32 = std::str::from_utf8(num).ok()?.parse().ok()?;
            let off: usize = std::str::from_utf8(off).ok()?.parse().ok()?;
            Some((num, off))
        })
        .collect();

    if pairs.len() < n {
        return Err(ParseError::InvalidObjectStream.into());
    }

    Ok(pairs)
}

/// Configuration for how the writer groups objects into streams (§4.5,
/// `ObjectStreamBuilder`).
#[derive(Debug, Clone, Copy)]
pub struct ObjectStreamConfig {
    /// Maximum objects packed into a single `/ObjStm`. The spec caps this at
    /// 100 to bound decode latency for random single-object access.
    pub max_objects_per_stream: usize,
}

impl Default for ObjectStreamConfig {
    fn default() -> Self {
        ObjectStreamConfig {
            max_objects_per_stream: 100,
        }
    }
}

/// Packs a batch of non-stream objects into one or more `/ObjStm` streams
/// respecting [`ObjectStreamConfig::max_objects_per_stream`].
pub struct ObjectStreamBuilder {
    config: ObjectStreamConfig,
}

impl ObjectStreamBuilder {
    pub fn new(config: ObjectStreamConfig) -> Self {
        ObjectStreamBuilder { config }
    }

    /// Returns one `(header bytes, body bytes)` pair per stream produced,
    /// plus the `(object number, index within its stream)` assignment for
    /// every packed object, in the same order as `objects`.
    pub fn build_object_streams(&self, objects: &[(ObjectId, Object)]) -> Vec<ObjectStreamPlan> {
        objects
            .chunks(self.config.max_objects_per_stream.max(1))
            .map(|chunk| self.build_one(chunk))
            .collect()
    }

    fn build_one(&self, chunk: &[(ObjectId, Object)]) -> ObjectStreamPlan {
        let mut header = String::new();
        let mut body = Vec::new();
        let mut members = Vec::with_capacity(chunk.len());

        for (index, (id, object)) in chunk.iter().enumerate() {
            let offset = body.len();
            header.push_str(&format!("{} {} ", id.0, offset));
            crate::parser::writer::write_object(&mut body, object);
            body.push(b'\n');
            members.push((*id, index as u16));
        }

        ObjectStreamPlan {
            header: header.into_bytes(),
            body,
            n: chunk.len(),
            members,
        }
    }
}

/// One `/ObjStm` worth of serialised content, ready for the writer to wrap
/// in a dictionary, filter, and emit as an indirect stream object.
pub struct ObjectStreamPlan {
    pub header: Vec<u8>,
    pub body: Vec<u8>,
    pub n: usize,
    pub members: Vec<(ObjectId, u16)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_two_packed_objects() {
        let objects = vec![
            ((10, 0), Object::Integer(42)),
            ((11, 0), Object::string_literal(*b"hi")),
        ];
        let plan = ObjectStreamBuilder::new(ObjectStreamConfig::default())
            .build_object_streams(&objects)
            .remove(0);

        let mut content = plan.header.clone();
        content.extend_from_slice(&plan.body);
        let first = plan.header.len();

        let dict = crate::dictionary! {
            "Type" => "ObjStm",
            "N" => Object::Integer(plan.n as i64),
            "First" => Object::Integer(first as i64),
        };
        let mut stream = Stream::new(dict, content);

        let decoded = ObjectStream::new(&mut stream).unwrap();
        assert_eq!(decoded.objects.get(&(10, 0)), Some(&Object::Integer(42)));
        assert_eq!(decoded.objects.len(), 2);
    }

    #[test]
    fn chunks_respect_max_objects_per_stream() {
        let objects: Vec<_> = (0..5).map(|i| ((i, 0), Object::Integer(i as i64))).collect();
        let config = ObjectStreamConfig {
            max_objects_per_stream: 2,
        };
        let plans = ObjectStreamBuilder::new(config).build_object_streams(&objects);
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].n, 2);
        assert_eq!(plans[2].n, 1);
    }
}
