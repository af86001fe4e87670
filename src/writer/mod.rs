//! Document serialisation (§5): assembles a full PDF byte stream from a
//! [`Document`]'s object table, optionally packing objects into `/ObjStm`
//! containers, writing either a classic `xref` table or an xref stream, and
//! installing fresh encryption when [`SaveOptions::encryption`] is set.

use std::collections::BTreeMap;

use crate::config::SaveOptions;
use crate::dictionary::Dictionary;
use crate::document::Document;
use crate::encryption;
use crate::filters;
use crate::object::{Object, ObjectId};
use crate::object_stream::{ObjectStreamBuilder, ObjectStreamConfig};
use crate::parser::writer as object_writer;
use crate::stream::Stream;
use crate::xref::{XrefEntry, XrefTable};
use crate::Result;

/// Serialises `document` per `options`, returning the full file bytes.
pub fn serialize(document: &Document, options: &SaveOptions) -> Result<Vec<u8>> {
    let eol = options.eol.as_bytes();
    let mut objects: BTreeMap<ObjectId, Object> = document.objects.clone();
    let mut trailer = document.trailer.clone();
    let mut next_id = objects.keys().map(|id| id.0).max().unwrap_or(0).max(document.max_id) + 1;

    let encrypt_id = if let Some(enc_opts) = &options.encryption {
        let file_id = ensure_file_id(&mut trailer);
        let (encrypt_dict, state) = encryption::build_encryption(
            enc_opts.algorithm,
            enc_opts.permissions,
            &enc_opts.user_password,
            &enc_opts.owner_password,
            &file_id,
        );
        let encrypt_id = (next_id, 0);
        next_id += 1;
        objects.insert(encrypt_id, Object::Dictionary(encrypt_dict));
        trailer.set("Encrypt", Object::Reference(encrypt_id));

        for (id, object) in objects.iter_mut() {
            if *id == encrypt_id {
                continue;
            }
            encryption::encrypt_object(&state, *id, object);
        }
        Some(encrypt_id)
    } else {
        None
    };

    let mut header = Vec::new();
    header.extend_from_slice(format!("%PDF-{}", document.version).as_bytes());
    header.extend_from_slice(eol);
    header.push(b'%');
    if document.binary_mark.len() >= 4 {
        header.extend_from_slice(&document.binary_mark);
    } else {
        header.extend_from_slice(&[0xE2, 0xE3, 0xCF, 0xD3]);
    }
    header.extend_from_slice(eol);

    let mut body = Vec::new();
    let mut xref = XrefTable::new(0);

    // A classic table cannot represent compressed (type 2) entries, so
    // packing objects into object streams forces an xref stream regardless
    // of what the caller asked for.
    let emit_xref_stream = options.use_xref_streams || options.use_object_streams;

    if options.use_object_streams {
        write_body_packed(&objects, encrypt_id, header.len(), &mut body, &mut xref)?;
    } else {
        write_body_flat(&objects, header.len(), &mut body, &mut xref);
    }

    let mut out = header;
    out.extend_from_slice(&body);
    let startxref = out.len();

    if emit_xref_stream {
        write_xref_stream(&mut out, &mut next_id, &mut xref, &trailer);
    } else {
        xref.size = xref.max_id() + 1;
        fill_free_list(&mut xref);
        trailer.set("Size", Object::Integer(xref.size as i64));
        write_classic_xref(&mut out, &xref, &trailer, eol);
    }

    out.extend_from_slice(b"startxref");
    out.extend_from_slice(eol);
    out.extend_from_slice(startxref.to_string().as_bytes());
    out.extend_from_slice(eol);
    out.extend_from_slice(b"%%EOF");
    out.extend_from_slice(eol);

    Ok(out)
}

/// Reuses the trailer's existing `/ID` first element if present, otherwise
/// mints a fresh random 16-byte identifier and installs it as both halves.
fn ensure_file_id(trailer: &mut Dictionary) -> Vec<u8> {
    if let Ok(existing) = trailer.get(b"ID").and_then(Object::as_array) {
        if let Some(first) = existing.first().and_then(|o| o.as_str().ok()) {
            return first.to_vec();
        }
    }

    use rand::RngCore;
    let mut id = vec![0u8; 16];
    rand::rng().fill_bytes(&mut id);
    trailer.set("ID", Object::Array(vec![Object::string_literal(id.clone()), Object::string_literal(id.clone())]));
    id
}

fn write_body_flat(objects: &BTreeMap<ObjectId, Object>, header_len: usize, body: &mut Vec<u8>, xref: &mut XrefTable) {
    for (id, object) in objects {
        xref.add_entry(id.0, XrefEntry::Normal { offset: (header_len + body.len()) as u32, generation: id.1 });
        object_writer::write_indirect(body, *id, object);
    }
}

/// Writes stream objects directly (object streams can't hold them) and
/// packs everything else through [`ObjectStreamBuilder`]. The freshly
/// installed `/Encrypt` dictionary, if any, is also kept direct: a reader
/// must be able to find it before it has a file key to unpack object
/// streams with.
fn write_body_packed(
    objects: &BTreeMap<ObjectId, Object>, encrypt_id: Option<ObjectId>, header_len: usize, body: &mut Vec<u8>, xref: &mut XrefTable,
) -> Result<()> {
    let mut packable = Vec::new();

    for (id, object) in objects {
        if matches!(object, Object::Stream(_)) || Some(*id) == encrypt_id {
            xref.add_entry(id.0, XrefEntry::Normal { offset: (header_len + body.len()) as u32, generation: id.1 });
            object_writer::write_indirect(body, *id, object);
        } else {
            packable.push((*id, object.clone()));
        }
    }

    if packable.is_empty() {
        return Ok(());
    }

    let builder = ObjectStreamBuilder::new(ObjectStreamConfig::default());
    let next_container_id = {
        let from_objects = objects.keys().map(|id| id.0).max().unwrap_or(0);
        from_objects.max(xref.max_id()) + 1
    };
    let mut container_id = next_container_id;

    for plan in builder.build_object_streams(&packable) {
        let stream_id = (container_id, 0);
        container_id += 1;

        let mut content = plan.header.clone();
        content.extend_from_slice(&plan.body);
        let first = plan.header.len();

        let dict = crate::dictionary! {
            "Type" => "ObjStm",
            "N" => Object::Integer(plan.n as i64),
            "First" => Object::Integer(first as i64),
            "Filter" => "FlateDecode",
        };
        let encoded = filters::encode(&dict, &content)?;
        let stream = Stream::new(dict, encoded);

        for (member_id, index) in &plan.members {
            xref.add_entry(member_id.0, XrefEntry::Compressed { container: stream_id.0, index: *index });
        }

        xref.add_entry(stream_id.0, XrefEntry::Normal { offset: (header_len + body.len()) as u32, generation: 0 });
        object_writer::write_indirect(body, stream_id, &Object::Stream(stream));
    }

    Ok(())
}

/// Fills every object-number gap in `0..xref.size` that the body pass left
/// with no entry (objects the optimiser swept, or numbers never allocated)
/// with `UnusableFree`, then threads every free entry — including object 0 —
/// into the single ascending chain §4.4/§4.5/§8.3 require. Must run after
/// `xref.size` is final and before either xref form is emitted.
fn fill_free_list(xref: &mut XrefTable) {
    for num in 0..xref.size {
        if xref.get(num).is_none() {
            xref.add_entry(num, XrefEntry::UnusableFree);
        }
    }
    xref.rebuild_free_list();
}

fn write_classic_xref(out: &mut Vec<u8>, xref: &XrefTable, trailer: &Dictionary, eol: &[u8]) {
    out.extend_from_slice(b"xref");
    out.extend_from_slice(eol);
    out.extend_from_slice(format!("0 {}", xref.size).as_bytes());
    out.extend_from_slice(eol);

    for num in 0..xref.size {
        // Classic xref rows must be exactly 20 bytes (ISO 32000-1 §7.5.4), so
        // the row terminator is fixed regardless of the configured EOL style.
        let row = match xref.get(num) {
            Some(XrefEntry::Normal { offset, generation }) => format!("{offset:010} {generation:05} n \n"),
            Some(XrefEntry::Free { next, generation }) => format!("{next:010} {generation:05} f \n"),
            _ => format!("{:010} {:05} f \n", 0, 65535),
        };
        out.extend_from_slice(row.as_bytes());
    }

    out.extend_from_slice(b"trailer");
    out.extend_from_slice(eol);
    object_writer::write_object(out, &Object::Dictionary(trailer.clone()));
    out.extend_from_slice(eol);
}

/// Writes the document as a single xref stream (§4.3), which also carries
/// the trailer keys as its own dictionary entries. The stream must describe
/// its own position, so its object id and offset are folded into `xref`
/// before the row data is built.
fn write_xref_stream(out: &mut Vec<u8>, next_id: &mut u32, xref: &mut XrefTable, trailer: &Dictionary) {
    let stream_id = (*next_id, 0);
    *next_id += 1;

    xref.add_entry(stream_id.0, XrefEntry::Normal { offset: out.len() as u32, generation: 0 });
    xref.size = xref.max_id() + 1;
    fill_free_list(xref);

    let widths = [1usize, 4, 2];
    let mut data = Vec::with_capacity(xref.size as usize * (widths[0] + widths[1] + widths[2]));

    for num in 0..xref.size {
        let (kind, f2, f3): (u8, u32, u32) = match xref.get(num) {
            Some(XrefEntry::Normal { offset, generation }) => (1, *offset, *generation as u32),
            Some(XrefEntry::Compressed { container, index }) => (2, *container, *index as u32),
            Some(XrefEntry::Free { next, generation }) => (0, *next, *generation as u32),
            _ => (0, 0, 65535),
        };
        data.push(kind);
        data.extend_from_slice(&f2.to_be_bytes());
        data.extend_from_slice(&(f3 as u16).to_be_bytes());
    }

    let mut dict = trailer.clone();
    dict.set("Type", Object::from("XRef"));
    dict.set(
        "W",
        Object::Array(widths.iter().map(|&w| Object::Integer(w as i64)).collect()),
    );
    dict.set("Index", Object::Array(vec![Object::Integer(0), Object::Integer(xref.size as i64)]));
    dict.set("Size", Object::Integer(xref.size as i64));

    let stream = Stream::new(dict, data);
    object_writer::write_indirect(out, stream_id, &Object::Stream(stream));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Eol, EncryptionAlgorithm, EncryptionOptions};
    use crate::encryption::Permissions;

    fn sample_document() -> Document {
        let mut document = Document::new();
        let page = document.add_object(crate::dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        });
        let pages = document.add_object(crate::dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page)],
            "Count" => Object::Integer(1),
        });
        document.get_object_mut(page).unwrap().as_dict_mut().unwrap().set("Parent", Object::Reference(pages));
        let catalog = document.add_object(crate::dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages),
        });
        document.trailer.set("Root", Object::Reference(catalog));
        document
    }

    #[test]
    fn round_trips_through_classic_xref() {
        let document = sample_document();
        let bytes = serialize(&document, &SaveOptions::default()).unwrap();

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().unwrap().len(), 1);
    }

    #[test]
    fn round_trips_through_xref_stream() {
        let document = sample_document();
        let options = SaveOptions::builder().use_xref_streams(true).eol(Eol::Crlf).build();
        let bytes = serialize(&document, &options).unwrap();

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().unwrap().len(), 1);
    }

    #[test]
    fn round_trips_with_object_streams() {
        let document = sample_document();
        let options = SaveOptions::builder().use_object_streams(true).build();
        let bytes = serialize(&document, &options).unwrap();

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().unwrap().len(), 1);
    }

    #[test]
    fn round_trips_through_rc4_encryption() {
        let document = sample_document();
        let options = SaveOptions::builder()
            .encrypt_with(EncryptionOptions {
                algorithm: EncryptionAlgorithm::Aes128,
                permissions: Permissions::all(),
                user_password: "user-pw".to_string(),
                owner_password: "owner-pw".to_string(),
            })
            .build();
        let bytes = serialize(&document, &options).unwrap();

        let reloaded = Document::load_mem_with_password(&bytes, "user-pw").unwrap();
        assert_eq!(reloaded.get_pages().unwrap().len(), 1);
    }
}
