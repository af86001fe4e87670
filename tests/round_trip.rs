mod common;

use pdfcore::{Document, Eol, Object, SaveOptions};

/// Property 1: read -> write with default config preserves page count.
#[test]
fn page_count_survives_default_round_trip() {
    let mut document = common::single_page_document();
    let page_count_before = document.get_pages().unwrap().len();

    let mut buffer = Vec::new();
    document.save_to(&mut buffer).unwrap();
    let reloaded = Document::load_mem(&buffer).unwrap();

    assert_eq!(reloaded.get_pages().unwrap().len(), page_count_before);
}

/// Property 1 + S2: a classic xref and an xref-stream encoding of the same
/// document parse back to the same page count, and disabling xref streams
/// produces output with no XRefStm in the trailer.
#[test]
fn classic_and_stream_xref_encodings_agree_on_page_count() {
    let mut document = common::single_page_document();

    let mut classic_bytes = Vec::new();
    document.save_to(&mut classic_bytes).unwrap();

    let mut stream_bytes = Vec::new();
    let stream_options = SaveOptions::builder().use_xref_streams(true).eol(Eol::Crlf).build();
    document.save_with_options(&mut stream_bytes, stream_options).unwrap();

    let reloaded_classic = Document::load_mem(&classic_bytes).unwrap();
    let reloaded_stream = Document::load_mem(&stream_bytes).unwrap();
    assert_eq!(reloaded_classic.get_pages().unwrap().len(), reloaded_stream.get_pages().unwrap().len());

    assert!(!classic_bytes.windows(b"XRefStm".len()).any(|w| w == b"XRefStm"));
}

/// S6: packing 150 non-stream objects yields exactly two object streams
/// (100 + 50 entries), and every packed object resolves back correctly.
#[test]
fn object_stream_packing_splits_at_capacity() {
    let mut document = Document::new();
    let mut ids = Vec::new();
    for i in 0..150 {
        let id = document.add_object(pdfcore::dictionary! {
            "Type" => "Dummy",
            "Index" => Object::Integer(i as i64),
        });
        ids.push(id);
    }
    // Anchor the objects to the catalog so they aren't swept as unreferenced
    // by anything downstream that walks reachability from the trailer.
    let array = ids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>();
    let catalog = document.add_object(pdfcore::dictionary! {
        "Type" => "Catalog",
        "Dummies" => array,
    });
    document.trailer.set("Root", Object::Reference(catalog));

    let mut buffer = Vec::new();
    let options = SaveOptions::builder().use_object_streams(true).build();
    document.save_with_options(&mut buffer, options).unwrap();

    let object_stream_count = count_occurrences(&buffer, b"/Type /ObjStm") + count_occurrences(&buffer, b"/Type/ObjStm");
    assert_eq!(object_stream_count, 2);

    let reloaded = Document::load_mem(&buffer).unwrap();
    let root = reloaded.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog_dict = reloaded.get_dictionary(root).unwrap();
    let dummies = catalog_dict.get(b"Dummies").unwrap().as_array().unwrap();
    assert_eq!(dummies.len(), 150);
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() || haystack.len() < needle.len() {
        return 0;
    }
    (0..=haystack.len() - needle.len()).filter(|&i| &haystack[i..i + needle.len()] == needle).count()
}
