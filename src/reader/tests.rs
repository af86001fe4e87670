use super::*;
use crate::Document;

/// Builds a tiny but complete five-object PDF (catalog, pages, one page, a
/// content stream, and a font) with a hand-computed classic xref table, so
/// reader tests don't depend on a checked-in binary fixture.
fn build_minimal_pdf() -> Vec<u8> {
    let mut body = String::from("%PDF-1.5\n");
    let mut offsets = vec![0usize; 6];

    let mut push_obj = |body: &mut String, offsets: &mut Vec<usize>, num: usize, contents: String| {
        offsets[num] = body.len();
        body.push_str(&format!("{num} 0 obj{contents}endobj\n"));
    };

    push_obj(&mut body, &mut offsets, 1, "<</Type/Catalog/Pages 2 0 R>>".to_string());
    push_obj(
        &mut body,
        &mut offsets,
        2,
        "<</Type/Pages/Kids[3 0 R]/Count 1>>".to_string(),
    );
    push_obj(
        &mut body,
        &mut offsets,
        3,
        "<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]/Contents 4 0 R/Resources<</Font<</F1 5 0 R>>>>>>"
            .to_string(),
    );

    let stream_data = "BT /F1 24 Tf 72 700 Td (Hello World!) Tj ET\n";
    push_obj(
        &mut body,
        &mut offsets,
        4,
        format!("<</Length {}>>stream\n{stream_data}endstream\n", stream_data.len()),
    );
    push_obj(
        &mut body,
        &mut offsets,
        5,
        "<</Type/Font/Subtype/Type1/BaseFont/Helvetica>>".to_string(),
    );

    let xref_offset = body.len();
    body.push_str("xref\n0 6\n0000000000 65535 f \n");
    for offset in offsets.iter().skip(1) {
        body.push_str(&format!("{offset:010} 00000 n \n"));
    }
    body.push_str("trailer\n<</Root 1 0 R/Size 6>>\nstartxref\n");
    body.push_str(&xref_offset.to_string());
    body.push_str("\n%%EOF");

    body.into_bytes()
}

#[test]
fn load_document() {
    let doc = Document::load_mem(&build_minimal_pdf()).unwrap();
    assert_eq!(doc.version, "1.5");
    assert_eq!(doc.get_pages().unwrap().len(), 1);
}

#[test]
fn saved_document_round_trips() {
    let mut doc = Document::load_mem(&build_minimal_pdf()).unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let file_path = temp_dir.path().join("test_2_load.pdf");
    doc.save(&file_path).unwrap();

    let reloaded = Document::load(&file_path).unwrap();
    assert_eq!(reloaded.get_pages().unwrap().len(), 1);
}

#[test]
#[should_panic(expected = "Xref(Start)")]
fn load_short_document() {
    let _doc = Document::load_mem(b"%PDF-1.5\n%%EOF\n").unwrap();
}

#[test]
fn load_document_with_preceding_bytes() {
    let mut content = Vec::new();
    content.extend(b"garbage");
    content.extend(build_minimal_pdf());
    let doc = Document::load_mem(&content).unwrap();
    assert_eq!(doc.version, "1.5");
}

#[test]
fn load_many_shallow_brackets() {
    let content: String = std::iter::repeat("()")
        .take(MAX_BRACKET * 10)
        .flat_map(|x| x.chars())
        .collect();
    const STREAM_CRUFT: usize = 33;
    let doc = format!(
        "%PDF-1.5
1 0 obj<</Type/Pages/Kids[5 0 R]/Count 1/Resources 3 0 R/MediaBox[0 0 595 842]>>endobj
2 0 obj<</Type/Font/Subtype/Type1/BaseFont/Courier>>endobj
3 0 obj<</Font<</F1 2 0 R>>>>endobj
5 0 obj<</Type/Page/Parent 1 0 R/Contents[4 0 R]>>endobj
6 0 obj<</Type/Catalog/Pages 1 0 R>>endobj
4 0 obj<</Length {}>>stream
BT
/F1 48 Tf
100 600 Td
({}) Tj
ET
endstream endobj\n",
        content.len() + STREAM_CRUFT,
        content
    );
    let doc = format!(
        "{}xref\n0 7\n0000000000 65535 f \n0000000009 00000 n \n0000000096 00000 n \n0000000155 00000 n \n0000000291 00000 n \n0000000191 00000 n \n0000000248 00000 n \ntrailer\n<</Root 6 0 R/Size 7>>\nstartxref\n{}\n%%EOF",
        doc,
        doc.len()
    );

    let _doc = Document::load_mem(doc.as_bytes()).unwrap();
}

#[test]
fn load_too_deep_brackets() {
    let content: Vec<u8> = std::iter::repeat(b'(')
        .take(MAX_BRACKET + 1)
        .chain(std::iter::repeat(b')').take(MAX_BRACKET + 1))
        .collect();
    let content = String::from_utf8(content).unwrap();
    const STREAM_CRUFT: usize = 33;
    let doc = format!(
        "%PDF-1.5
1 0 obj<</Type/Pages/Kids[5 0 R]/Count 1/Resources 3 0 R/MediaBox[0 0 595 842]>>endobj
2 0 obj<</Type/Font/Subtype/Type1/BaseFont/Courier>>endobj
3 0 obj<</Font<</F1 2 0 R>>>>endobj
5 0 obj<</Type/Page/Parent 1 0 R/Contents[7 0 R 4 0 R]>>endobj
6 0 obj<</Type/Catalog/Pages 1 0 R>>endobj
7 0 obj<</Length 45>>stream
BT /F1 48 Tf 100 600 Td (Hello World!) Tj ET
endstream
endobj
4 0 obj<</Length {}>>stream
BT
/F1 48 Tf
100 600 Td
({}) Tj
ET
endstream endobj\n",
        content.len() + STREAM_CRUFT,
        content
    );
    let doc = format!(
        "{}xref\n0 7\n0000000000 65535 f \n0000000009 00000 n \n0000000096 00000 n \n0000000155 00000 n \n0000000387 00000 n \n0000000191 00000 n \n0000000254 00000 n \n0000000297 00000 n \ntrailer\n<</Root 6 0 R/Size 7>>\nstartxref\n{}\n%%EOF",
        doc,
        doc.len()
    );

    // The second content stream's parenthesis nesting sits one level past
    // MAX_BRACKET; the parser must still recover the rest of the document
    // rather than abort the whole load.
    let doc = Document::load_mem(doc.as_bytes()).unwrap();
    let pages = doc.get_pages().unwrap();
    assert_eq!(pages.len(), 1);
    let page_id = *pages.values().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let contents = page.get(b"Contents").unwrap().as_array().unwrap();
    assert_eq!(contents.len(), 2);

    let first_stream_id = contents[0].as_reference().unwrap();
    let first_stream = doc.get_object(first_stream_id).unwrap().as_stream().unwrap();
    let decoded = first_stream.peek_decompressed().unwrap();
    assert!(String::from_utf8_lossy(&decoded).contains("Hello World!"));
}

#[test]
fn search_substring_finds_last_occurrence() {
    assert_eq!(Reader::search_substring(b"hello world", b"xyz", 0), None);
    assert_eq!(Reader::search_substring(b"hello world", b"world", 0), Some(6));

    let buffer = b"%%EOF\ntest%%EOF\nend";
    assert_eq!(Reader::search_substring(buffer, b"%%EOF", 0), Some(10));
    assert_eq!(Reader::search_substring(buffer, b"%%EOF", 6), Some(10));
    assert_eq!(Reader::search_substring(buffer, b"%%EOF", 15), None);
    assert_eq!(Reader::search_substring(b"%%EOF", b"%%EOF", 0), Some(0));

    let buffer_with_many_percents = b"%%%PDF-1.3%%%comment%%%more%%EOF";
    assert_eq!(
        Reader::search_substring(buffer_with_many_percents, b"%%EOF", 0),
        Some(27)
    );
}
