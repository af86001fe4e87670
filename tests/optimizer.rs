mod common;

use pdfcore::Document;

/// S1: two resource names pointing at byte-identical image XObjects collapse
/// onto a single object number after optimise, and the output is smaller.
#[test]
fn collapses_duplicate_image_xobjects_and_shrinks_output() {
    let mut document = common::document_with_duplicate_images();

    let mut unoptimised_bytes = Vec::new();
    document.save_to(&mut unoptimised_bytes).unwrap();

    let names_before = common::page_xobject_names(&document, 1);
    assert_ne!(names_before[0], names_before[1]);

    let report = document.optimise();
    assert_eq!(report.images_deduplicated, 1);

    let names_after = common::page_xobject_names(&document, 1);
    assert_eq!(names_after[0], names_after[1]);

    let mut optimised_bytes = Vec::new();
    document.save_to(&mut optimised_bytes).unwrap();
    assert!(optimised_bytes.len() < unoptimised_bytes.len());
}

/// Property 5: a second optimise pass over an already-optimised document
/// reports no further deduplication.
#[test]
fn optimise_is_idempotent() {
    let mut document = common::document_with_duplicate_images();

    let first = document.optimise();
    assert_eq!(first.images_deduplicated, 1);

    let second = document.optimise();
    assert_eq!(second.images_deduplicated, 0);
    assert_eq!(second.fonts_deduplicated, 0);
    assert_eq!(second.duplicate_info_removed, 0);
    assert_eq!(second.objects_freed, 0);
}

/// Property 2: after optimise, every object number still in the document's
/// object table is reachable from the catalog by walking Pages -> page ->
/// its own resources (nothing orphaned is left sitting in the table).
#[test]
fn optimise_leaves_no_unreferenced_duplicate_behind() {
    let mut document = common::document_with_duplicate_images();
    document.optimise();

    let names_after = common::page_xobject_names(&document, 1);
    let canonical = names_after[0];
    assert_eq!(names_after[1], canonical);

    // The non-canonical duplicate must no longer be present in the object
    // table at all: it was swept as unreferenced once every reference to it
    // was rewritten to the canonical id.
    let surviving_image_objects = document
        .objects
        .iter()
        .filter(|(_, object)| {
            object
                .as_dict()
                .ok()
                .and_then(|d| d.get(b"Subtype").ok())
                .and_then(|s| s.as_name().ok())
                .map(|n| n == b"Image")
                .unwrap_or(false)
        })
        .count();
    assert_eq!(surviving_image_objects, 1);
}
