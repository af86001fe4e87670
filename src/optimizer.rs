//! Page-tree walk, font/image/info deduplication, and free-list maintenance
//! (§4.4). Runs once after a successful parse, or whenever the caller asks
//! for it again; never fails, degrading to a no-op substitution whenever a
//! fingerprint can't be computed.

use std::collections::{BTreeSet, HashMap};

use sha2::{Digest, Sha256};

use crate::dictionary::Dictionary;
use crate::document::Document;
use crate::object::{Object, ObjectId};
use crate::xref::XrefEntry;

/// Summary of one [`optimise`] pass, returned so callers can tell whether a
/// second pass is worth running again (it won't find anything new).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimisationReport {
    pub fonts_deduplicated: usize,
    pub images_deduplicated: usize,
    pub duplicate_info_removed: usize,
    pub objects_freed: usize,
}

pub fn optimise(document: &mut Document) -> OptimisationReport {
    let mut report = OptimisationReport::default();

    let owners = page_resource_owners(document);

    let mut font_classes: HashMap<Vec<u8>, Vec<ObjectId>> = HashMap::new();
    let mut image_classes: HashMap<Vec<u8>, Vec<ObjectId>> = HashMap::new();

    for &owner in &owners {
        for id in resource_members(document, owner, b"Font") {
            if let Some(fingerprint) = font_fingerprint(document, id) {
                font_classes.entry(fingerprint).or_default().push(id);
            }
        }
        for id in resource_members(document, owner, b"XObject") {
            if is_image_xobject(document, id) {
                if let Some(fingerprint) = image_fingerprint(document, id) {
                    image_classes.entry(fingerprint).or_default().push(id);
                }
            }
        }
    }

    let mut substitution: HashMap<ObjectId, ObjectId> = HashMap::new();
    report.fonts_deduplicated = fold_equivalence_classes(&font_classes, &mut substitution);
    report.images_deduplicated = fold_equivalence_classes(&image_classes, &mut substitution);
    report.duplicate_info_removed = dedupe_info(document, &mut substitution);

    if !substitution.is_empty() {
        for object in document.objects.values_mut() {
            rewrite_references(object, &substitution);
        }
        rewrite_references_dict(&mut document.trailer, &substitution);
    }

    report.objects_freed = sweep_unreferenced(document);
    document.reference_table.rebuild_free_list();

    report
}

/// Selects the lowest object number in each class as canonical and records a
/// substitution entry for every other member. Returns the number of objects
/// folded away.
fn fold_equivalence_classes(classes: &HashMap<Vec<u8>, Vec<ObjectId>>, substitution: &mut HashMap<ObjectId, ObjectId>) -> usize {
    let mut folded = 0;
    for members in classes.values() {
        let Some(&canonical) = members.iter().min() else { continue };
        for &member in members {
            if member != canonical {
                substitution.insert(member, canonical);
                folded += 1;
            }
        }
    }
    folded
}

/// The set of object ids whose `/Resources` entry (own or inherited through
/// `/Parent`) governs at least one leaf page. Ambiguous resource chains
/// (cycles, missing dictionaries) are silently skipped rather than failing
/// the whole pass.
fn page_resource_owners(document: &Document) -> Vec<ObjectId> {
    let mut owners = BTreeSet::new();
    for (_, page_id) in document.get_pages_lenient() {
        if let Some(owner) = resources_owner(document, page_id) {
            owners.insert(owner);
        }
    }
    owners.into_iter().collect()
}

fn resources_owner(document: &Document, mut id: ObjectId) -> Option<ObjectId> {
    let mut seen = BTreeSet::new();
    loop {
        if !seen.insert(id) {
            return None;
        }
        let dict = document.get_dictionary(id).ok()?;
        if dict.has(b"Resources") {
            return Some(id);
        }
        id = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
}

/// The object ids named under `/Resources/<key>` (e.g. `Font`, `XObject`) of
/// `owner`, looking through one level of indirection on `/Resources` itself
/// and on the subdictionary. Font and image objects are always indirect in
/// practice, so only `Object::Reference` entries are collected.
fn resource_members(document: &Document, owner: ObjectId, key: &[u8]) -> Vec<ObjectId> {
    let Ok(owner_dict) = document.get_dictionary(owner) else { return Vec::new() };
    let Ok(resources_obj) = owner_dict.get(b"Resources") else { return Vec::new() };
    let Some(resources_dict) = resolve_dict(document, resources_obj) else { return Vec::new() };
    let Ok(sub_obj) = resources_dict.get(key) else { return Vec::new() };
    let Some(sub_dict) = resolve_dict(document, sub_obj) else { return Vec::new() };
    sub_dict.iter().filter_map(|(_, value)| value.as_reference().ok()).collect()
}

fn resolve_dict<'a>(document: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    document.dereference(obj).ok()?.1.as_dict().ok()
}

fn is_image_xobject(document: &Document, id: ObjectId) -> bool {
    document
        .get_dictionary(id)
        .map(|d| {
            d.has_type(b"XObject") && d.get(b"Subtype").and_then(Object::as_name).map(|s| s == b"Image").unwrap_or(false)
        })
        .unwrap_or(false)
}

/// Fingerprint from `(BaseFont, embedded FontFile content hash, Subtype,
/// Encoding identity)`. Missing `BaseFont`/`Subtype` makes the font
/// unfingerprintable rather than an error; it simply never joins a class.
fn font_fingerprint(document: &Document, id: ObjectId) -> Option<Vec<u8>> {
    let dict = document.get_dictionary(id).ok()?;
    if !dict.has_type(b"Font") {
        return None;
    }
    let base_font = dict.get(b"BaseFont").and_then(Object::as_name).ok()?.to_vec();
    let subtype = dict.get(b"Subtype").and_then(Object::as_name).ok()?.to_vec();
    let encoding_identity = match dict.get(b"Encoding") {
        Ok(Object::Name(n)) => n.clone(),
        Ok(Object::Reference(r)) => format!("ref:{}:{}", r.0, r.1).into_bytes(),
        _ => Vec::new(),
    };

    let mut hasher = Sha256::new();
    hasher.update(&base_font);
    hasher.update(&subtype);
    hasher.update(&encoding_identity);
    if let Some(font_file_hash) = font_descriptor_file_hash(document, dict) {
        hasher.update(font_file_hash);
    }
    Some(hasher.finalize().to_vec())
}

fn font_descriptor_file_hash(document: &Document, dict: &Dictionary) -> Option<Vec<u8>> {
    let fd_ref = dict.get(b"FontDescriptor").and_then(Object::as_reference).ok()?;
    let descriptor = document.get_dictionary(fd_ref).ok()?;
    let font_file_id = [b"FontFile".as_slice(), b"FontFile2", b"FontFile3"]
        .iter()
        .find_map(|key| descriptor.get(key).and_then(Object::as_reference).ok())?;
    let stream = document.get_object(font_file_id).ok()?.as_stream().ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&stream.content);
    Some(hasher.finalize().to_vec())
}

/// Fingerprint from `(width, height, bits-per-component, colourspace
/// identity, raw stream bytes hash)`. Operates on the on-disk (still
/// filtered) bytes, so two streams using different filters for the same
/// pixels won't collapse — an acceptable conservative miss.
fn image_fingerprint(document: &Document, id: ObjectId) -> Option<Vec<u8>> {
    let stream = document.get_object(id).ok()?.as_stream().ok()?;
    let dict = &stream.dict;
    let width = dict.get(b"Width").and_then(Object::as_i64).ok()?;
    let height = dict.get(b"Height").and_then(Object::as_i64).ok()?;
    let bits_per_component = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
    let colorspace = colorspace_identity(dict);

    let mut hasher = Sha256::new();
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    hasher.update(bits_per_component.to_le_bytes());
    hasher.update(&colorspace);
    hasher.update(&stream.content);
    Some(hasher.finalize().to_vec())
}

fn colorspace_identity(dict: &Dictionary) -> Vec<u8> {
    match dict.get(b"ColorSpace") {
        Ok(Object::Name(n)) => n.clone(),
        Ok(Object::Reference(r)) => format!("ref:{}:{}", r.0, r.1).into_bytes(),
        Ok(Object::Array(items)) => {
            let mut out = Vec::new();
            for item in items {
                match item {
                    Object::Name(n) => out.extend_from_slice(n),
                    Object::Reference(r) => out.extend_from_slice(format!("ref:{}:{}", r.0, r.1).as_bytes()),
                    _ => {}
                }
                out.push(b':');
            }
            out
        }
        _ => Vec::new(),
    }
}

/// Folds every other info dictionary whose content is byte-identical to the
/// trailer's own `/Info` into that canonical object. Deliberately
/// conservative: dictionaries are only merged on exact content equality, so
/// this never mistakes an unrelated dictionary for a duplicate.
fn dedupe_info(document: &Document, substitution: &mut HashMap<ObjectId, ObjectId>) -> usize {
    let Ok(info_id) = document.trailer.get(b"Info").and_then(Object::as_reference) else {
        return 0;
    };
    let Some(canonical) = document.objects.get(&info_id).and_then(|o| o.as_dict().ok()) else {
        return 0;
    };
    let canonical = canonical.clone();

    let duplicates: Vec<ObjectId> = document
        .objects
        .iter()
        .filter(|&(&id, _)| id != info_id)
        .filter_map(|(&id, object)| (object.as_dict().ok() == Some(&canonical)).then_some(id))
        .collect();

    for &dup in &duplicates {
        substitution.insert(dup, info_id);
    }
    duplicates.len()
}

fn rewrite_references(object: &mut Object, substitution: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(&canonical) = substitution.get(id) {
                *id = canonical;
            }
        }
        Object::Array(items) => {
            for item in items {
                rewrite_references(item, substitution);
            }
        }
        Object::Dictionary(dict) => rewrite_references_dict(dict, substitution),
        Object::Stream(stream) => rewrite_references_dict(&mut stream.dict, substitution),
        _ => {}
    }
}

fn rewrite_references_dict(dict: &mut Dictionary, substitution: &HashMap<ObjectId, ObjectId>) {
    for (_, value) in dict.iter_mut() {
        rewrite_references(value, substitution);
    }
}

/// Object numbers in-use but unreachable from the trailer (catalog, info,
/// any other trailer-declared object) after substitution, per the §4.4
/// redundancy sweep. These are removed from the object table and marked
/// free; the caller still has to rebuild the free list afterwards.
fn sweep_unreferenced(document: &mut Document) -> usize {
    let reachable = reachable_set(document);
    let to_free: Vec<ObjectId> = document.objects.keys().copied().filter(|id| !reachable.contains(id)).collect();

    for id in &to_free {
        document.objects.remove(id);
        document.reference_table.add_entry(id.0, XrefEntry::UnusableFree);
    }

    to_free.len()
}

/// The set of object ids transitively reachable from the trailer dictionary.
/// Used both by the redundancy sweep and exposed (via [`optimise`]'s public
/// callers) as the testable "reachable == in-use" property.
pub fn reachable_set(document: &Document) -> BTreeSet<ObjectId> {
    let mut seen = BTreeSet::new();
    let mut stack = trailer_roots(&document.trailer);

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Ok(object) = document.get_object(id) {
            collect_references(object, &mut stack);
        }
    }
    seen
}

fn trailer_roots(trailer: &Dictionary) -> Vec<ObjectId> {
    let mut roots = Vec::new();
    for (_, value) in trailer.iter() {
        collect_references(value, &mut roots);
    }
    roots
}

fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|item| collect_references(item, out)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, v)| collect_references(v, out)),
        Object::Stream(stream) => stream.dict.iter().for_each(|(_, v)| collect_references(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Stream;

    fn duplicate_image_document() -> Document {
        let mut document = Document::new();

        let image_dict = || {
            crate::dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(32),
                "Height" => Object::Integer(32),
                "BitsPerComponent" => Object::Integer(8),
                "ColorSpace" => "DeviceRGB",
            }
        };
        let image_a = document.add_object(Object::Stream(Stream::new(image_dict(), vec![0xAB; 1024])));
        let image_b = document.add_object(Object::Stream(Stream::new(image_dict(), vec![0xAB; 1024])));

        let resources = crate::dictionary! {
            "XObject" => Object::Dictionary(crate::dictionary! {
                "Im0" => Object::Reference(image_a),
                "Im1" => Object::Reference(image_b),
            }),
        };
        let page = document.add_object(crate::dictionary! {
            "Type" => "Page",
            "Resources" => Object::Dictionary(resources),
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
    fn collapses_duplicate_image_xobjects() {
        let mut document = duplicate_image_document();
        let report = optimise(&mut document);
        assert_eq!(report.images_deduplicated, 1);

        let page_id = document.get_pages().unwrap()[&1];
        let page_dict = document.get_dictionary(page_id).unwrap();
        let resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();

        let im0 = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
        let im1 = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
        assert_eq!(im0, im1);
        assert_eq!(report.objects_freed, 1);
    }

    #[test]
    fn optimise_is_idempotent() {
        let mut document = duplicate_image_document();
        optimise(&mut document);
        let second = optimise(&mut document);
        assert_eq!(second.images_deduplicated, 0);
        assert_eq!(second.fonts_deduplicated, 0);
        assert_eq!(second.objects_freed, 0);
    }

    #[test]
    fn reachable_set_matches_in_use_objects_after_optimise() {
        let mut document = duplicate_image_document();
        optimise(&mut document);

        let reachable = reachable_set(&document);
        let in_use: BTreeSet<ObjectId> = document.objects.keys().copied().collect();
        assert_eq!(reachable, in_use);
    }
}
