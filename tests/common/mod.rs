use pdfcore::{dictionary, Document, Object, Stream};

/// A minimal single-page document: Catalog -> Pages -> Page, with a
/// `/MediaBox` but no content stream.
pub fn single_page_document() -> Document {
    let mut document = Document::new();
    let page = document.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
    });
    let pages = document.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page)],
        "Count" => Object::Integer(1),
    });
    document.get_object_mut(page).unwrap().as_dict_mut().unwrap().set("Parent", Object::Reference(pages));
    let catalog = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages),
    });
    document.trailer.set("Root", Object::Reference(catalog));
    document
}

/// A one-page document whose page's `/Resources/XObject` holds two distinct
/// names pointing at two separate image XObjects with byte-identical
/// dictionaries and stream content (mirrors spec scenario S1).
pub fn document_with_duplicate_images() -> Document {
    let mut document = Document::new();

    let image_dict = |doc: &mut Document| {
        doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(32),
                "Height" => Object::Integer(32),
                "BitsPerComponent" => Object::Integer(8),
                "ColorSpace" => "DeviceRGB",
                "Filter" => "FlateDecode",
            },
            vec![0x78, 0x9c, 0x01, 0x02, 0x03],
        )))
    };

    let image_a = image_dict(&mut document);
    let image_b = image_dict(&mut document);

    let resources = dictionary! {
        "XObject" => Object::Dictionary(dictionary! {
            "Im1" => Object::Reference(image_a),
            "Im2" => Object::Reference(image_b),
        }),
    };

    let page = document.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        "Resources" => Object::Dictionary(resources),
    });
    let pages = document.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page)],
        "Count" => Object::Integer(1),
    });
    document.get_object_mut(page).unwrap().as_dict_mut().unwrap().set("Parent", Object::Reference(pages));
    let catalog = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages),
    });
    document.trailer.set("Root", Object::Reference(catalog));
    document
}

pub fn page_xobject_names(document: &Document, page_number: u32) -> Vec<pdfcore::ObjectId> {
    let pages = document.get_pages().unwrap();
    let page_id = pages[&page_number];
    let page_dict = document.get_dictionary(page_id).unwrap();
    let (_, resources) = document.dereference(page_dict.get(b"Resources").unwrap()).unwrap();
    let (_, xobjects) = document
        .dereference(resources.as_dict().unwrap().get(b"XObject").unwrap())
        .unwrap();
    xobjects
        .as_dict()
        .unwrap()
        .iter()
        .map(|(_, v)| v.as_reference().unwrap())
        .collect()
}
