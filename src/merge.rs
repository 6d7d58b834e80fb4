//! PDF assembly: concatenating document parts in plan order.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the assembly merger, naming the part that failed.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("no parts to merge")]
    Empty,

    #[error("failed to load part `{part}`: {message}")]
    LoadPart { part: String, message: String },

    #[error("part `{part}` contains no pages")]
    NoPages { part: String },

    #[error("failed to serialize merged document: {0}")]
    Save(String),
}

/// One part of the assembly plan: rendered bytes or an on-disk artifact.
#[derive(Debug, Clone)]
pub enum PdfPart {
    Bytes { label: String, data: Vec<u8> },
    File(PathBuf),
}

impl PdfPart {
    pub fn bytes(label: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Bytes { label: label.into(), data }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Human-readable identifier used in merge errors.
    pub fn label(&self) -> String {
        match self {
            Self::Bytes { label, .. } => label.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }

    fn load(&self) -> Result<Document, MergeError> {
        let result = match self {
            Self::Bytes { data, .. } => Document::load_mem(data),
            Self::File(path) => Document::load(path),
        };
        result.map_err(|e| MergeError::LoadPart {
            part: self.label(),
            message: e.to_string(),
        })
    }
}

/// Capability interface for PDF concatenation, so tests can substitute a
/// failing or recording backend.
pub trait MergeBackend: Send + Sync {
    /// Concatenate `parts` into one document.
    ///
    /// Output page order equals input part order; no part's internal page
    /// order is altered.
    fn merge(&self, parts: &[PdfPart]) -> Result<Vec<u8>, MergeError>;
}

/// Structural merger built on lopdf.
pub struct LopdfMerger;

impl MergeBackend for LopdfMerger {
    fn merge(&self, parts: &[PdfPart]) -> Result<Vec<u8>, MergeError> {
        if parts.is_empty() {
            return Err(MergeError::Empty);
        }

        let mut max_id: u32 = 1;
        // Page ids in plan order; the Kids array is built from this, never
        // from map iteration order.
        let mut ordered_pages: Vec<(ObjectId, Object)> = Vec::new();
        let mut carried_objects: Vec<(ObjectId, Object)> = Vec::new();

        for part in parts {
            let mut doc = part.load()?;
            doc.renumber_objects_with(max_id);
            max_id = doc.max_id + 1;

            let source_pages = doc.get_pages();
            if source_pages.is_empty() {
                return Err(MergeError::NoPages { part: part.label() });
            }
            for &page_id in source_pages.values() {
                if let Ok(page_obj) = doc.get_object(page_id) {
                    ordered_pages.push((page_id, page_obj.clone()));
                }
            }

            for (object_id, object) in doc.objects {
                match object.type_name().unwrap_or("") {
                    "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                    _ => carried_objects.push((object_id, object)),
                }
            }
        }

        let mut document = Document::with_version("1.5");
        for (object_id, object) in carried_objects {
            document.objects.insert(object_id, object);
        }

        // Allocate above every carried id; a fresh document starts at zero
        // and would otherwise hand back ids the parts already occupy.
        document.max_id = max_id;
        let pages_id = document.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(ordered_pages.len());
        for (page_id, object) in &ordered_pages {
            if let Object::Dictionary(dict) = object {
                let mut page_dict = dict.clone();
                page_dict.set("Parent", Object::Reference(pages_id));
                document
                    .objects
                    .insert(*page_id, Object::Dictionary(page_dict));
                kids.push(Object::Reference(*page_id));
            }
        }

        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(ordered_pages.len() as i64)),
        ]);
        document
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = document.new_object_id();
        let catalog_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        document
            .objects
            .insert(catalog_id, Object::Dictionary(catalog_dict));

        document.trailer.set("Root", Object::Reference(catalog_id));
        document.max_id = document.objects.len() as u32;
        document.renumber_objects();
        document.compress();

        let mut output = Vec::new();
        document
            .save_to(&mut output)
            .map_err(|e| MergeError::Save(e.to_string()))?;

        Ok(output)
    }
}

/// Number of pages in a serialized PDF. Used for summaries and tests.
pub fn page_count(pdf: &[u8]) -> Result<usize, MergeError> {
    let doc = Document::load_mem(pdf).map_err(|e| MergeError::LoadPart {
        part: "merged output".to_string(),
        message: e.to_string(),
    })?;
    Ok(doc.get_pages().len())
}

/// Build a minimal one-page PDF whose page shows `text`.
#[cfg(test)]
pub(crate) fn test_pdf_bytes(text: &str) -> Vec<u8> {
    use lopdf::Stream;
    use lopdf::content::{Content, Operation};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().expect("encode content stream"),
    ));

    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
    ]));

    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ("Count", Object::Integer(1)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save test pdf");
    bytes
}

/// Text of every page of a serialized PDF, in page order.
#[cfg(test)]
pub(crate) fn page_texts(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("load merged pdf");
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    page_numbers
        .into_iter()
        .map(|n| doc.extract_text(&[n]).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_preserves_part_order() {
        let parts = vec![
            PdfPart::bytes("a", test_pdf_bytes("ALPHA")),
            PdfPart::bytes("b", test_pdf_bytes("BRAVO")),
            PdfPart::bytes("c", test_pdf_bytes("CHARLIE")),
        ];

        let merged = LopdfMerger.merge(&parts).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 3);

        let texts = page_texts(&merged);
        assert!(texts[0].contains("ALPHA"));
        assert!(texts[1].contains("BRAVO"));
        assert!(texts[2].contains("CHARLIE"));
    }

    #[test]
    fn test_merge_mixed_bytes_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = dir.path().join("part.pdf");
        std::fs::write(&on_disk, test_pdf_bytes("DISK")).unwrap();

        let parts = vec![
            PdfPart::bytes("mem", test_pdf_bytes("MEM")),
            PdfPart::file(&on_disk),
        ];

        let merged = LopdfMerger.merge(&parts).unwrap();
        let texts = page_texts(&merged);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("MEM"));
        assert!(texts[1].contains("DISK"));
    }

    #[test]
    fn test_merge_keeps_part_resources_resolvable() {
        // The rebuilt Pages/Catalog ids must not land on carried objects,
        // or a page's font reference dereferences to the wrong dictionary.
        let parts = vec![
            PdfPart::bytes("a", test_pdf_bytes("ONE")),
            PdfPart::bytes("b", test_pdf_bytes("TWO")),
        ];
        let merged = LopdfMerger.merge(&parts).unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        for page_id in doc.get_pages().values() {
            let page = doc.get_object(*page_id).and_then(Object::as_dict).unwrap();
            let resources = match page.get(b"Resources").unwrap() {
                Object::Reference(id) => doc.get_object(*id).and_then(Object::as_dict).unwrap(),
                Object::Dictionary(dict) => dict,
                other => panic!("unexpected resources object: {other:?}"),
            };
            let fonts = resources.get(b"Font").and_then(Object::as_dict).unwrap();
            for (_, font) in fonts.iter() {
                let font = match font {
                    Object::Reference(id) => doc.get_object(*id).unwrap(),
                    other => other,
                };
                assert_eq!(font.type_name().unwrap(), "Font");
            }
        }
    }

    #[test]
    fn test_merge_single_part() {
        let merged = LopdfMerger
            .merge(&[PdfPart::bytes("only", test_pdf_bytes("SOLO"))])
            .unwrap();
        assert_eq!(page_count(&merged).unwrap(), 1);
    }

    #[test]
    fn test_merge_empty_plan() {
        assert!(matches!(LopdfMerger.merge(&[]), Err(MergeError::Empty)));
    }

    #[test]
    fn test_merge_error_names_failing_part() {
        let parts = vec![
            PdfPart::bytes("good", test_pdf_bytes("OK")),
            PdfPart::bytes("broken", b"not a pdf".to_vec()),
        ];
        let err = LopdfMerger.merge(&parts).unwrap_err();
        match err {
            MergeError::LoadPart { part, .. } => assert_eq!(part, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_missing_file_part() {
        let err = LopdfMerger
            .merge(&[PdfPart::file("/nonexistent/artifact.pdf")])
            .unwrap_err();
        assert!(matches!(err, MergeError::LoadPart { .. }));
    }
}
