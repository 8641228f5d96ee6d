// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF merger — concatenates the pages of several PDFs, in submission order,
// into one new document using the `lopdf` crate.

use std::collections::HashMap;

use filewerk_core::TransformConfig;
use filewerk_core::error::{FilewerkError, Result};
use filewerk_core::types::{InputFile, OutputFile};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on page-tree depth when walking `/Parent` links.
const MAX_TREE_DEPTH: usize = 64;

/// Merges PDFs into a single document.
pub struct PdfMerger {
    /// File name given to the merged document.
    output_name: String,
}

impl PdfMerger {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            output_name: config.merged_output_name.clone(),
        }
    }

    /// Merge `files` in order: every page of the first document, then every
    /// page of the second, and so on.
    ///
    /// All inputs are loaded before the output is built, so an invalid file
    /// fails the whole merge and nothing is produced.
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn merge(&self, files: &[InputFile]) -> Result<OutputFile> {
        if files.is_empty() {
            return Err(FilewerkError::NoInput("PDF merging"));
        }

        let sources = files
            .iter()
            .enumerate()
            .map(|(idx, file)| {
                Document::load_mem(&file.bytes).map_err(|err| FilewerkError::Load {
                    index: idx + 1,
                    file: file.name.clone(),
                    detail: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (mut merged, pages_id) = empty_document();
        let mut total_pages = 0usize;

        for (source, file) in sources.iter().zip(files) {
            let mut copier = PageCopier::new(source, &mut merged, pages_id);
            // get_pages is keyed by 1-based page number, so iteration is in page order.
            for page_id in source.get_pages().into_values() {
                copier.copy_page(page_id)?;
            }
            let copied = copier.pages_copied;
            total_pages += copied;
            debug!(file = %file.name, pages = copied, "Document appended");
        }

        let mut output = Vec::new();
        merged.save_to(&mut output).map_err(|err| {
            FilewerkError::Pdf(format!("failed to serialise merged PDF: {}", err))
        })?;

        info!(
            documents = files.len(),
            pages = total_pages,
            output_bytes = output.len(),
            "Merge complete"
        );
        Ok(OutputFile::new(self.output_name.clone(), output))
    }

    /// [`PdfMerger::merge`] on a blocking worker.
    pub async fn merge_async(&self, files: Vec<InputFile>) -> Result<OutputFile> {
        let merger = Self {
            output_name: self.output_name.clone(),
        };
        tokio::task::spawn_blocking(move || merger.merge(&files))
            .await
            .map_err(|err| FilewerkError::Task(format!("PDF merge worker: {err}")))?
    }
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new(&TransformConfig::default())
    }
}

/// Number of pages in a serialised PDF.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    let document = Document::load_mem(bytes)
        .map_err(|err| FilewerkError::Pdf(format!("failed to load PDF: {}", err)))?;
    Ok(document.get_pages().len())
}

/// A new document holding a catalog and an empty page tree. Returns the
/// document and the id of its `/Pages` node.
fn empty_document() -> (Document, ObjectId) {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(Vec::new()));
    pages.set("Count", Object::Integer(0));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));

    doc.trailer.set("Root", Object::Reference(catalog_id));
    (doc, pages_id)
}

/// Copies pages of one source document into the merged document.
///
/// Indirect objects are copied at most once per source; the id map also
/// breaks reference cycles such as an annotation's `/P` pointing back at its
/// page.
struct PageCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    pages_id: ObjectId,
    copied: HashMap<ObjectId, ObjectId>,
    pages_copied: usize,
}

impl<'a> PageCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document, pages_id: ObjectId) -> Self {
        Self {
            source,
            target,
            pages_id,
            copied: HashMap::new(),
            pages_copied: 0,
        }
    }

    /// Append a copy of `page_id` as the last page of the target.
    fn copy_page(&mut self, page_id: ObjectId) -> Result<()> {
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            FilewerkError::Pdf(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        // The page may already have been copied as the target of a link or
        // annotation on an earlier page; reuse that id so links stay intact.
        let new_id = match self.copied.get(&page_id) {
            Some(&id) => id,
            None => {
                let id = self.target.new_object_id();
                self.copied.insert(page_id, id);
                id
            }
        };

        let mut cloned = self.copy_entries(page, true);
        for key in INHERITABLE_KEYS {
            if cloned.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page, key) {
                let value = self.copy_object(value);
                cloned.set(key.to_vec(), value);
            }
        }
        cloned.set("Parent", Object::Reference(self.pages_id));
        self.target.objects.insert(new_id, Object::Dictionary(cloned));

        let pages = self
            .target
            .get_object_mut(self.pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| FilewerkError::Pdf(format!("merged page tree missing: {}", err)))?;
        if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
            kids.push(Object::Reference(new_id));
        }
        if let Ok(Object::Integer(count)) = pages.get_mut(b"Count") {
            *count += 1;
        }

        self.pages_copied += 1;
        Ok(())
    }

    /// Copy an indirect object, returning its id in the target.
    fn copy_reference(&mut self, id: ObjectId) -> ObjectId {
        if let Some(&new_id) = self.copied.get(&id) {
            return new_id;
        }

        let new_id = self.target.new_object_id();
        self.copied.insert(id, new_id);

        let source = self.source;
        let cloned = match source.get_object(id) {
            Ok(object) => self.copy_object(object),
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        };
        self.target.objects.insert(new_id, cloned);
        new_id
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.copy_reference(*id)),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_object(item)).collect())
            }
            Object::Stream(stream) => {
                let mut cloned = stream.clone();
                cloned.dict = self.copy_dictionary(&stream.dict);
                Object::Stream(cloned)
            }
            other => other.clone(),
        }
    }

    /// Copy a dictionary. Page and page-tree nodes lose their `/Parent`
    /// link since the target's page tree is rebuilt rather than copied; any
    /// other `/Parent` (form field hierarchy, outline items) is kept.
    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        self.copy_entries(dict, is_page_tree_node(dict))
    }

    fn copy_entries(&mut self, dict: &Dictionary, skip_parent: bool) -> Dictionary {
        let mut cloned = Dictionary::new();
        for (key, value) in dict.iter() {
            if skip_parent && key == b"Parent" {
                continue;
            }
            let value = self.copy_object(value);
            cloned.set(key.clone(), value);
        }
        cloned
    }
}

fn is_page_tree_node(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Page" || name == b"Pages")
}

/// Look `key` up on the ancestors of `page` in the source page tree.
fn inherited_attribute<'d>(source: &'d Document, page: &'d Dictionary, key: &[u8]) -> Option<&'d Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = source.get_dictionary(parent_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;

    /// Build a PDF with `num_pages` pages whose content streams read
    /// `<prefix>-Page-<n>`.
    fn create_test_pdf(num_pages: u32, prefix: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for page_num in 1..=num_pages {
            let content = format!("BT /F1 12 Tf 50 700 Td ({}-Page-{}) Tj ET", prefix, page_num);
            let content_id =
                doc.add_object(Object::Stream(Stream::new(Dictionary::new(), content.into_bytes())));

            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("Contents", Object::Reference(content_id));
            kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
        }

        // MediaBox lives on the tree root and is inherited by every page.
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(num_pages as i64));
        pages.set("Kids", Object::Array(kids));
        pages.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn page_texts(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .into_values()
            .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn merge_preserves_page_order() {
        let files = vec![
            InputFile::new("a.pdf", create_test_pdf(2, "A")),
            InputFile::new("b.pdf", create_test_pdf(3, "B")),
        ];
        let output = PdfMerger::default().merge(&files).unwrap();

        assert_eq!(output.name, "Class Schedule.pdf");
        assert_eq!(page_count(&output.bytes).unwrap(), 5);

        let texts = page_texts(&output.bytes);
        let expected = ["A-Page-1", "A-Page-2", "B-Page-1", "B-Page-2", "B-Page-3"];
        for (text, marker) in texts.iter().zip(expected) {
            assert!(text.contains(marker), "expected {marker} in {text}");
        }
    }

    #[test]
    fn single_document_round_trips() {
        let files = vec![InputFile::new("only.pdf", create_test_pdf(4, "S"))];
        let output = PdfMerger::default().merge(&files).unwrap();
        assert_eq!(page_count(&output.bytes).unwrap(), 4);
    }

    #[test]
    fn inherited_media_box_is_copied_onto_pages() {
        let files = vec![InputFile::new("a.pdf", create_test_pdf(1, "A"))];
        let output = PdfMerger::default().merge(&files).unwrap();

        let doc = Document::load_mem(&output.bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
    }

    /// One page carrying a text-field widget whose `/Parent` is the field.
    fn create_form_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        let field_id = doc.new_object_id();

        let mut widget = Dictionary::new();
        widget.set("Type", Object::Name(b"Annot".to_vec()));
        widget.set("Subtype", Object::Name(b"Widget".to_vec()));
        widget.set("Parent", Object::Reference(field_id));
        widget.set("P", Object::Reference(page_id));
        let widget_id = doc.add_object(Object::Dictionary(widget));

        let mut field = Dictionary::new();
        field.set("FT", Object::Name(b"Tx".to_vec()));
        field.set("T", Object::string_literal("attendee"));
        field.set("Kids", Object::Array(vec![Object::Reference(widget_id)]));
        doc.objects.insert(field_id, Object::Dictionary(field));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Annots", Object::Array(vec![Object::Reference(widget_id)]));
        doc.objects.insert(page_id, Object::Dictionary(page));

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(1));
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn widget_keeps_its_field_parent() {
        let files = vec![
            InputFile::new("a.pdf", create_test_pdf(1, "A")),
            InputFile::new("form.pdf", create_form_pdf()),
        ];
        let output = PdfMerger::default().merge(&files).unwrap();

        let doc = Document::load_mem(&output.bytes).unwrap();
        let pages = doc.get_pages();
        let page_id = *pages.get(&2).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();

        // The page hangs off the merged tree, not the source one.
        let tree_id = page.get(b"Parent").unwrap().as_reference().unwrap();
        assert_eq!(doc.get_dictionary(tree_id).unwrap().get(b"Count").unwrap().as_i64().unwrap(), 2);

        let annots = page.get(b"Annots").unwrap().as_array().unwrap();
        let widget_id = annots[0].as_reference().unwrap();
        let widget = doc.get_dictionary(widget_id).unwrap();
        assert_eq!(widget.get(b"P").unwrap().as_reference().unwrap(), page_id);

        let field_id = widget.get(b"Parent").unwrap().as_reference().unwrap();
        let field = doc.get_dictionary(field_id).unwrap();
        assert_eq!(field.get(b"T").unwrap().as_str().unwrap(), b"attendee");
        let kids = field.get(b"Kids").unwrap().as_array().unwrap();
        assert_eq!(kids[0].as_reference().unwrap(), widget_id);
    }

    #[test]
    fn invalid_input_names_the_file() {
        let files = vec![
            InputFile::new("good.pdf", create_test_pdf(1, "A")),
            InputFile::new("notes.pdf", b"this is not a pdf".to_vec()),
        ];
        match PdfMerger::default().merge(&files) {
            Err(FilewerkError::Load { index, file, .. }) => {
                assert_eq!(index, 2);
                assert_eq!(file, "notes.pdf");
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            PdfMerger::default().merge(&[]),
            Err(FilewerkError::NoInput(_))
        ));
    }

    #[tokio::test]
    async fn merge_async_matches_merge() {
        let files = vec![
            InputFile::new("a.pdf", create_test_pdf(1, "A")),
            InputFile::new("b.pdf", create_test_pdf(2, "B")),
        ];
        let output = PdfMerger::default().merge_async(files).await.unwrap();
        assert_eq!(page_count(&output.bytes).unwrap(), 3);
    }
}
