//! PDF codec collaborator
//!
//! The engine never touches PDF bytes. It talks to a [`PdfCodec`], which
//! decodes sources, copies pages into new documents, stores rotations and
//! serializes the result. [`LopdfCodec`] is the lopdf-backed implementation.

use crate::error::PdfToolsError;
use crate::images::{PageImage, PixelColor};
use crate::model::{Document, Rotation};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree we are willing to walk when resolving inheritance
const MAX_TREE_DEPTH: usize = 64;

pub trait PdfCodec {
    type Handle;

    /// Decode raw bytes into a handle
    fn load(&self, bytes: &[u8]) -> Result<Self::Handle, PdfToolsError>;

    /// Start an empty document
    fn create(&self) -> Self::Handle;

    fn page_count(&self, handle: &Self::Handle) -> usize;

    /// Rotation stored in the document for the zero-based page `index`
    fn rotation(&self, handle: &Self::Handle, index: u32) -> Result<Rotation, PdfToolsError>;

    /// Copy page `index` of `source` to the end of `dest`; returns its new index
    fn copy_page(
        &self,
        dest: &mut Self::Handle,
        source: &Self::Handle,
        index: u32,
    ) -> Result<u32, PdfToolsError>;

    fn set_rotation(
        &self,
        handle: &mut Self::Handle,
        index: u32,
        rotation: Rotation,
    ) -> Result<(), PdfToolsError>;

    /// Append a page sized to the image that shows it edge to edge
    fn embed_image(&self, handle: &mut Self::Handle, image: &PageImage)
        -> Result<u32, PdfToolsError>;

    fn save(&self, handle: &mut Self::Handle) -> Result<Vec<u8>, PdfToolsError>;
}

/// Decode bytes into a document covering every page of the source
pub fn decode<C: PdfCodec>(codec: &C, bytes: &[u8]) -> Result<Document<C::Handle>, PdfToolsError> {
    from_handle(codec, codec.load(bytes)?)
}

/// Wrap an already loaded handle, reading each page's stored rotation
pub fn from_handle<C: PdfCodec>(
    codec: &C,
    handle: C::Handle,
) -> Result<Document<C::Handle>, PdfToolsError> {
    let rotations = (0..codec.page_count(&handle) as u32)
        .map(|i| codec.rotation(&handle, i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Document::from_source(Arc::new(handle), rotations))
}

/// Serialize a document: copy each page from its source, apply its rotation
pub fn encode<C: PdfCodec>(codec: &C, document: &Document<C::Handle>) -> Result<Vec<u8>, PdfToolsError> {
    if document.is_empty() {
        return Err(PdfToolsError::OperationError(
            "Cannot save a document without pages".into(),
        ));
    }

    let mut dest = codec.create();
    for page in document.pages() {
        let index = codec.copy_page(&mut dest, page.source(), page.origin())?;
        codec.set_rotation(&mut dest, index, page.rotation())?;
    }
    codec.save(&mut dest)
}

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// A decoded or in-construction lopdf document
pub struct LopdfHandle {
    id: u64,
    doc: lopdf::Document,
    pages_root: ObjectId,
    /// Leaf page objects in display order
    pages: Vec<ObjectId>,
    /// Object id offset used for each source already imported into `doc`
    imported: HashMap<u64, u32>,
    tree_dirty: bool,
}

impl LopdfHandle {
    pub fn document(&self) -> &lopdf::Document {
        &self.doc
    }

    pub(crate) fn page_ids(&self) -> &[ObjectId] {
        &self.pages
    }

    fn page_id(&self, index: u32) -> Result<ObjectId, PdfToolsError> {
        self.pages
            .get(index as usize)
            .copied()
            .ok_or(PdfToolsError::IndexOutOfBounds {
                index: index as usize,
                len: self.pages.len(),
            })
    }

    fn push_page(&mut self, page_id: ObjectId) -> u32 {
        self.pages.push(page_id);
        self.tree_dirty = true;
        (self.pages.len() - 1) as u32
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfCodec;

impl LopdfCodec {
    pub fn new() -> Self {
        Self
    }

    /// Import every object of `source` into `dest` once, shifted past
    /// `dest`'s highest id. Returns the shift.
    fn import_objects(dest: &mut LopdfHandle, source: &LopdfHandle) -> u32 {
        if let Some(&offset) = dest.imported.get(&source.id) {
            return offset;
        }

        let offset = dest.doc.max_id;
        for (old_id, object) in source.doc.objects.iter() {
            let new_id = (old_id.0 + offset, old_id.1);
            dest.doc
                .objects
                .insert(new_id, remap_object_refs(object.clone(), offset));
        }
        dest.doc.max_id = (source.doc.max_id + offset).max(dest.doc.max_id);
        dest.imported.insert(source.id, offset);
        offset
    }

    fn sync_page_tree(handle: &mut LopdfHandle) -> Result<(), PdfToolsError> {
        if !handle.tree_dirty {
            return Ok(());
        }

        let root = handle.pages_root;
        for &page_id in &handle.pages {
            let mut dict = resolved_page_dict(&handle.doc, page_id)?;
            dict.set("Parent", Object::Reference(root));
            handle.doc.objects.insert(page_id, Object::Dictionary(dict));
        }

        let kids = handle
            .pages
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();
        let pages_dict = handle
            .doc
            .get_object_mut(root)
            .and_then(Object::as_dict_mut)
            .map_err(|_| PdfToolsError::OperationError("Invalid pages dictionary".into()))?;
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(handle.pages.len() as i64));

        handle.tree_dirty = false;
        Ok(())
    }
}

impl PdfCodec for LopdfCodec {
    type Handle = LopdfHandle;

    fn load(&self, bytes: &[u8]) -> Result<LopdfHandle, PdfToolsError> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| PdfToolsError::ParseError(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(PdfToolsError::UnsupportedFile(
                "Encrypted PDFs are not supported".into(),
            ));
        }

        let pages_root = find_pages_root(&doc)?;
        let pages = doc.get_pages().values().copied().collect();

        Ok(LopdfHandle {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            doc,
            pages_root,
            pages,
            imported: HashMap::new(),
            tree_dirty: false,
        })
    }

    fn create(&self) -> LopdfHandle {
        let mut doc = lopdf::Document::with_version("1.7");
        let pages_root = doc.new_object_id();
        doc.objects.insert(
            pages_root,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Count", Object::Integer(0)),
                ("Kids", Object::Array(vec![])),
            ])),
        );

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_root)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        LopdfHandle {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            doc,
            pages_root,
            pages: Vec::new(),
            imported: HashMap::new(),
            tree_dirty: false,
        }
    }

    fn page_count(&self, handle: &LopdfHandle) -> usize {
        handle.pages.len()
    }

    fn rotation(&self, handle: &LopdfHandle, index: u32) -> Result<Rotation, PdfToolsError> {
        let page_id = handle.page_id(index)?;
        let dict = resolved_page_dict(&handle.doc, page_id)?;
        let degrees = dict.get(b"Rotate").and_then(Object::as_i64).unwrap_or(0);
        Ok(Rotation::from_degrees(degrees))
    }

    fn copy_page(
        &self,
        dest: &mut LopdfHandle,
        source: &LopdfHandle,
        index: u32,
    ) -> Result<u32, PdfToolsError> {
        let source_page = source.page_id(index)?;
        let page_dict = resolved_page_dict(&source.doc, source_page)?;

        let offset = Self::import_objects(dest, source);
        let mut copied = remap_object_refs(Object::Dictionary(page_dict), offset);
        if let Object::Dictionary(ref mut dict) = copied {
            dict.set("Parent", Object::Reference(dest.pages_root));
        }

        // The same source page may be copied twice (a file merged with
        // itself); each copy needs its own page object.
        let imported_id = (source_page.0 + offset, source_page.1);
        let page_id = if dest.pages.contains(&imported_id) {
            dest.doc.add_object(copied)
        } else {
            dest.doc.objects.insert(imported_id, copied);
            imported_id
        };

        Ok(dest.push_page(page_id))
    }

    fn set_rotation(
        &self,
        handle: &mut LopdfHandle,
        index: u32,
        rotation: Rotation,
    ) -> Result<(), PdfToolsError> {
        let page_id = handle.page_id(index)?;
        let dict = handle
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfToolsError::OperationError(format!("Page {}: {}", index + 1, e)))?;
        dict.set("Rotate", Object::Integer(rotation.degrees() as i64));
        Ok(())
    }

    fn embed_image(&self, handle: &mut LopdfHandle, image: &PageImage) -> Result<u32, PdfToolsError> {
        let image_id = add_image_xobject(&mut handle.doc, image)?;
        let (width, height) = (image.width as i64, image.height as i64);

        let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ\n", width, height);
        let content_id = handle
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "Im0",
                Object::Reference(image_id),
            )])),
        )]);

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(handle.pages_root)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        let page_id = handle.doc.add_object(page);

        Ok(handle.push_page(page_id))
    }

    fn save(&self, handle: &mut LopdfHandle) -> Result<Vec<u8>, PdfToolsError> {
        Self::sync_page_tree(handle)?;

        handle.doc.prune_objects();
        handle.doc.compress();

        let mut buffer = Vec::new();
        handle
            .doc
            .save_to(&mut buffer)
            .map_err(|e| PdfToolsError::OperationError(format!("Failed to save PDF: {}", e)))?;
        Ok(buffer)
    }
}

fn find_pages_root(doc: &lopdf::Document) -> Result<ObjectId, PdfToolsError> {
    let catalog = doc
        .catalog()
        .map_err(|_| PdfToolsError::ParseError("Catalog not found".into()))?;
    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfToolsError::ParseError("No Pages in catalog".into()))
}

/// Clone a page dictionary with inherited attributes copied in, so the page
/// stays correct once it is re-parented under a different tree.
pub(crate) fn resolved_page_dict(doc: &lopdf::Document, page_id: ObjectId) -> Result<Dictionary, PdfToolsError> {
    let mut dict = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|_| PdfToolsError::ParseError(format!("Page object {:?} is not a dictionary", page_id)))?
        .clone();

    let mut parent = dict.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(parent_dict) = doc.get_object(parent_id).and_then(Object::as_dict) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if !dict.has(key) {
                if let Ok(value) = parent_dict.get(key) {
                    dict.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = parent_dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    Ok(dict)
}

/// Recursively shift object references by `offset`
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            remap_dictionary(&mut dict, offset);
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            remap_dictionary(&mut stream.dict, offset);
            Object::Stream(stream)
        }
        other => other,
    }
}

fn remap_dictionary(dict: &mut Dictionary, offset: u32) {
    for (_, value) in dict.iter_mut() {
        let taken = std::mem::replace(value, Object::Null);
        *value = remap_object_refs(taken, offset);
    }
}

fn add_image_xobject(doc: &mut lopdf::Document, image: &PageImage) -> Result<ObjectId, PdfToolsError> {
    let mut dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(image.width as i64)),
        ("Height", Object::Integer(image.height as i64)),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ]);
    let color_space: &[u8] = match image.color {
        PixelColor::Gray => b"DeviceGray",
        PixelColor::Rgb => b"DeviceRGB",
    };
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));

    if let Some(alpha) = &image.alpha {
        let smask = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(image.width as i64)),
            ("Height", Object::Integer(image.height as i64)),
            ("ColorSpace", Object::Name(b"DeviceGray".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"FlateDecode".to_vec())),
        ]);
        let smask_id =
            doc.add_object(Stream::new(smask, deflate(alpha)?).with_compression(false));
        dict.set("SMask", Object::Reference(smask_id));
    }

    let stream = Stream::new(dict, deflate(&image.samples)?).with_compression(false);
    Ok(doc.add_object(stream))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfToolsError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| PdfToolsError::ImageError(format!("Compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly;
    use crate::model::{PageRange, RotationDirection};
    use crate::test_support::{create_test_pdf, page_labels, page_rotations};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_reads_page_count() {
        let codec = LopdfCodec::new();
        let doc = decode(&codec, &create_test_pdf(4, "Doc")).unwrap();
        assert_eq!(doc.page_count(), 4);
    }

    #[test]
    fn test_from_handle_reads_inherited_rotation() {
        let codec = LopdfCodec::new();
        let handle = codec.load(&crate::test_support::create_inherited_pdf()).unwrap();
        let doc = from_handle(&codec, handle).unwrap();
        assert_eq!(doc.pages()[0].rotation().degrees(), 90);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let codec = LopdfCodec::new();
        let err = decode(&codec, b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfToolsError::ParseError(_)));
    }

    #[test]
    fn test_encode_merge_preserves_order() {
        let codec = LopdfCodec::new();
        let a = decode(&codec, &create_test_pdf(2, "DocA")).unwrap();
        let b = decode(&codec, &create_test_pdf(3, "DocB")).unwrap();

        let merged = assembly::merge(&[a, b]).unwrap();
        let bytes = encode(&codec, &merged).unwrap();

        assert_eq!(
            page_labels(&bytes),
            vec![
                "DocA-Page-1",
                "DocA-Page-2",
                "DocB-Page-1",
                "DocB-Page-2",
                "DocB-Page-3"
            ]
        );
    }

    #[test]
    fn test_encode_merge_of_same_source_twice() {
        let codec = LopdfCodec::new();
        let a = decode(&codec, &create_test_pdf(2, "Same")).unwrap();

        let merged = assembly::merge(&[a.clone(), a]).unwrap();
        let bytes = encode(&codec, &merged).unwrap();

        assert_eq!(
            page_labels(&bytes),
            vec!["Same-Page-1", "Same-Page-2", "Same-Page-1", "Same-Page-2"]
        );
    }

    #[test]
    fn test_encode_split_parts() {
        let codec = LopdfCodec::new();
        let source = decode(&codec, &create_test_pdf(10, "Src")).unwrap();

        let parts = assembly::split(
            &source,
            &[
                PageRange::new(1, 3),
                PageRange::new(5, 20),
                PageRange::new(8, 2),
            ],
        );
        assert_eq!(parts.len(), 1);

        let bytes = encode(&codec, &parts[0].document).unwrap();
        assert_eq!(
            page_labels(&bytes),
            vec!["Src-Page-1", "Src-Page-2", "Src-Page-3"]
        );
    }

    #[test]
    fn test_encode_writes_rotation() {
        let codec = LopdfCodec::new();
        let source = decode(&codec, &create_test_pdf(3, "Rot")).unwrap();

        let rotated =
            assembly::rotate_pages(&source, "1,3", Some(RotationDirection::Left)).unwrap();
        let bytes = encode(&codec, &rotated).unwrap();

        assert_eq!(page_rotations(&bytes), vec![270, 0, 270]);

        // Reloading picks the stored rotation back up
        let reloaded = decode(&codec, &bytes).unwrap();
        let again = assembly::rotate_pages(&reloaded, "1", Some(RotationDirection::Right)).unwrap();
        let bytes = encode(&codec, &again).unwrap();
        assert_eq!(page_rotations(&bytes), vec![0, 0, 270]);
    }

    #[test]
    fn test_encode_empty_document_fails() {
        let codec = LopdfCodec::new();
        let empty: Document<LopdfHandle> = Document::from_pages(vec![]);
        assert!(encode(&codec, &empty).is_err());
    }

    #[test]
    fn test_embed_image_adds_sized_page() {
        let codec = LopdfCodec::new();
        let mut handle = codec.create();
        let image = PageImage {
            width: 4,
            height: 2,
            color: PixelColor::Gray,
            samples: vec![0, 255, 0, 255, 255, 0, 255, 0],
            alpha: None,
        };

        let index = codec.embed_image(&mut handle, &image).unwrap();
        assert_eq!(index, 0);

        let bytes = codec.save(&mut handle).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 4);
        assert_eq!(media_box[3].as_i64().unwrap(), 2);
    }

    #[test]
    fn test_copied_page_keeps_inherited_media_box() {
        let codec = LopdfCodec::new();
        let source = decode(&codec, &crate::test_support::create_inherited_pdf()).unwrap();

        let bytes = encode(&codec, &source).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        assert!(page.has(b"MediaBox"));
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
    }
}
