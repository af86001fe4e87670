//! The in-memory document model (§6): the object table and trailer a
//! [`crate::reader::Reader`] builds, an [`crate::optimizer`] pass rewrites,
//! and the [`crate::writer`] module serialises back to bytes.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::config::{Config, SaveOptions};
use crate::dictionary::Dictionary;
use crate::encryption::EncryptionState;
use crate::error::WriteError;
use crate::object::{Object, ObjectId};
use crate::xref::XrefTable;
use crate::{Error, Result};

/// The value a missing, free, or dangling reference resolves to (§4.4).
static NULL_OBJECT: Object = Object::Null;

/// A loaded (or freshly constructed) PDF document.
///
/// Fields are `pub` in the style of the reader module's own `Reader`: the
/// reader, writer, optimiser and security handler all need direct field
/// access, and a document is cheap enough to clone wholesale that hiding the
/// fields behind accessors would only add ceremony.
#[derive(Debug, Clone)]
pub struct Document {
    /// PDF version from the header, e.g. `"1.7"`.
    pub version: String,
    /// Highest object number in use (`/Size` - 1).
    pub max_id: u32,
    /// Byte offset of the final `xref` section in the source buffer.
    pub xref_start: usize,
    pub objects: BTreeMap<ObjectId, Object>,
    pub reference_table: XrefTable,
    pub trailer: Dictionary,
    /// The four-or-more high-bit bytes on the header's binary-marker line.
    pub binary_mark: Vec<u8>,
    pub encryption_state: Option<EncryptionState>,
    pub config: Config,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            version: "1.5".to_string(),
            max_id: 0,
            xref_start: 0,
            objects: BTreeMap::new(),
            reference_table: XrefTable::default(),
            trailer: Dictionary::new(),
            binary_mark: Vec::new(),
            encryption_state: None,
            config: Config::default(),
        }
    }

    /// Inserts `object` under a freshly allocated object number, returning
    /// its id (generation 0).
    pub fn add_object<O: Into<Object>>(&mut self, object: O) -> ObjectId {
        self.max_id += 1;
        let id = (self.max_id, 0);
        self.objects.insert(id, object.into());
        id
    }

    /// Resolves `id` against the object table. A free, dangling, or
    /// out-of-range id is not an error (§4.4): it yields `Object::Null`,
    /// the same way a free/missing xref entry does when a reference to it
    /// is dereferenced.
    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        Ok(self.objects.get(&id).unwrap_or(&NULL_OBJECT))
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(&id).ok_or(Error::MissingXrefEntry)
    }

    pub fn get_dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        self.get_object(id)?.as_dict()
    }

    /// Resolves `value` one level: an indirect reference dereferences to the
    /// object it names (returning that object's id alongside it), resolving
    /// to `Object::Null` rather than erroring if the reference is free,
    /// dangling, or out of range (§4.4); anything else is returned unchanged
    /// with no id. Reference chains longer than one hop are not valid PDF
    /// and are not followed.
    pub fn dereference<'a>(&'a self, value: &'a Object) -> Result<(Option<ObjectId>, &'a Object)> {
        match value {
            Object::Reference(id) => Ok((Some(*id), self.get_object(*id)?)),
            other => Ok((None, other)),
        }
    }

    /// Authenticates `password` against the document's `/Encrypt`
    /// dictionary without installing the resulting state. Used by the
    /// reader to probe the empty password before asking the caller for one.
    pub fn authenticate_password(&self, password: &str) -> Result<()> {
        EncryptionState::decode(self, password).map(|_| ())
    }

    /// Installs `state` as this document's encryption context, so a later
    /// save re-encrypts with the same parameters it was opened under.
    pub fn set_encryption(&mut self, state: EncryptionState) {
        self.encryption_state = Some(state);
    }

    fn catalog_pages_root(&self) -> Option<ObjectId> {
        let root_ref = self.trailer.get(b"Root").ok()?.as_reference().ok()?;
        let catalog = self.get_dictionary(root_ref).ok()?;
        catalog.get(b"Pages").ok()?.as_reference().ok()
    }

    /// Walks the page tree from `/Root/Pages`, returning every leaf page
    /// keyed by its 1-based position in reading order. A circular `/Parent`
    /// chain or a mis-typed node fails with `InvalidPageTree` at the first
    /// affected page (§4.4, scenario S4); pages already reached by then are
    /// lost with it; callers that want the best-effort partial walk instead
    /// use [`Self::get_pages_lenient`].
    pub fn get_pages(&self) -> Result<BTreeMap<u32, ObjectId>> {
        let mut pages = BTreeMap::new();
        if let Some(root_id) = self.catalog_pages_root() {
            let mut counter = 0u32;
            let mut seen = HashSet::new();
            self.collect_pages(root_id, &mut counter, &mut pages, &mut seen)?;
        }
        Ok(pages)
    }

    /// Same walk as [`Self::get_pages`], but tolerant: a cycle or mis-typed
    /// node just stops that branch instead of failing the whole walk, so
    /// whatever pages were already collected are kept. The optimiser uses
    /// this, since it must never fail (§4.4).
    pub(crate) fn get_pages_lenient(&self) -> BTreeMap<u32, ObjectId> {
        let mut pages = BTreeMap::new();
        if let Some(root_id) = self.catalog_pages_root() {
            let mut counter = 0u32;
            let mut seen = HashSet::new();
            let _ = self.collect_pages(root_id, &mut counter, &mut pages, &mut seen);
        }
        pages
    }

    fn collect_pages(
        &self,
        id: ObjectId,
        counter: &mut u32,
        pages: &mut BTreeMap<u32, ObjectId>,
        seen: &mut HashSet<ObjectId>,
    ) -> Result<()> {
        if !seen.insert(id) {
            return Err(Error::InvalidPageTree(id));
        }
        let dict = self.get_dictionary(id).map_err(|_| Error::InvalidPageTree(id))?;

        if dict.get_type().map(|t| t == b"Pages").unwrap_or(false) {
            if let Ok(kids_obj) = dict.get(b"Kids") {
                let kids = kids_obj.as_array().map_err(|_| Error::InvalidPageTree(id))?;
                for kid in kids {
                    let kid_id = kid.as_reference().map_err(|_| Error::InvalidPageTree(id))?;
                    self.collect_pages(kid_id, counter, pages, seen)?;
                }
            }
            return Ok(());
        }

        *counter += 1;
        pages.insert(*counter, id);
        Ok(())
    }

    /// Runs the page-tree/resource-dictionary optimiser (§4.4) over this
    /// document in place, returning a summary of what it folded away. A
    /// second call on an already-optimised document reports zero further
    /// deduplication.
    pub fn optimise(&mut self) -> crate::optimizer::OptimisationReport {
        crate::optimizer::optimise(self)
    }

    /// Serialises this document with default [`SaveOptions`] (classic xref,
    /// no object streams, no encryption) and writes it to `path`.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.save_with_options(&mut File::create(path)?, SaveOptions::default())
    }

    /// Serialises this document with default [`SaveOptions`] to `target`.
    pub fn save_to<W: Write>(&mut self, target: &mut W) -> Result<()> {
        self.save_with_options(target, SaveOptions::default())
    }

    /// Serialises this document with the given [`SaveOptions`] to `target`.
    pub fn save_with_options<W: Write>(&mut self, target: &mut W, options: SaveOptions) -> Result<()> {
        let bytes = crate::writer::serialize(self, &options)?;
        target.write_all(&bytes).map_err(|e| Error::Write(WriteError::Io(e.to_string())))?;
        Ok(())
    }
}
