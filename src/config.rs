//! Runtime configuration for reading, writing, and encrypting documents.
//!
//! Mirrors the dual style the rest of the crate uses for knobs: small plain
//! structs/enums for reader-side behaviour (set directly), and a builder for
//! [`SaveOptions`] where the many interdependent write-time choices benefit
//! from one.

use crate::encryption::Permissions;

/// How strictly the reader enforces spec conformance when it encounters
/// malformed-but-recoverable input (e.g. a `/Dest` array missing required
/// parameters, a xref `/Size` that disagrees with the highest object number
/// actually present).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Reject malformed constructs with an error.
    Strict,
    /// Recover with a best-effort interpretation and continue, the way most
    /// real-world PDF consumers do.
    #[default]
    Relaxed,
}

/// Line ending style used when emitting new lines the writer controls (the
/// header, object boundaries, xref table rows). Stream content itself is
/// never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eol {
    #[default]
    Lf,
    Crlf,
}

impl Eol {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Eol::Lf => b"\n",
            Eol::Crlf => b"\r\n",
        }
    }
}

/// Reader-side configuration. Construct with [`Config::default`] and
/// override individual fields; there is no builder since these knobs are
/// independent rather than interdependent.
#[derive(Debug, Clone)]
pub struct Config {
    /// Accept PDF 1.5+ constructs (xref streams, object streams, hybrid
    /// xrefs) even when the header declares an older version.
    pub reader_pdf15_compat: bool,
    /// Eagerly decode every stream's filter chain at load time rather than
    /// lazily on first access. Slower, but surfaces filter errors up front.
    pub decode_all_streams: bool,
    pub validation_mode: ValidationMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reader_pdf15_compat: true,
            decode_all_streams: false,
            validation_mode: ValidationMode::Relaxed,
        }
    }
}

/// Which cipher family to encrypt a saved document with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionAlgorithm {
    Rc4,
    Aes128,
    Aes256,
}

/// Parameters for encrypting a document on save. Constructed directly since
/// [`SaveOptions::builder`] takes it as a single field.
#[derive(Debug, Clone)]
pub struct EncryptionOptions {
    pub algorithm: EncryptionAlgorithm,
    pub permissions: Permissions,
    pub user_password: String,
    pub owner_password: String,
}

/// Options controlling how [`crate::Document::save_with_options`] serialises
/// a document. Build with [`SaveOptions::builder`].
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub use_xref_streams: bool,
    pub use_object_streams: bool,
    pub eol: Eol,
    pub encryption: Option<EncryptionOptions>,
}

impl SaveOptions {
    pub fn builder() -> SaveOptionsBuilder {
        SaveOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaveOptionsBuilder {
    options: SaveOptions,
}

impl SaveOptionsBuilder {
    pub fn use_xref_streams(mut self, value: bool) -> Self {
        self.options.use_xref_streams = value;
        self
    }

    pub fn use_object_streams(mut self, value: bool) -> Self {
        self.options.use_object_streams = value;
        self
    }

    pub fn eol(mut self, value: Eol) -> Self {
        self.options.eol = value;
        self
    }

    pub fn encrypt_with(mut self, value: EncryptionOptions) -> Self {
        self.options.encryption = Some(value);
        self
    }

    pub fn build(self) -> SaveOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_requested_fields_only() {
        let options = SaveOptions::builder().use_xref_streams(true).use_object_streams(true).build();
        assert!(options.use_xref_streams);
        assert!(options.use_object_streams);
        assert!(options.encryption.is_none());
        assert_eq!(options.eol, Eol::Lf);
    }

    #[test]
    fn eol_byte_sequences() {
        assert_eq!(Eol::Lf.as_bytes(), b"\n");
        assert_eq!(Eol::Crlf.as_bytes(), b"\r\n");
    }
}
