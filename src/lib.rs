//! A PDF parsing, optimising, and writing library (ISO 32000-1/2).
//!
//! A [`Document`] is built by [`Document::load`] (or one of its sibling
//! constructors) from bytes on disk or in memory, optionally rewritten by
//! [`Document::optimise`], and serialised back out by [`Document::save`] or
//! [`Document::save_with_options`]. Encrypted documents authenticate via
//! [`Document::load_with_password`] and friends; [`config::EncryptionOptions`]
//! installs fresh encryption on save.

mod config;
mod destinations;
mod dictionary;
mod document;
mod encryption;
mod error;
mod filters;
mod incremental;
mod object;
mod object_stream;
mod optimizer;
mod parser;
mod reader;
mod stream;
mod writer;
mod xref;

pub use config::{Config, Eol, EncryptionAlgorithm, EncryptionOptions, SaveOptions, SaveOptionsBuilder, ValidationMode};
pub use destinations::Destination;
pub use dictionary::Dictionary;
pub use document::Document;
pub use encryption::{CryptMethod, EncryptionState, Permissions, Role};
pub use error::{DecryptionError, Error, FilterError, ParseError, Result, WriteError, XrefError};
pub use incremental::IncrementalDocument;
pub use object::{Object, ObjectId, StringFormat};
pub use object_stream::{ObjectStream, ObjectStreamBuilder, ObjectStreamConfig, ObjectStreamPlan};
pub use optimizer::OptimisationReport;
pub use reader::PdfMetadata;
pub use stream::Stream;
pub use xref::{XrefEntry, XrefTable};
