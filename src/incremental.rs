//! Incremental-update tracking (§C.3): keeps the original on-disk bytes
//! alongside the parsed [`Document`] so a collaborator that wants to append
//! an incremental-update section can do so without re-serialising the whole
//! file. The writer itself stays single-shot; this type is a read-side
//! artifact only.

use crate::Document;

/// A document loaded alongside the exact bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct IncrementalDocument {
    pub original_bytes: Vec<u8>,
    pub document: Document,
}

impl IncrementalDocument {
    pub(crate) fn create_from(original_bytes: Vec<u8>, document: Document) -> Self {
        IncrementalDocument { original_bytes, document }
    }

    /// Byte offset one past the end of the original file: where an appended
    /// update section's new objects would begin.
    pub fn append_offset(&self) -> usize {
        self.original_bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_offset_tracks_original_length() {
        let incremental = IncrementalDocument::create_from(vec![0u8; 42], Document::new());
        assert_eq!(incremental.append_offset(), 42);
    }
}
