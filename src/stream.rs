use crate::dictionary::Dictionary;
use crate::filters;
use crate::object::Object;
use crate::Result;

/// A PDF stream object: a dictionary plus a byte payload.
///
/// `content` always holds the payload exactly as it appears on disk — still
/// subject to whatever `/Filter` chain the dictionary names. The decoded form
/// is a cache (`decoded_cache`) derived on demand; per the design note in
/// §9 of the specification it is invalidated whenever `content` or the
/// dictionary's filter chain changes, and is never carried across the
/// optimise → write boundary unless the optimiser rewrote it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub content: Vec<u8>,
    /// Byte offset in the source buffer where `content` begins, used by the
    /// parser's deferred stream-length recovery (§4.3).
    pub start_position: Option<usize>,
    decoded_cache: Option<Vec<u8>>,
}

impl Stream {
    pub fn new(mut dict: Dictionary, content: Vec<u8>) -> Self {
        dict.set("Length", Object::Integer(content.len() as i64));
        Stream {
            dict,
            content,
            start_position: None,
            decoded_cache: None,
        }
    }

    /// Replaces the raw payload, invalidating any cached decode.
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.dict.set("Length", Object::Integer(content.len() as i64));
        self.content = content;
        self.decoded_cache = None;
    }

    /// Replaces the payload with an already-decoded buffer, re-running the
    /// dictionary's filter chain to produce the new on-disk bytes. Used by
    /// the optimiser and by collaborators rewriting stream content.
    pub fn set_plain_content(&mut self, decoded: Vec<u8>) -> Result<()> {
        let encoded = filters::encode(&self.dict, &decoded)?;
        self.decoded_cache = Some(decoded);
        self.content = encoded;
        self.dict.set("Length", Object::Integer(self.content.len() as i64));
        Ok(())
    }

    /// Decodes `content` through the filter pipeline, caching the result.
    pub fn decompressed_content(&mut self) -> Result<Vec<u8>> {
        if let Some(cached) = &self.decoded_cache {
            return Ok(cached.clone());
        }
        let decoded = filters::decode(&self.dict, &self.content)?;
        self.decoded_cache = Some(decoded.clone());
        Ok(decoded)
    }

    /// Same as [`Self::decompressed_content`] but does not populate the cache,
    /// for read-only diagnostic callers (`decode_all_streams` config option).
    pub fn peek_decompressed(&self) -> Result<Vec<u8>> {
        if let Some(cached) = &self.decoded_cache {
            return Ok(cached.clone());
        }
        filters::decode(&self.dict, &self.content)
    }

    pub fn is_compressed(&self) -> bool {
        self.dict.has(b"Filter")
    }

    /// Overwrites `content` without touching `/Length`, for the security
    /// handler: encryption wraps the already-filtered bytes, so `/Length`
    /// describes the on-disk (encrypted) size both before and after this
    /// call flips between encrypted and plaintext-but-still-filtered form.
    pub(crate) fn set_encryption_transformed_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.decoded_cache = None;
    }
}
