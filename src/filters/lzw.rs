use weezl::{decode::Decoder, encode::Encoder, BitOrder};

use crate::error::FilterError;
use crate::Result;

/// PDF's LZWDecode uses MSB-first bit packing, matching `weezl`'s `BitOrder::Msb`.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>> {
    Decoder::new(BitOrder::Msb, 8)
        .decode(bytes)
        .map_err(|e| FilterError::Lzw(e.to_string()).into())
}

pub fn encode(bytes: &[u8]) -> Vec<u8> {
    Encoder::new(BitOrder::Msb, 8)
        .encode(bytes)
        .expect("in-memory lzw encode never fails")
}
