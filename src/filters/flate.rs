use std::io::Write;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::FilterError;
use crate::Result;

pub fn decode(bytes: &[u8]) -> Result<Vec<u8>> {
    use std::io::Read;
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FilterError::Flate(e.to_string()))?;
    Ok(out)
}

pub fn encode(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // In-memory writers never fail.
    encoder.write_all(bytes).expect("in-memory zlib encode");
    encoder.finish().expect("in-memory zlib encode")
}
