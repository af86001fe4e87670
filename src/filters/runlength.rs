use crate::error::FilterError;
use crate::Result;

/// RunLengthDecode: each run is a length byte followed by data.
/// 0..=127: copy the next `length + 1` literal bytes.
/// 129..=255: repeat the single following byte `257 - length` times.
/// 128: EOD marker.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let length = bytes[i];
        i += 1;
        match length {
            0..=127 => {
                let count = length as usize + 1;
                let end = i + count;
                if end > bytes.len() {
                    return Err(FilterError::RunLength.into());
                }
                out.extend_from_slice(&bytes[i..end]);
                i = end;
            }
            129..=255 => {
                let byte = *bytes.get(i).ok_or(FilterError::RunLength)?;
                let count = 257 - length as usize;
                out.extend(std::iter::repeat(byte).take(count));
                i += 1;
            }
            128 => break,
        }
    }

    Ok(out)
}

pub fn encode(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let run_len = bytes[i..].iter().take_while(|&&b| b == bytes[i]).count();
        if run_len >= 2 {
            let run_len = run_len.min(128);
            out.push((257 - run_len) as u8);
            out.push(bytes[i]);
            i += run_len;
            continue;
        }

        let mut literal_len = 1;
        while i + literal_len < bytes.len()
            && literal_len < 128
            && !(bytes[i + literal_len] == bytes[i + literal_len - 1]
                && i + literal_len + 1 < bytes.len()
                && bytes[i + literal_len + 1] == bytes[i + literal_len - 1])
        {
            literal_len += 1;
        }

        out.push((literal_len - 1) as u8);
        out.extend_from_slice(&bytes[i..i + literal_len]);
        i += literal_len;
    }

    out.push(128);
    out
}
