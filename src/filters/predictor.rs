use crate::dictionary::Dictionary;
use crate::error::FilterError;
use crate::object::Object;
use crate::Result;

/// The `Predictor` parameter accompanying FlateDecode/LZWDecode (§4.1): `1`
/// is no prediction, `2` is TIFF-style horizontal differencing, `10..=15`
/// select one of the five PNG per-row filter types (only the *value* 10-15
/// selects PNG mode — the actual filter type is read per-row from the data,
/// per the PNG spec this encoding piggybacks on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    None,
    Tiff,
    Png,
}

#[derive(Debug, Clone, Copy)]
struct Params {
    predictor: Predictor,
    colors: usize,
    bits_per_component: usize,
    columns: usize,
}

impl Params {
    fn from_dict(dict: Option<&Dictionary>) -> Result<Option<Self>> {
        let Some(dict) = dict else { return Ok(None) };
        let predictor_value = dict.get(b"Predictor").and_then(Object::as_i64).unwrap_or(1);
        let predictor = match predictor_value {
            1 => Predictor::None,
            2 => Predictor::Tiff,
            10..=15 => Predictor::Png,
            other => return Err(FilterError::UnsupportedFilterParam(other).into()),
        };
        if predictor == Predictor::None {
            return Ok(None);
        }
        let colors = dict.get(b"Colors").and_then(Object::as_i64).unwrap_or(1) as usize;
        let bits_per_component = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8) as usize;
        let columns = dict.get(b"Columns").and_then(Object::as_i64).unwrap_or(1) as usize;
        Ok(Some(Params {
            predictor,
            colors,
            bits_per_component,
            columns,
        }))
    }

    fn bytes_per_pixel(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }

    fn row_bytes(&self) -> usize {
        (self.colors * self.bits_per_component * self.columns).div_ceil(8)
    }
}

/// Reverses row prediction after the underlying codec (Flate/LZW) has decoded
/// its bytes.
pub fn undo(data: Vec<u8>, parm: Option<&Dictionary>) -> Result<Vec<u8>> {
    let Some(params) = Params::from_dict(parm)? else {
        return Ok(data);
    };

    match params.predictor {
        Predictor::None => Ok(data),
        Predictor::Tiff => Ok(undo_tiff(data, &params)),
        Predictor::Png => undo_png(data, &params),
    }
}

/// Applies row prediction before the underlying codec encodes its bytes.
/// Chooses the "Up" PNG filter type per row — simple, invertible, and
/// requires no format-specific tuning.
pub fn apply(data: Vec<u8>, parm: Option<&Dictionary>) -> Result<Vec<u8>> {
    let Some(params) = Params::from_dict(parm)? else {
        return Ok(data);
    };

    match params.predictor {
        Predictor::None => Ok(data),
        Predictor::Tiff => Ok(apply_tiff(data, &params)),
        Predictor::Png => Ok(apply_png_up(data, &params)),
    }
}

fn undo_tiff(mut data: Vec<u8>, params: &Params) -> Vec<u8> {
    if params.bits_per_component != 8 {
        // Sub-byte TIFF prediction is rare in practice; pass through unchanged
        // rather than guess at bit-level differencing.
        return data;
    }
    let row_bytes = params.row_bytes();
    let bpp = params.bytes_per_pixel();
    for row in data.chunks_mut(row_bytes) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    data
}

fn apply_tiff(mut data: Vec<u8>, params: &Params) -> Vec<u8> {
    if params.bits_per_component != 8 {
        return data;
    }
    let row_bytes = params.row_bytes();
    let bpp = params.bytes_per_pixel();
    for row in data.chunks_mut(row_bytes) {
        for i in (bpp..row.len()).rev() {
            row[i] = row[i].wrapping_sub(row[i - bpp]);
        }
    }
    data
}

fn undo_png(data: Vec<u8>, params: &Params) -> Result<Vec<u8>> {
    let row_bytes = params.row_bytes();
    let bpp = params.bytes_per_pixel();
    let stride = row_bytes + 1;
    if stride == 0 || data.len() % stride != 0 {
        return Err(FilterError::UnsupportedFilterParam(0).into());
    }

    let mut out = Vec::with_capacity(data.len() / stride * row_bytes);
    let mut prev_row = vec![0u8; row_bytes];

    for chunk in data.chunks(stride) {
        let filter_type = chunk[0];
        let mut row = chunk[1..].to_vec();

        for i in 0..row.len() {
            let a = if i >= bpp { row[i - bpp] } else { 0 };
            let b = prev_row[i];
            let c = if i >= bpp { prev_row[i - bpp] } else { 0 };
            row[i] = match filter_type {
                0 => row[i],
                1 => row[i].wrapping_add(a),
                2 => row[i].wrapping_add(b),
                3 => row[i].wrapping_add(((a as u16 + b as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(a, b, c)),
                other => return Err(FilterError::UnsupportedFilterParam(other as i64).into()),
            };
        }

        out.extend_from_slice(&row);
        prev_row = row;
    }

    Ok(out)
}

fn apply_png_up(data: Vec<u8>, params: &Params) -> Vec<u8> {
    let row_bytes = params.row_bytes();
    let mut out = Vec::with_capacity(data.len() + data.len() / row_bytes.max(1) + 1);
    let mut prev_row = vec![0u8; row_bytes];

    for chunk in data.chunks(row_bytes) {
        out.push(2); // Up
        for (i, &byte) in chunk.iter().enumerate() {
            let b = prev_row.get(i).copied().unwrap_or(0);
            out.push(byte.wrapping_sub(b));
        }
        prev_row = chunk.to_vec();
        prev_row.resize(row_bytes, 0);
    }

    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i32, b as i32, c as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parms(predictor: i64, colors: i64, bpc: i64, columns: i64) -> Dictionary {
        crate::dictionary! {
            "Predictor" => Object::Integer(predictor),
            "Colors" => Object::Integer(colors),
            "BitsPerComponent" => Object::Integer(bpc),
            "Columns" => Object::Integer(columns),
        }
    }

    #[test]
    fn png_up_round_trips() {
        let dict = parms(12, 1, 8, 4);
        let data = vec![10u8, 20, 30, 40, 15, 25, 35, 45];
        let predicted = apply(data.clone(), Some(&dict)).unwrap();
        let restored = undo(predicted, Some(&dict)).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn tiff_round_trips() {
        let dict = parms(2, 1, 8, 4);
        let data = vec![10u8, 20, 30, 40];
        let predicted = apply(data.clone(), Some(&dict)).unwrap();
        let restored = undo(predicted, Some(&dict)).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn rejects_unknown_predictor_value() {
        let dict = parms(9, 1, 8, 4);
        assert!(apply(vec![1, 2, 3], Some(&dict)).is_err());
    }
}
