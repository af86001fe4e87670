use super::{Dictionary, Document, Object, Result};
use crate::config::ValidationMode;
use crate::error::ParseError;
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct Destination(Dictionary);

impl Destination {
    pub fn new(title: Object, page: Object, typ: Object) -> Self {
        let mut dict = Dictionary::new();
        dict.set(b"Title", title);
        dict.set(b"Page", page);
        dict.set(b"Type", typ);
        Destination(dict)
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        self.0.set(key, value);
    }

    pub fn title(&self) -> Result<&Object> {
        self.0.get(b"Title")
    }

    pub fn page(&self) -> Result<&Object> {
        self.0.get(b"Page")
    }
}

/// Destination array types that require extra positional parameters beyond
/// `[page /Type]` (ISO 32000-1, Table 151). A two-element `/D` array naming
/// one of these is missing its parameters.
fn requires_params(type_name: &[u8]) -> bool {
    matches!(type_name, b"FitH" | b"FitV" | b"FitR" | b"FitBH" | b"FitBV" | b"XYZ")
}

/// Validates a `/D` destination array's `[page type ...params]` shape. A
/// bare `[page /FitH]` (no top coordinate) is malformed per the spec: strict
/// mode rejects it, relaxed mode accepts it as an implicit `/Fit`.
fn validate_destination_array(arr: &[Object], mode: ValidationMode) -> Result<(Object, Object)> {
    if arr.len() < 2 {
        return Err(ParseError::SpecViolation {
            location: "Dest array shorter than [page type]".to_string(),
        }
        .into());
    }

    let page = arr[0].clone();
    let type_name = arr[1].as_name().unwrap_or(b"Fit");

    if requires_params(type_name) && arr.len() == 2 {
        return match mode {
            ValidationMode::Strict => Err(ParseError::SpecViolation {
                location: format!("Dest type /{} missing required parameters", String::from_utf8_lossy(type_name)),
            }
            .into()),
            ValidationMode::Relaxed => Ok((page, Object::from("Fit"))),
        };
    }

    Ok((page, arr[1].clone()))
}

impl Document {
    pub fn get_named_destinations(
        &self, tree: &Dictionary, named_destinations: &mut IndexMap<Vec<u8>, Destination>,
    ) -> Result<()> {
        let mode = self.config.validation_mode;

        if let Ok(kids) = tree.get(b"Kids") {
            for kid in kids.as_array()? {
                if let Ok(kid) = kid.as_reference().and_then(move |id| self.get_dictionary(id)) {
                    self.get_named_destinations(kid, named_destinations)?;
                }
            }
        }
        if let Ok(names) = tree.get(b"Names") {
            let mut names = names.as_array()?.iter();
            while let (Some(key), Some(val)) = (names.next(), names.next()) {
                let key_bytes = match key.as_str() {
                    Ok(s) => s.to_vec(),
                    Err(_) => continue,
                };
                if let Ok(obj_ref) = val.as_reference() {
                    if let Ok(dict) = self.get_dictionary(obj_ref) {
                        if let Ok(arr) = dict.get(b"D").and_then(|d| d.as_array()) {
                            if let Ok((page, typ)) = validate_destination_array(arr, mode) {
                                named_destinations.insert(key_bytes, Destination::new(key.clone(), page, typ));
                            }
                        }
                    } else if let Ok(Object::Array(val)) = self.get_object(obj_ref) {
                        if let Ok((page, typ)) = validate_destination_array(val, mode) {
                            named_destinations.insert(key_bytes, Destination::new(key.clone(), page, typ));
                        }
                    }
                } else if let Ok(dict) = val.as_dict() {
                    if let Ok(arr) = dict.get(b"D").and_then(|d| d.as_array()) {
                        if let Ok((page, typ)) = validate_destination_array(arr, mode) {
                            named_destinations.insert(key_bytes, Destination::new(key.clone(), page, typ));
                        }
                    }
                }
                // Silently skip unexpected node types
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(page: i64, type_name: &str, extra_len: usize) -> Vec<Object> {
        let mut arr = vec![Object::Integer(page), Object::from(type_name)];
        for _ in 0..extra_len {
            arr.push(Object::Integer(0));
        }
        arr
    }

    #[test]
    fn accepts_fith_with_parameter() {
        let arr = dest(0, "FitH", 1);
        let (page, typ) = validate_destination_array(&arr, ValidationMode::Strict).unwrap();
        assert_eq!(page, Object::Integer(0));
        assert_eq!(typ.as_name().unwrap(), b"FitH");
    }

    #[test]
    fn strict_rejects_bare_fith() {
        let arr = dest(0, "FitH", 0);
        assert!(validate_destination_array(&arr, ValidationMode::Strict).is_err());
    }

    #[test]
    fn relaxed_treats_bare_fith_as_fit() {
        let arr = dest(0, "FitH", 0);
        let (_, typ) = validate_destination_array(&arr, ValidationMode::Relaxed).unwrap();
        assert_eq!(typ.as_name().unwrap(), b"Fit");
    }

    #[test]
    fn plain_fit_needs_no_params() {
        let arr = vec![Object::Integer(2), Object::from("Fit")];
        assert!(validate_destination_array(&arr, ValidationMode::Strict).is_ok());
    }
}
