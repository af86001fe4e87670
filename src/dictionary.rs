use std::fmt;

use indexmap::IndexMap;

use crate::object::Object;
use crate::{Error, Result};

/// An ordered mapping from PDF name keys to objects.
///
/// Backed by an [`IndexMap`] rather than a plain hash map so that
/// re-serialising a document preserves the original key order: insertion
/// order is not semantically significant to a PDF consumer, but a stable
/// order makes diffs and round-trip tests meaningful.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    map: IndexMap<Vec<u8>, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary { map: IndexMap::new() }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &[u8]) -> Result<&Object> {
        self.map.get(key).ok_or_else(|| Error::DictKey(String::from_utf8_lossy(key).into_owned()))
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Result<&mut Object> {
        self.map
            .get_mut(key)
            .ok_or_else(|| Error::DictKey(String::from_utf8_lossy(key).into_owned()))
    }

    /// Sets `key` to `value`, preserving its original position if already present.
    pub fn set<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        self.map.insert(key.into(), value.into());
        self
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.map.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Object)> {
        self.map.iter().map(|(k, v)| (k.as_slice(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&[u8], &mut Object)> {
        self.map.iter_mut().map(|(k, v)| (k.as_slice(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.map.keys().map(|k| k.as_slice())
    }

    /// Reads the `/Type` entry as a bare name, if present.
    pub fn get_type(&self) -> Result<&[u8]> {
        self.get(b"Type").and_then(Object::as_name)
    }

    /// True if `/Type` equals `type_name`. Missing `/Type` is false, never an error —
    /// many legitimate dictionaries (Resources, CF, ...) have no Type entry at all.
    pub fn has_type(&self, type_name: &[u8]) -> bool {
        self.get_type().map(|t| t == type_name).unwrap_or(false)
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<<")?;
        for (k, v) in self.iter() {
            write!(f, " /{}", String::from_utf8_lossy(k))?;
            write!(f, " {v:?}")?;
        }
        write!(f, " >>")
    }
}

impl FromIterator<(Vec<u8>, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (Vec<u8>, Object)>>(iter: T) -> Self {
        Dictionary {
            map: IndexMap::from_iter(iter),
        }
    }
}

/// Builds a [`Dictionary`] with literal key/value pairs, in the style of `maplit`'s `hashmap!`.
///
/// ```
/// use pdfcore::{dictionary, Object};
/// let dict = dictionary! {
///     "Type" => "Page",
///     "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
/// };
/// assert!(dict.has(b"Type"));
/// ```
#[macro_export]
macro_rules! dictionary {
    () => { $crate::Dictionary::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut dict = $crate::Dictionary::new();
        $(dict.set($key, $value);)+
        dict
    }};
}
