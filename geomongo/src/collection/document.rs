use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use std::cmp::Ordering;
use std::fmt::{Debug, Display};

type FieldVec = SmallVec<[String; 8]>;

/// A document as stored in a document collection.
///
/// A document is an ordered mapping of [String] keys to [Value]s. Key order
/// is insertion order and is preserved through JSON conversion, so a
/// document read from the store writes back key-for-key.
///
/// Keys containing the field separator (`.`) address embedded documents:
/// `put("a.b", 1)` creates `{"a": {"b": 1}}` and `get("a.b")` reads it back.
/// Numeric segments index into arrays on read.
///
/// The `_id` field holds the identifier once the document has been saved.
#[derive(Clone, Default)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top-level keys.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, descending into (and creating) embedded
    /// documents when the key contains the field separator.
    ///
    /// # Errors
    ///
    /// Returns an error when the key or one of its segments is empty, or when
    /// an intermediate segment holds a non-document value.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> GeoMongoResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(GeoMongoError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value.into())
        } else {
            self.data.insert(key.to_string(), value.into());
            Ok(())
        }
    }

    /// Inserts `value` under `key` verbatim, without splitting on the field
    /// separator.
    pub fn put_field<T: Into<Value>>(&mut self, key: &str, value: T) {
        self.data.insert(key.to_string(), value.into());
    }

    /// Returns the value at `key`, following embedded keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }

        if !key.contains(FIELD_SEPARATOR) {
            return None;
        }

        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        self.recursive_get(self.data.get(splits[0]), &splits[1..])
    }

    /// Returns the value at `key` or [Value::Null] when it is absent.
    pub fn get_or_null(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Returns a mutable reference to a top-level value.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Removes the value at `key`, following embedded keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if self.data.contains_key(key) || !key.contains(FIELD_SEPARATOR) {
            return self.data.shift_remove(key);
        }

        let (head, rest) = key.split_once(FIELD_SEPARATOR)?;
        match self.data.get_mut(head) {
            Some(Value::Document(nested)) => nested.remove(rest),
            _ => None,
        }
    }

    /// Checks for a top-level key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Checks for a field, following embedded keys.
    pub fn contains_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn id(&self) -> Option<&Value> {
        self.data.get(DOC_ID)
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Sets the identifier, keeping it as the first key of the document.
    pub fn set_id<T: Into<Value>>(&mut self, id: T) {
        self.data.shift_insert(0, DOC_ID.to_string(), id.into());
    }

    /// Top-level keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Returns the key/value pair at a position in document order.
    pub fn get_index(&self, index: usize) -> Option<(&String, &Value)> {
        self.data.get_index(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<(&String, &mut Value)> {
        self.data.get_index_mut(index)
    }

    /// Returns all leaf field names, embedded ones joined with the separator.
    pub fn fields(&self) -> FieldVec {
        self.get_fields_internal("")
    }

    /// Copies `other` into this document, merging embedded documents.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(mine)), Value::Document(theirs)) => mine.merge(theirs),
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Builds a document from a JSON object.
    pub fn from_json(json: &serde_json::Value) -> GeoMongoResult<Document> {
        match json {
            serde_json::Value::Object(map) => {
                let mut document = Document::new();
                for (key, value) in map {
                    document.put_field(key, Value::from_json(value)?);
                }
                Ok(document)
            }
            other => {
                log::error!("Expected a JSON object but found {}", other);
                Err(GeoMongoError::new(
                    &format!("Expected a JSON object but found {}", other),
                    ErrorKind::EncodingError,
                ))
            }
        }
    }

    /// Parses a document from JSON text.
    pub fn from_json_str(json: &str) -> GeoMongoResult<Document> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Document::from_json(&value)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.data.len());
        for (key, value) in &self.data {
            map.insert(key.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    fn get_fields_internal(&self, prefix: &str) -> FieldVec {
        let mut fields = FieldVec::new();
        for (key, value) in &self.data {
            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };

            match value {
                Value::Document(doc) if !doc.is_empty() => {
                    fields.extend(doc.get_fields_internal(&field));
                }
                _ => fields.push(field),
            }
        }
        fields
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> GeoMongoResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Document does not support empty key");
                return Err(GeoMongoError::new(
                    "Document does not support empty key",
                    ErrorKind::InvalidOperation,
                ));
            }
        };

        if splits.len() == 1 {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        let entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Document(Document::new()));

        if entry.is_null() {
            *entry = Value::Document(Document::new());
        }

        match entry {
            Value::Document(nested) => nested.deep_put(&splits[1..], value),
            other => {
                log::error!(
                    "Cannot create embedded field '{}' inside a {:?} value",
                    splits[1..].join(FIELD_SEPARATOR),
                    other
                );
                Err(GeoMongoError::new(
                    &format!(
                        "Cannot create embedded field '{}' inside a non-document value",
                        splits[1..].join(FIELD_SEPARATOR)
                    ),
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    fn recursive_get<'a>(&'a self, value: Option<&'a Value>, splits: &[&str]) -> Option<&'a Value> {
        let value = value?;
        let Some(key) = splits.first() else {
            return Some(value);
        };

        match value {
            Value::Document(obj) => obj.recursive_get(obj.data.get(*key), &splits[1..]),
            Value::Array(arr) => {
                let index = key.parse::<usize>().ok()?;
                self.recursive_get(arr.get(index), &splits[1..])
            }
            _ => None,
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a == b)
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.iter().cmp(other.data.iter())
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Document {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, value) in &self.data {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// ```rust
/// use geomongo::doc;
///
/// let feature = doc! {
///     "_id": "ft1.0",
///     geometry: { type: "Point", coordinates: [1.0, 2.0] },
///     properties: { intProperty: 1 }
/// };
/// assert_eq!(feature.size(), 3);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
