use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::common::Value;
use crate::feature::Schema;
use crate::geometry::Geometry;

/// The value of one feature attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Geometry(Geometry),
    Value(Value),
}

impl FeatureValue {
    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            FeatureValue::Geometry(g) => Some(g),
            FeatureValue::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FeatureValue::Value(v) => Some(v),
            FeatureValue::Geometry(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FeatureValue::Value(Value::Null))
    }
}

impl Default for FeatureValue {
    fn default() -> Self {
        FeatureValue::Value(Value::Null)
    }
}

impl From<Geometry> for FeatureValue {
    fn from(value: Geometry) -> Self {
        FeatureValue::Geometry(value)
    }
}

impl From<Value> for FeatureValue {
    fn from(value: Value) -> Self {
        FeatureValue::Value(value)
    }
}

impl Display for FeatureValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Geometry(g) => write!(f, "{}", g),
            FeatureValue::Value(v) => write!(f, "{}", v),
        }
    }
}

/// A read-only feature decoded from one document.
///
/// Values are positioned by the feature's [Schema]; attributes the document
/// did not carry hold a null value.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: String,
    schema: Arc<Schema>,
    values: Vec<FeatureValue>,
}

impl Feature {
    pub fn builder(schema: Arc<Schema>) -> FeatureBuilder {
        let values = vec![FeatureValue::default(); schema.attribute_count()];
        FeatureBuilder {
            id: String::new(),
            schema,
            values,
        }
    }

    /// The string form of the document identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn attribute(&self, name: &str) -> Option<&FeatureValue> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    pub fn attribute_at(&self, index: usize) -> Option<&FeatureValue> {
        self.values.get(index)
    }

    /// Shorthand for the non-geometric value of an attribute.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.attribute(name).and_then(FeatureValue::as_value)
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn default_geometry(&self) -> Option<&Geometry> {
        self.schema
            .default_geometry()
            .and_then(|name| self.attribute(name))
            .and_then(FeatureValue::as_geometry)
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let attributes: Vec<String> = self
            .schema
            .attribute_names()
            .zip(self.values.iter())
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        write!(f, "{}.{}[{}]", self.schema.type_name(), self.id, attributes.join(", "))
    }
}

pub struct FeatureBuilder {
    id: String,
    schema: Arc<Schema>,
    values: Vec<FeatureValue>,
}

impl FeatureBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Sets an attribute value; names outside the schema are ignored.
    pub fn set<T: Into<FeatureValue>>(mut self, name: &str, value: T) -> Self {
        self.set_value(name, value.into());
        self
    }

    pub(crate) fn set_value(&mut self, name: &str, value: FeatureValue) {
        match self.schema.index_of(name) {
            Some(index) => self.values[index] = value,
            None => log::warn!(
                "Attribute '{}' is not part of schema '{}'",
                name,
                self.schema.type_name()
            ),
        }
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    pub fn build(self) -> Feature {
        Feature {
            id: self.id,
            schema: self.schema,
            values: self.values,
        }
    }
}
