use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::common::Value;

/// Semantic type of a feature attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// A geometry in the given spatial reference system.
    Geometry { srid: Option<i32> },
    /// A scalar or array value.
    Scalar,
    /// A nested document.
    Map,
}

impl AttributeType {
    /// Infers the non-geometric type of a sample value.
    pub fn of_value(value: &Value) -> AttributeType {
        match value {
            Value::Document(_) => AttributeType::Map,
            _ => AttributeType::Scalar,
        }
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, AttributeType::Geometry { .. })
    }
}

impl Display for AttributeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeType::Geometry { srid: Some(srid) } => write!(f, "Geometry(EPSG:{})", srid),
            AttributeType::Geometry { srid: None } => write!(f, "Geometry"),
            AttributeType::Scalar => write!(f, "Scalar"),
            AttributeType::Map => write!(f, "Map"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    name: String,
    attribute_type: AttributeType,
}

impl AttributeDescriptor {
    pub fn new(name: &str, attribute_type: AttributeType) -> Self {
        AttributeDescriptor {
            name: name.to_string(),
            attribute_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }
}

/// The attribute layout of a feature type.
///
/// A schema is an ordered list of attribute descriptors with a name lookup
/// and a default geometry attribute, which is the first geometry attribute
/// added. Once built it never changes; a feature source builds it once and
/// shares it behind an `Arc` with every feature it decodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    type_name: String,
    attributes: Vec<AttributeDescriptor>,
    index: HashMap<String, usize>,
    default_geometry: Option<String>,
}

impl Schema {
    pub fn builder(type_name: &str) -> SchemaBuilder {
        SchemaBuilder {
            type_name: type_name.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.index_of(name).map(|i| &self.attributes[i])
    }

    pub fn attribute_at(&self, index: usize) -> Option<&AttributeDescriptor> {
        self.attributes.get(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Name of the default geometry attribute.
    pub fn default_geometry(&self) -> Option<&str> {
        self.default_geometry.as_deref()
    }

    /// Returns a schema with only the named attributes, in the order given.
    /// Names that are not part of this schema are skipped.
    pub fn retype(&self, names: &[String]) -> Schema {
        let mut builder = Schema::builder(&self.type_name);
        for name in names {
            match self.attribute(name) {
                Some(descriptor) => {
                    builder = builder.attribute(descriptor.name(), descriptor.attribute_type())
                }
                None => log::warn!(
                    "Attribute '{}' is not part of schema '{}' and is ignored",
                    name,
                    self.type_name
                ),
            }
        }
        builder.build()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let attributes: Vec<String> = self
            .attributes
            .iter()
            .map(|a| format!("{}:{}", a.name, a.attribute_type))
            .collect();
        write!(f, "{}[{}]", self.type_name, attributes.join(", "))
    }
}

pub struct SchemaBuilder {
    type_name: String,
    attributes: Vec<AttributeDescriptor>,
}

impl SchemaBuilder {
    /// Adds an attribute; adding an existing name replaces its type in place.
    pub fn attribute(mut self, name: &str, attribute_type: AttributeType) -> Self {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.attribute_type = attribute_type,
            None => self
                .attributes
                .push(AttributeDescriptor::new(name, attribute_type)),
        }
        self
    }

    pub fn geometry(self, name: &str, srid: Option<i32>) -> Self {
        self.attribute(name, AttributeType::Geometry { srid })
    }

    pub fn scalar(self, name: &str) -> Self {
        self.attribute(name, AttributeType::Scalar)
    }

    pub fn map(self, name: &str) -> Self {
        self.attribute(name, AttributeType::Map)
    }

    pub fn build(self) -> Schema {
        let index = self
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();
        let default_geometry = self
            .attributes
            .iter()
            .find(|a| a.attribute_type.is_geometry())
            .map(|a| a.name.clone());

        Schema {
            type_name: self.type_name,
            attributes: self.attributes,
            index,
            default_geometry,
        }
    }
}
