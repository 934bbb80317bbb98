use crate::collection::Document;
use crate::common::{
    Value, OP_AND, OP_BOX, OP_GT, OP_GTE, OP_LT, OP_LTE, OP_NOR, OP_OR, OP_WITHIN,
};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::filter::{ComparisonOperator, Filter};
use crate::geometry::BoundingBox;
use crate::mapper::{CollectionMapper, Mapper};

/// Translates filters into native document store queries, resolving
/// attribute names to document paths through a mapper.
///
/// | filter              | query                                               |
/// |---------------------|-----------------------------------------------------|
/// | include             | `{}`                                                |
/// | `a AND b`           | `{"$and": [a, b]}`                                  |
/// | `a OR b`            | `{"$or": [a, b]}`                                   |
/// | `NOT a`             | `{"$nor": [a]}`                                     |
/// | `p = v`             | `{path: v}`                                         |
/// | `p < v`             | `{path: {"$lt": v}}` (likewise `$lte`, `$gt`, `$gte`) |
/// | `p IS NULL`         | `{path: null}`                                      |
/// | `p BETWEEN a AND b` | `{path: {"$gte": a, "$lte": b}}`                    |
/// | `BBOX(g, ..)`       | `{geometry_path: {"$within": {"$box": [[x1, y1], [x2, y2]]}}}` |
pub struct FilterToNative<'a> {
    mapper: &'a CollectionMapper,
}

impl<'a> FilterToNative<'a> {
    pub fn new(mapper: &'a CollectionMapper) -> Self {
        FilterToNative { mapper }
    }

    /// Translates a filter.
    ///
    /// # Errors
    ///
    /// [ErrorKind::UnsupportedPredicate] for any node the document store cannot
    /// evaluate; run the filter through a splitter first.
    pub fn translate(&self, filter: &Filter) -> GeoMongoResult<Document> {
        match filter {
            Filter::Include => Ok(Document::new()),
            Filter::And(filters) => self.logical(OP_AND, filters),
            Filter::Or(filters) => self.logical(OP_OR, filters),
            Filter::Not(inner) => {
                let inner = self.translate(inner)?;
                single(OP_NOR, Value::Array(vec![Value::Document(inner)]))
            }
            Filter::Compare {
                property,
                operator,
                value,
            } => {
                let path = self.path(property);
                let operator = match operator {
                    ComparisonOperator::Equal => return single(&path, value.clone()),
                    ComparisonOperator::LessThan => OP_LT,
                    ComparisonOperator::LessThanOrEqual => OP_LTE,
                    ComparisonOperator::GreaterThan => OP_GT,
                    ComparisonOperator::GreaterThanOrEqual => OP_GTE,
                    ComparisonOperator::NotEqual => return unsupported(filter),
                };
                let condition = single(operator, value.clone())?;
                single(&path, Value::Document(condition))
            }
            Filter::IsNull { property } => single(&self.path(property), Value::Null),
            Filter::Between {
                property,
                lower,
                upper,
            } => {
                let mut range = Document::new();
                range.put_field(OP_GTE, lower.clone());
                range.put_field(OP_LTE, upper.clone());
                single(&self.path(property), Value::Document(range))
            }
            Filter::BBox { envelope, .. } => {
                let within = single(OP_BOX, box_corners(envelope))?;
                let condition = single(OP_WITHIN, Value::Document(within))?;
                single(self.mapper.geometry_path(), Value::Document(condition))
            }
            _ => unsupported(filter),
        }
    }

    fn logical(&self, operator: &str, filters: &[Filter]) -> GeoMongoResult<Document> {
        let mut clauses = Vec::with_capacity(filters.len());
        for filter in filters {
            clauses.push(Value::Document(self.translate(filter)?));
        }
        single(operator, Value::Array(clauses))
    }

    fn path(&self, property: &str) -> String {
        if self.mapper.is_geometry_reference(property) {
            self.mapper.geometry_path().to_string()
        } else {
            self.mapper.property_path(property)
        }
    }
}

fn single(key: &str, value: Value) -> GeoMongoResult<Document> {
    let mut document = Document::new();
    document.put_field(key, value);
    Ok(document)
}

fn box_corners(envelope: &BoundingBox) -> Value {
    Value::Array(vec![
        Value::Array(vec![Value::F64(envelope.min_x), Value::F64(envelope.min_y)]),
        Value::Array(vec![Value::F64(envelope.max_x), Value::F64(envelope.max_y)]),
    ])
}

fn unsupported(filter: &Filter) -> GeoMongoResult<Document> {
    log::error!("Filter {} cannot be translated to a native query", filter);
    Err(GeoMongoError::new(
        &format!("Unsupported predicate: {}", filter),
        ErrorKind::UnsupportedPredicate,
    ))
}
