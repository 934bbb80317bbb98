use std::cmp::Ordering;

use crate::collection::Document;
use crate::common::{
    SortOrder, Value, COORDINATES, DOC_ID, FIELD_SEPARATOR, OP_AND, OP_BOX, OP_GT, OP_GTE, OP_LT,
    OP_LTE, OP_NOR, OP_OR, OP_WITHIN,
};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::geometry::BoundingBox;

/// Evaluates native queries against documents.
///
/// Understands the subset of the query language the filter translator emits:
/// `$and`, `$or`, `$nor`, field equality (a `null` operand also matches a
/// missing field), `$lt`, `$lte`, `$gt`, `$gte` and `$within: {$box: ..}`.
/// Ordered comparisons only match values of the same kind.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    query: Document,
}

impl QueryMatcher {
    pub fn new(query: &Document) -> Self {
        QueryMatcher {
            query: query.clone(),
        }
    }

    pub fn matches(&self, document: &Document) -> GeoMongoResult<bool> {
        matches_query(&self.query, document)
    }
}

fn matches_query(query: &Document, document: &Document) -> GeoMongoResult<bool> {
    for (key, condition) in query.iter() {
        let matched = match key.as_str() {
            OP_AND => {
                let clauses = clauses(key, condition)?;
                let mut all = true;
                for clause in clauses {
                    if !matches_query(clause, document)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            OP_OR => {
                let clauses = clauses(key, condition)?;
                let mut any = false;
                for clause in clauses {
                    if matches_query(clause, document)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            OP_NOR => {
                let clauses = clauses(key, condition)?;
                let mut any = false;
                for clause in clauses {
                    if matches_query(clause, document)? {
                        any = true;
                        break;
                    }
                }
                !any
            }
            op if op.starts_with('$') => return unknown_operator(op),
            path => matches_field(document.get(path), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(operator: &str, condition: &'a Value) -> GeoMongoResult<Vec<&'a Document>> {
    let invalid = || {
        log::error!("{} expects an array of documents, found {}", operator, condition);
        GeoMongoError::new(
            &format!("{} expects an array of documents", operator),
            ErrorKind::InvalidOperation,
        )
    };

    let array = condition.as_array().ok_or_else(invalid)?;
    array
        .iter()
        .map(|v| v.as_document().ok_or_else(invalid))
        .collect()
}

fn is_operator_document(value: &Value) -> bool {
    match value.as_document() {
        Some(document) => document.keys().next().is_some_and(|k| k.starts_with('$')),
        None => false,
    }
}

fn matches_field(actual: Option<&Value>, condition: &Value) -> GeoMongoResult<bool> {
    if !is_operator_document(condition) {
        return Ok(equals(actual, condition));
    }

    let operators = match condition.as_document() {
        Some(operators) => operators,
        None => return Ok(false),
    };

    for (operator, operand) in operators.iter() {
        let matched = match operator.as_str() {
            OP_LT => ordered(actual, operand, Ordering::is_lt),
            OP_LTE => ordered(actual, operand, Ordering::is_le),
            OP_GT => ordered(actual, operand, Ordering::is_gt),
            OP_GTE => ordered(actual, operand, Ordering::is_ge),
            OP_WITHIN => within(actual, operand)?,
            other => return unknown_operator(other),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(actual) => actual == expected,
    }
}

fn ordered(actual: Option<&Value>, operand: &Value, test: fn(Ordering) -> bool) -> bool {
    match actual {
        Some(actual)
            if (actual.is_number() && operand.is_number())
                || (actual.is_string() && operand.is_string())
                || (actual.is_bool() && operand.is_bool()) =>
        {
            test(actual.cmp(operand))
        }
        _ => false,
    }
}

fn within(actual: Option<&Value>, operand: &Value) -> GeoMongoResult<bool> {
    let shape = operand.as_document().and_then(|d| d.get(OP_BOX));
    let envelope = match shape.and_then(parse_box) {
        Some(envelope) => envelope,
        None => {
            log::error!("{} expects a {} operand, found {}", OP_WITHIN, OP_BOX, operand);
            return Err(GeoMongoError::new(
                &format!("{} expects a {} operand", OP_WITHIN, OP_BOX),
                ErrorKind::InvalidOperation,
            ));
        }
    };

    let mut positions = Vec::new();
    if let Some(actual) = actual {
        collect_positions(actual, &mut positions);
    }

    Ok(!positions.is_empty()
        && positions
            .iter()
            .all(|(x, y)| envelope.contains_point(*x, *y)))
}

fn parse_box(value: &Value) -> Option<BoundingBox> {
    let corners = value.as_array()?;
    if corners.len() != 2 {
        return None;
    }
    let (x1, y1) = position(&corners[0])?;
    let (x2, y2) = position(&corners[1])?;
    Some(BoundingBox::new(x1, y1, x2, y2))
}

fn position(value: &Value) -> Option<(f64, f64)> {
    let ordinates = value.as_array()?;
    if ordinates.len() < 2 {
        return None;
    }
    Some((ordinates[0].as_decimal()?, ordinates[1].as_decimal()?))
}

/// Legacy coordinate pairs: `[x, y]` arrays, nested arrays of them, a
/// GeoJSON object's `coordinates` or an embedded `{x, y}` document.
fn collect_positions(value: &Value, positions: &mut Vec<(f64, f64)>) {
    match value {
        Value::Array(items) => match position(value) {
            Some(p) => positions.push(p),
            None => items.iter().for_each(|v| collect_positions(v, positions)),
        },
        Value::Document(document) => {
            if let Some(coordinates) = document.get(COORDINATES) {
                collect_positions(coordinates, positions);
            } else if document.size() == 2 {
                let values: Vec<f64> = document.iter().filter_map(|(_, v)| v.as_decimal()).collect();
                if let [x, y] = values.as_slice() {
                    positions.push((*x, *y));
                }
            }
        }
        _ => {}
    }
}

fn unknown_operator<T>(operator: &str) -> GeoMongoResult<T> {
    log::error!("Unsupported query operator {}", operator);
    Err(GeoMongoError::new(
        &format!("Unsupported query operator {}", operator),
        ErrorKind::UnsupportedPredicate,
    ))
}

/// Keeps `_id` and the given dotted paths of a document, in document order.
pub fn project(document: &Document, paths: &[String]) -> Document {
    let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
    project_paths(document, &paths, true)
}

fn project_paths(document: &Document, paths: &[&str], top_level: bool) -> Document {
    let mut projected = Document::new();
    for (key, value) in document.iter() {
        if (top_level && key == DOC_ID) || paths.contains(&key.as_str()) {
            projected.put_field(key, value.clone());
            continue;
        }

        let prefix = format!("{}{}", key, FIELD_SEPARATOR);
        let nested: Vec<&str> = paths
            .iter()
            .filter_map(|p| p.strip_prefix(prefix.as_str()))
            .collect();
        if nested.is_empty() {
            continue;
        }

        if let Value::Document(inner) = value {
            let inner = project_paths(inner, &nested, false);
            if !inner.is_empty() {
                projected.put_field(key, inner);
            }
        }
    }
    projected
}

/// Orders documents by the given paths; missing fields sort as null.
pub fn sort_documents(documents: &mut [Document], sort: &[(String, SortOrder)]) {
    if sort.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        for (path, order) in sort {
            let left = a.get_or_null(path);
            let right = b.get_or_null(path);
            let ordering = match order {
                SortOrder::Ascending => left.cmp(&right),
                SortOrder::Descending => right.cmp(&left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
