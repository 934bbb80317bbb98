use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use crate::common::Value;
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};
use crate::feature::{Feature, FeatureValue};
use crate::geometry::{BoundingBox, Geometry};

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// A `LIKE` pattern: `%` matches any run of characters, `_` exactly one and
/// `\` escapes the next character.
///
/// The pattern is compiled to an anchored regular expression once. An
/// invalid pattern is logged and reported as an error when evaluated.
#[derive(Debug, Clone)]
pub struct LikePattern {
    pattern: String,
    regex: Option<Regex>,
}

impl LikePattern {
    pub fn new(pattern: &str) -> Self {
        let regex = match Regex::new(&like_to_regex(pattern)) {
            Ok(regex) => Some(regex),
            Err(e) => {
                log::error!("Invalid like pattern '{}': {}", pattern, e);
                None
            }
        };

        LikePattern {
            pattern: pattern.to_string(),
            regex,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, text: &str) -> GeoMongoResult<bool> {
        match &self.regex {
            Some(regex) => Ok(regex.is_match(text)),
            None => {
                log::error!("Invalid like pattern '{}'", self.pattern);
                Err(GeoMongoError::new(
                    &format!("Invalid like pattern '{}'", self.pattern),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => regex.push_str(&regex::escape(&escaped.to_string())),
                None => regex.push_str(&regex::escape("\\")),
            },
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    regex
}

/// A predicate over features.
///
/// Filters are built with [property] and the free functions of this module
/// and combined with [Filter::and], [Filter::or] and [Filter::not]:
///
/// ```rust
/// use geomongo::filter::property;
///
/// let filter = property("intProperty").gt(0).and(property("stringProperty").like("t%"));
/// assert_eq!(filter.to_string(), "(intProperty > 0 AND stringProperty LIKE 't%')");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches everything.
    Include,
    /// Matches nothing.
    Exclude,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        property: String,
        operator: ComparisonOperator,
        value: Value,
    },
    /// Matches a missing or null attribute.
    IsNull { property: String },
    /// Inclusive range.
    Between {
        property: String,
        lower: Value,
        upper: Value,
    },
    /// Every coordinate of the geometry lies inside the envelope, the same
    /// containment a native `$within` box query tests.
    BBox {
        property: String,
        envelope: BoundingBox,
    },
    Like {
        property: String,
        pattern: LikePattern,
    },
    Intersects {
        property: String,
        geometry: Geometry,
    },
    Id { ids: BTreeSet<String> },
}

/// Matches every feature.
pub fn all() -> Filter {
    Filter::Include
}

/// Matches no feature.
pub fn none() -> Filter {
    Filter::Exclude
}

/// Matches features by identifier.
pub fn id<I, S>(ids: I) -> Filter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Filter::Id {
        ids: ids.into_iter().map(Into::into).collect(),
    }
}

/// Conjunction of all filters; an empty list is [Filter::Include].
pub fn and(filters: Vec<Filter>) -> Filter {
    filters.into_iter().fold(Filter::Include, Filter::and)
}

/// Disjunction of all filters; an empty list is [Filter::Exclude].
pub fn or(filters: Vec<Filter>) -> Filter {
    filters.into_iter().fold(Filter::Exclude, Filter::or)
}

impl Filter {
    /// Combines with `other`, folding away [Filter::Include] and
    /// [Filter::Exclude] and flattening nested conjunctions.
    #[allow(clippy::should_implement_trait)]
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Include, f) | (f, Filter::Include) => f,
            (Filter::Exclude, _) | (_, Filter::Exclude) => Filter::Exclude,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Combines with `other`, folding away [Filter::Include] and
    /// [Filter::Exclude] and flattening nested disjunctions.
    pub fn or(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Include, _) | (_, Filter::Include) => Filter::Include,
            (Filter::Exclude, f) | (f, Filter::Exclude) => f,
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), f) => {
                left.push(f);
                Filter::Or(left)
            }
            (f, Filter::Or(mut right)) => {
                right.insert(0, f);
                Filter::Or(right)
            }
            (a, b) => Filter::Or(vec![a, b]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Filter {
        match self {
            Filter::Include => Filter::Exclude,
            Filter::Exclude => Filter::Include,
            Filter::Not(inner) => *inner,
            f => Filter::Not(Box::new(f)),
        }
    }

    pub fn is_include(&self) -> bool {
        matches!(self, Filter::Include)
    }

    pub fn is_exclude(&self) -> bool {
        matches!(self, Filter::Exclude)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Filter::And(_) | Filter::Or(_) | Filter::Not(_))
    }

    /// Names of all attributes the filter reads.
    pub fn referenced_properties(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_properties(&mut names);
        names
    }

    /// Evaluates the filter against a feature.
    ///
    /// Ordered comparisons only hold between values of the same kind (numbers
    /// with numbers, strings with strings); a missing attribute reads as null.
    pub fn evaluate(&self, feature: &Feature) -> GeoMongoResult<bool> {
        match self {
            Filter::Include => Ok(true),
            Filter::Exclude => Ok(false),
            Filter::And(filters) => {
                for filter in filters {
                    if !filter.evaluate(feature)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(filters) => {
                for filter in filters {
                    if filter.evaluate(feature)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Not(filter) => Ok(!filter.evaluate(feature)?),
            Filter::Compare {
                property,
                operator,
                value,
            } => {
                let actual = attribute_value(feature, property);
                Ok(compare(&actual, *operator, value))
            }
            Filter::IsNull { property } => Ok(attribute_value(feature, property).is_null()),
            Filter::Between {
                property,
                lower,
                upper,
            } => {
                let actual = attribute_value(feature, property);
                Ok(compare(&actual, ComparisonOperator::GreaterThanOrEqual, lower)
                    && compare(&actual, ComparisonOperator::LessThanOrEqual, upper))
            }
            Filter::BBox { property, envelope } => Ok(attribute_geometry(feature, property)
                .map(|g| envelope.contains(&g.bounding_box()))
                .unwrap_or(false)),
            Filter::Like { property, pattern } => match attribute_value(feature, property) {
                Value::String(text) => pattern.is_match(&text),
                _ => Ok(false),
            },
            Filter::Intersects { property, geometry } => {
                Ok(attribute_geometry(feature, property)
                    .map(|g| g.intersects(geometry))
                    .unwrap_or(false))
            }
            Filter::Id { ids } => Ok(ids.contains(feature.id())),
        }
    }

    fn collect_properties(&self, names: &mut BTreeSet<String>) {
        match self {
            Filter::Include | Filter::Exclude | Filter::Id { .. } => {}
            Filter::And(filters) | Filter::Or(filters) => {
                for filter in filters {
                    filter.collect_properties(names);
                }
            }
            Filter::Not(filter) => filter.collect_properties(names),
            Filter::Compare { property, .. }
            | Filter::IsNull { property }
            | Filter::Between { property, .. }
            | Filter::BBox { property, .. }
            | Filter::Like { property, .. }
            | Filter::Intersects { property, .. } => {
                names.insert(property.clone());
            }
        }
    }
}

fn attribute_value(feature: &Feature, property: &str) -> Value {
    feature
        .value(property)
        .cloned()
        .unwrap_or(Value::Null)
}

/// The geometry a spatial predicate reads: the named geometry attribute, or
/// the default geometry when the name is not a geometry attribute.
fn attribute_geometry<'a>(feature: &'a Feature, property: &str) -> Option<&'a Geometry> {
    match feature.attribute(property) {
        Some(FeatureValue::Geometry(geometry)) => Some(geometry),
        _ => feature.default_geometry(),
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    (a.is_number() && b.is_number())
        || (a.is_string() && b.is_string())
        || (a.is_bool() && b.is_bool())
}

fn compare(actual: &Value, operator: ComparisonOperator, expected: &Value) -> bool {
    match operator {
        ComparisonOperator::Equal => actual == expected,
        ComparisonOperator::NotEqual => actual != expected,
        ordered => {
            if !same_kind(actual, expected) {
                return false;
            }
            let ordering = actual.cmp(expected);
            match ordered {
                ComparisonOperator::LessThan => ordering.is_lt(),
                ComparisonOperator::LessThanOrEqual => ordering.is_le(),
                ComparisonOperator::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            }
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn join(filters: &[Filter], separator: &str) -> String {
            let parts: Vec<String> = filters.iter().map(|f| f.to_string()).collect();
            format!("({})", parts.join(separator))
        }

        match self {
            Filter::Include => write!(f, "INCLUDE"),
            Filter::Exclude => write!(f, "EXCLUDE"),
            Filter::And(filters) => write!(f, "{}", join(filters, " AND ")),
            Filter::Or(filters) => write!(f, "{}", join(filters, " OR ")),
            Filter::Not(filter) => write!(f, "NOT {}", filter),
            Filter::Compare {
                property,
                operator,
                value,
            } => {
                let operator = match operator {
                    ComparisonOperator::Equal => "=".to_string(),
                    other => other.to_string(),
                };
                write!(f, "{} {} {}", property, operator, value)
            }
            Filter::IsNull { property } => write!(f, "{} IS NULL", property),
            Filter::Between {
                property,
                lower,
                upper,
            } => write!(f, "{} BETWEEN {} AND {}", property, lower, upper),
            Filter::BBox { property, envelope } => write!(
                f,
                "BBOX({}, {}, {}, {}, {})",
                property, envelope.min_x, envelope.min_y, envelope.max_x, envelope.max_y
            ),
            Filter::Like { property, pattern } => {
                write!(f, "{} LIKE '{}'", property, pattern.pattern())
            }
            Filter::Intersects { property, geometry } => {
                write!(f, "INTERSECTS({}, {})", property, geometry)
            }
            Filter::Id { ids } => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                write!(f, "ID IN ({})", ids.join(", "))
            }
        }
    }
}

/// Starts a fluent filter on an attribute.
pub fn property(name: &str) -> PropertyFilter {
    PropertyFilter {
        property: name.to_string(),
    }
}

/// A fluent builder for filters on one attribute.
pub struct PropertyFilter {
    property: String,
}

impl PropertyFilter {
    fn compare(self, operator: ComparisonOperator, value: Value) -> Filter {
        Filter::Compare {
            property: self.property,
            operator,
            value,
        }
    }

    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOperator::Equal, value.into())
    }

    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOperator::NotEqual, value.into())
    }

    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOperator::LessThan, value.into())
    }

    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOperator::LessThanOrEqual, value.into())
    }

    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOperator::GreaterThan, value.into())
    }

    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOperator::GreaterThanOrEqual, value.into())
    }

    pub fn is_null(self) -> Filter {
        Filter::IsNull {
            property: self.property,
        }
    }

    pub fn between<T: Into<Value>>(self, lower: T, upper: T) -> Filter {
        Filter::Between {
            property: self.property,
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn bbox(self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Filter {
        Filter::BBox {
            property: self.property,
            envelope: BoundingBox::new(min_x, min_y, max_x, max_y),
        }
    }

    pub fn like(self, pattern: &str) -> Filter {
        Filter::Like {
            property: self.property,
            pattern: LikePattern::new(pattern),
        }
    }

    pub fn intersects(self, geometry: Geometry) -> Filter {
        Filter::Intersects {
            property: self.property,
            geometry,
        }
    }
}
