use std::fmt::{Display, Formatter};

use crate::common::SortOrder;
use crate::filter::Filter;

/// Orders results by one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SortBy {
    property: String,
    order: SortOrder,
}

impl SortBy {
    pub fn new(property: &str, order: SortOrder) -> Self {
        SortBy {
            property: property.to_string(),
            order,
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

/// A request for features of one type.
///
/// ```rust
/// use geomongo::common::SortOrder;
/// use geomongo::filter::property;
/// use geomongo::source::Query;
///
/// let query = Query::new("ft1")
///     .filter(property("intProperty").gt(0))
///     .properties(&["intProperty"])
///     .sort_by("intProperty", SortOrder::Descending)
///     .limit(10);
/// assert_eq!(query.type_name(), "ft1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    type_name: String,
    filter: Filter,
    properties: Option<Vec<String>>,
    sort_by: Vec<SortBy>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl Query {
    /// Every feature of the type, all attributes.
    pub fn new(type_name: &str) -> Self {
        Query {
            type_name: type_name.to_string(),
            filter: Filter::Include,
            properties: None,
            sort_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Restricts the returned attributes.
    pub fn properties(mut self, names: &[&str]) -> Self {
        self.properties = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn sort_by(mut self, property: &str, order: SortOrder) -> Self {
        self.sort_by.push(SortBy::new(property, order));
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn filter_ref(&self) -> &Filter {
        &self.filter
    }

    pub fn property_names(&self) -> Option<&[String]> {
        self.properties.as_deref()
    }

    pub fn sort_order(&self) -> &[SortBy] {
        &self.sort_by
    }

    pub fn offset_count(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} where {}", self.type_name, self.filter)?;
        if let Some(properties) = &self.properties {
            write!(f, " select [{}]", properties.join(", "))?;
        }
        if let Some(offset) = self.offset {
            write!(f, " offset {}", offset)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::property;

    #[test]
    fn defaults() {
        let query = Query::new("ft1");
        assert_eq!(query.filter_ref(), &Filter::Include);
        assert!(query.property_names().is_none());
        assert!(query.sort_order().is_empty());
        assert_eq!(query.offset_count(), None);
        assert_eq!(query.limit_count(), None);
    }

    #[test]
    fn builder() {
        let query = Query::new("ft1")
            .filter(property("a").eq(1))
            .properties(&["a", "b"])
            .sort_by("a", SortOrder::Ascending)
            .offset(1)
            .limit(2);
        assert_eq!(query.property_names().unwrap(), &["a".to_string(), "b".to_string()]);
        assert_eq!(query.sort_order()[0].property(), "a");
        assert_eq!(query.sort_order()[0].order(), SortOrder::Ascending);
        assert_eq!(query.to_string(), "ft1 where a = 1 select [a, b] offset 1 limit 2");
    }
}
