use std::collections::BTreeSet;

use crate::filter::{ComparisonOperator, Filter};

/// The filter nodes a backend can evaluate natively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCapabilities {
    logical: bool,
    comparisons: BTreeSet<ComparisonOperator>,
    null_check: bool,
    between: bool,
    bbox: bool,
    like: bool,
    intersects: bool,
    id: bool,
}

impl FilterCapabilities {
    /// Supports nothing; every filter is evaluated in-process.
    pub fn none() -> Self {
        FilterCapabilities::default()
    }

    /// What the document store query language supports: the logical
    /// operators, `=`, `<`, `<=`, `>`, `>=`, null checks, between and
    /// bounding boxes.
    pub fn document_store() -> Self {
        FilterCapabilities::none()
            .with_logical()
            .with_comparison(ComparisonOperator::Equal)
            .with_comparison(ComparisonOperator::LessThan)
            .with_comparison(ComparisonOperator::LessThanOrEqual)
            .with_comparison(ComparisonOperator::GreaterThan)
            .with_comparison(ComparisonOperator::GreaterThanOrEqual)
            .with_null_check()
            .with_between()
            .with_bbox()
    }

    pub fn with_logical(mut self) -> Self {
        self.logical = true;
        self
    }

    pub fn with_comparison(mut self, operator: ComparisonOperator) -> Self {
        self.comparisons.insert(operator);
        self
    }

    pub fn with_null_check(mut self) -> Self {
        self.null_check = true;
        self
    }

    pub fn with_between(mut self) -> Self {
        self.between = true;
        self
    }

    pub fn with_bbox(mut self) -> Self {
        self.bbox = true;
        self
    }

    pub fn with_like(mut self) -> Self {
        self.like = true;
        self
    }

    pub fn with_intersects(mut self) -> Self {
        self.intersects = true;
        self
    }

    pub fn with_id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Checks the root node only.
    pub fn supports(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Include | Filter::Exclude => false,
            Filter::And(_) | Filter::Or(_) | Filter::Not(_) => self.logical,
            Filter::Compare { operator, .. } => self.comparisons.contains(operator),
            Filter::IsNull { .. } => self.null_check,
            Filter::Between { .. } => self.between,
            Filter::BBox { .. } => self.bbox,
            Filter::Like { .. } => self.like,
            Filter::Intersects { .. } => self.intersects,
            Filter::Id { .. } => self.id,
        }
    }

    /// Checks the node and all of its descendants.
    pub fn fully_supports(&self, filter: &Filter) -> bool {
        if !self.supports(filter) {
            return false;
        }
        match filter {
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().all(|f| self.fully_supports(f))
            }
            Filter::Not(filter) => self.fully_supports(filter),
            _ => true,
        }
    }
}

/// Splits a filter into a part the backend evaluates natively and a
/// residual part evaluated in-process.
///
/// The conjunction of both parts is equivalent to the input. Conjunctions
/// are split child by child; a disjunction or negation with any unsupported
/// descendant is kept whole in the residual part.
#[derive(Debug, Clone)]
pub struct FilterSplitter {
    capabilities: FilterCapabilities,
}

impl FilterSplitter {
    pub fn new(capabilities: FilterCapabilities) -> Self {
        FilterSplitter { capabilities }
    }

    pub fn capabilities(&self) -> &FilterCapabilities {
        &self.capabilities
    }

    /// Returns `(pre, post)`: `pre` is [Filter::Include] when nothing can be
    /// pushed down and `post` is [Filter::Include] when nothing is left.
    pub fn split(&self, filter: &Filter) -> (Filter, Filter) {
        if self.capabilities.fully_supports(filter) {
            return (filter.clone(), Filter::Include);
        }

        match filter {
            Filter::And(filters) if self.capabilities.supports(filter) => {
                let mut pre = Filter::Include;
                let mut post = Filter::Include;
                for child in filters {
                    let (child_pre, child_post) = self.split(child);
                    pre = pre.and(child_pre);
                    post = post.and(child_post);
                }
                log::trace!("Split {} into pre {} and post {}", filter, pre, post);
                (pre, post)
            }
            Filter::Include => (Filter::Include, Filter::Include),
            other => (Filter::Include, other.clone()),
        }
    }
}
