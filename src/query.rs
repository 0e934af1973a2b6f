//! Query configuration handed to an [`ItemDataProvider`](crate::traits::ItemDataProvider).
//!
//! A [`QueryConfig`] bundles everything a provider needs to answer `count`
//! and `load`: a filter expression, sort orders and named parameters. The
//! store never interprets it; it is assembled by the
//! [`DataSource`](crate::source::DataSource) facade and passed through
//! verbatim.
//!
//! ```
//! use itemstore::query::{FilterValue, QueryConfig, QueryFilter, QuerySort};
//!
//! let query = QueryConfig::new()
//!     .with_filter(QueryFilter::eq("status", "open"))
//!     .with_sort(QuerySort::desc("created"))
//!     .with_parameter("tenant", 7i64);
//!
//! assert_eq!(query.parameter("tenant"), Some(&FilterValue::Int(7)));
//! assert_eq!(query.sorts().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Scalar value used in filters and query parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
        }
    }
}

/// Comparison operator of a [`QueryFilter::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Case-insensitive substring match on text values.
    Contains,
    /// Case-insensitive prefix match on text values.
    StartsWith,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Contains => "contains",
            Self::StartsWith => "starts with",
        }
    }
}

/// Filter expression over named item properties.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Compare {
        property: String,
        op: CompareOp,
        value: FilterValue,
    },
    IsNull(String),
    And(Vec<QueryFilter>),
    Or(Vec<QueryFilter>),
    Not(Box<QueryFilter>),
}

impl QueryFilter {
    pub fn compare(property: impl Into<String>, op: CompareOp, value: impl Into<FilterValue>) -> Self {
        Self::Compare {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(property: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::compare(property, CompareOp::Eq, value)
    }

    pub fn contains(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(property, CompareOp::Contains, FilterValue::Text(value.into()))
    }

    pub fn negate(filter: QueryFilter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Combines filters with AND, flattening nested conjunctions.
    ///
    /// Returns `None` for an empty input and the filter itself for a single one.
    pub fn all(filters: impl IntoIterator<Item = QueryFilter>) -> Option<Self> {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Self::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Self::And(parts)),
        }
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, parts: &[QueryFilter], sep: &str) -> fmt::Result {
            f.write_str("(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{part}")?;
            }
            f.write_str(")")
        }

        match self {
            Self::Compare {
                property,
                op,
                value,
            } => write!(f, "{property} {} {value}", op.symbol()),
            Self::IsNull(property) => write!(f, "{property} is null"),
            Self::And(parts) => join(f, parts, "and"),
            Self::Or(parts) => join(f, parts, "or"),
            Self::Not(inner) => write!(f, "not {inner}"),
        }
    }
}

/// Sort direction of a [`QuerySort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A single sort order on a named property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySort {
    pub property: String,
    pub direction: SortDirection,
}

impl QuerySort {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Complete query configuration for one store binding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryConfig {
    filter: Option<QueryFilter>,
    sorts: Vec<QuerySort>,
    parameters: BTreeMap<String, FilterValue>,
}

impl QueryConfig {
    /// Creates an unfiltered, unsorted query with no parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `filter`, AND-ing it with any filter already present.
    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = QueryFilter::all(self.filter.take().into_iter().chain(Some(filter)));
        self
    }

    /// Appends a sort order after the existing ones.
    pub fn with_sort(mut self, sort: QuerySort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn filter(&self) -> Option<&QueryFilter> {
        self.filter.as_ref()
    }

    pub fn sorts(&self) -> &[QuerySort] {
        &self.sorts
    }

    pub fn parameter(&self, name: &str) -> Option<&FilterValue> {
        self.parameters.get(name)
    }

    /// Named parameters in name order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_unconstrained(&self) -> bool {
        self.filter.is_none() && self.sorts.is_empty() && self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_flattens_and_collapses() {
        assert_eq!(QueryFilter::all(Vec::new()), None);

        let single = QueryFilter::eq("a", 1);
        assert_eq!(QueryFilter::all(vec![single.clone()]), Some(single));

        let nested = QueryFilter::And(vec![QueryFilter::eq("a", 1), QueryFilter::eq("b", 2)]);
        let combined = QueryFilter::all(vec![nested, QueryFilter::eq("c", 3)]);
        match combined {
            Some(QueryFilter::And(parts)) => assert_eq!(parts.len(), 3),
            other => panic!("expected flattened conjunction, got {other:?}"),
        }
    }

    #[test]
    fn with_filter_ands_filters() {
        let query = QueryConfig::new()
            .with_filter(QueryFilter::eq("a", 1))
            .with_filter(QueryFilter::IsNull("b".into()));
        assert_eq!(query.filter().map(ToString::to_string).as_deref(), Some("(a = 1 and b is null)"));
    }

    #[test]
    fn display_renders_nested_expression() {
        let filter = QueryFilter::Or(vec![
            QueryFilter::contains("name", "ann"),
            QueryFilter::negate(QueryFilter::eq("active", false)),
        ]);
        assert_eq!(filter.to_string(), "(name contains 'ann' or not active = false)");
    }

    #[test]
    fn parameters_are_name_ordered() {
        let query = QueryConfig::new()
            .with_parameter("z", "last")
            .with_parameter("a", Option::<i64>::None);
        let names: Vec<_> = query.parameters().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "z"]);
        assert_eq!(query.parameter("a"), Some(&FilterValue::Null));
        assert!(!query.is_unconstrained());
        assert!(QueryConfig::new().is_unconstrained());
    }
}
