//! Backend contracts and the base filter passed through to them.
//!
//! The search algorithms never talk to a store directly. They hand a list of
//! geocells and an optional [`GeocellQuery`] to a [`GeocellQueryEngine`] and
//! get entities back; each backend adapter decides how to turn that into a
//! native fetch.

use crate::error::{GeocellError, Result};
use geocell_types::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Separator between clauses of a base filter.
const CLAUSE_SEPARATOR: &str = " && ";

/// An entity that can be located and told apart from other entities.
pub trait LocationCapable {
    /// Where the entity is.
    fn location(&self) -> Point;

    /// Stable identity, used to drop duplicates fetched by several queries.
    fn key_string(&self) -> &str;
}

/// A backend able to fetch entities indexed under a set of geocells.
///
/// Implementations must return every entity whose stored geocell list
/// intersects `geocells` and which passes `base_query`, if one is given.
/// Ordering is optional; the searches re-sort by distance themselves.
pub trait GeocellQueryEngine {
    type Entity: LocationCapable;

    fn query(
        &self,
        base_query: Option<&GeocellQuery>,
        order_by: Option<&str>,
        geocells: &[String],
    ) -> Result<Vec<Self::Entity>>;
}

impl<E: GeocellQueryEngine + ?Sized> GeocellQueryEngine for &E {
    type Entity = E::Entity;

    fn query(
        &self,
        base_query: Option<&GeocellQuery>,
        order_by: Option<&str>,
        geocells: &[String],
    ) -> Result<Vec<Self::Entity>> {
        (**self).query(base_query, order_by, geocells)
    }
}

impl<E: GeocellQueryEngine + ?Sized> GeocellQueryEngine for Arc<E> {
    type Entity = E::Entity;

    fn query(
        &self,
        base_query: Option<&GeocellQuery>,
        order_by: Option<&str>,
        geocells: &[String],
    ) -> Result<Vec<Self::Entity>> {
        (**self).query(base_query, order_by, geocells)
    }
}

/// Comparison operator of a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FilterOp {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "==" => Some(FilterOp::Eq),
            "!=" => Some(FilterOp::Ne),
            "<" => Some(FilterOp::Lt),
            "<=" => Some(FilterOp::Le),
            ">" => Some(FilterOp::Gt),
            ">=" => Some(FilterOp::Ge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
        }
    }

    /// Apply the operator to `lhs op rhs`.
    ///
    /// Numbers compare numerically, strings lexically and booleans with
    /// `false < true`. Values of different kinds are only ever unequal.
    pub fn apply(&self, lhs: &Value, rhs: &Value) -> bool {
        let ordering = compare_values(lhs, rhs);
        match self {
            FilterOp::Eq => ordering == Some(Ordering::Equal) || (ordering.is_none() && lhs == rhs),
            FilterOp::Ne => !FilterOp::Eq.apply(lhs, rhs),
            FilterOp::Lt => ordering == Some(Ordering::Less),
            FilterOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Gt => ordering == Some(Ordering::Greater),
            FilterOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compare_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// One `field op parameter` clause bound to its positional value.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub parameter: String,
    pub value: Value,
}

impl FilterClause {
    fn parse(clause: &str, value: Value) -> Result<Self> {
        let tokens: Vec<&str> = clause.split_whitespace().collect();
        let [field, op, parameter] = tokens.as_slice() else {
            return Err(GeocellError::Config(format!(
                "Malformed filter clause '{}'; expected 'field op parameter'",
                clause
            )));
        };

        let op = FilterOp::parse(op).ok_or_else(|| {
            GeocellError::Config(format!(
                "Unknown operator '{}' in filter clause '{}'",
                op, clause
            ))
        })?;

        Ok(Self {
            field: field.to_string(),
            op,
            parameter: parameter.to_string(),
            value,
        })
    }

    /// Whether a field value satisfies the clause. A missing field never does.
    pub fn evaluate(&self, field_value: Option<&Value>) -> bool {
        field_value.is_some_and(|v| self.op.apply(v, &self.value))
    }
}

/// A base filter restricting which entities a search may return.
///
/// The filter is a list of `field op parameter` clauses joined by ` && `,
/// bound positionally to `parameters`. It is checked once, when built, so a
/// clause/parameter mismatch never reaches a backend.
///
/// # Examples
///
/// ```rust
/// use geocell::GeocellQuery;
/// use serde_json::json;
///
/// let query = GeocellQuery::new(
///     "category == categoryParam && rating >= ratingParam",
///     vec![json!("cafe"), json!(4)],
/// )?;
/// assert_eq!(query.clauses().len(), 2);
///
/// assert!(GeocellQuery::new("category == categoryParam", vec![]).is_err());
/// # Ok::<(), geocell::GeocellError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeocellQuery {
    base_query: String,
    declared_parameters: Option<String>,
    parameters: Vec<Value>,
    clauses: Vec<FilterClause>,
}

impl GeocellQuery {
    pub fn new(base_query: impl Into<String>, parameters: Vec<Value>) -> Result<Self> {
        Self::build(base_query.into(), None, parameters)
    }

    /// Like [`GeocellQuery::new`], also recording a parameter declaration
    /// (e.g. `"String categoryParam, int ratingParam"`) for backends that need one.
    pub fn with_declared_parameters(
        base_query: impl Into<String>,
        declared_parameters: impl Into<String>,
        parameters: Vec<Value>,
    ) -> Result<Self> {
        Self::build(
            base_query.into(),
            Some(declared_parameters.into()),
            parameters,
        )
    }

    fn build(
        base_query: String,
        declared_parameters: Option<String>,
        parameters: Vec<Value>,
    ) -> Result<Self> {
        let trimmed = base_query.trim();
        let raw_clauses: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split(CLAUSE_SEPARATOR).collect()
        };

        if !raw_clauses.is_empty() && parameters.is_empty() {
            return Err(GeocellError::Config(format!(
                "Base query '{}' has no parameters",
                trimmed
            )));
        }

        if raw_clauses.len() != parameters.len() {
            return Err(GeocellError::Config(format!(
                "Base query '{}' has {} clauses but {} parameters",
                trimmed,
                raw_clauses.len(),
                parameters.len()
            )));
        }

        let clauses = raw_clauses
            .into_iter()
            .zip(parameters.iter().cloned())
            .map(|(clause, value)| FilterClause::parse(clause, value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base_query,
            declared_parameters,
            parameters,
            clauses,
        })
    }

    pub fn base_query(&self) -> &str {
        &self.base_query
    }

    pub fn declared_parameters(&self) -> Option<&str> {
        self.declared_parameters.as_deref()
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// True when the filter has no clauses and so admits everything.
    pub fn is_unfiltered(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_clause() {
        let query = GeocellQuery::new("category == cat", vec![json!("cafe")]).unwrap();
        assert_eq!(query.clauses().len(), 1);

        let clause = &query.clauses()[0];
        assert_eq!(clause.field, "category");
        assert_eq!(clause.op, FilterOp::Eq);
        assert_eq!(clause.parameter, "cat");
        assert_eq!(clause.value, json!("cafe"));
    }

    #[test]
    fn test_parse_multiple_clauses() {
        let query = GeocellQuery::with_declared_parameters(
            "rating >= minRating && open != closedFlag",
            "int minRating, boolean closedFlag",
            vec![json!(3), json!(false)],
        )
        .unwrap();

        assert_eq!(query.clauses().len(), 2);
        assert_eq!(query.clauses()[1].op, FilterOp::Ne);
        assert_eq!(
            query.declared_parameters(),
            Some("int minRating, boolean closedFlag")
        );
    }

    #[test]
    fn test_empty_filter() {
        let query = GeocellQuery::new("", vec![]).unwrap();
        assert!(query.is_unfiltered());

        let query = GeocellQuery::new("   ", vec![]).unwrap();
        assert!(query.is_unfiltered());
    }

    #[test]
    fn test_missing_parameters() {
        let err = GeocellQuery::new("category == cat", vec![]).unwrap_err();
        assert!(matches!(err, GeocellError::Config(_)));
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let err = GeocellQuery::new("a == p1 && b == p2", vec![json!(1)]).unwrap_err();
        assert!(matches!(err, GeocellError::Config(_)));
        assert!(err.to_string().contains("2 clauses but 1 parameters"));

        assert!(GeocellQuery::new("", vec![json!(1)]).is_err());
    }

    #[test]
    fn test_malformed_clause() {
        assert!(GeocellQuery::new("category cat", vec![json!("x")]).is_err());
        assert!(GeocellQuery::new("category ~= cat", vec![json!("x")]).is_err());
    }

    #[test]
    fn test_operators() {
        assert!(FilterOp::Eq.apply(&json!(1), &json!(1.0)));
        assert!(FilterOp::Ne.apply(&json!("a"), &json!("b")));
        assert!(FilterOp::Lt.apply(&json!(2), &json!(3)));
        assert!(FilterOp::Le.apply(&json!(3), &json!(3)));
        assert!(FilterOp::Gt.apply(&json!("b"), &json!("a")));
        assert!(FilterOp::Ge.apply(&json!(true), &json!(false)));

        // Mismatched kinds never order and are never equal.
        assert!(!FilterOp::Lt.apply(&json!("1"), &json!(2)));
        assert!(!FilterOp::Eq.apply(&json!("1"), &json!(1)));
        assert!(FilterOp::Ne.apply(&json!("1"), &json!(1)));

        for op in ["==", "!=", "<", "<=", ">", ">="] {
            assert_eq!(FilterOp::parse(op).unwrap().as_str(), op);
        }
    }

    #[test]
    fn test_clause_missing_field() {
        let query = GeocellQuery::new("rating > r", vec![json!(2)]).unwrap();
        let clause = &query.clauses()[0];
        assert!(!clause.evaluate(None));
        assert!(clause.evaluate(Some(&json!(4.5))));
        assert!(!clause.evaluate(Some(&json!(1))));
    }
}
