//! Load-time filters
//!
//! A filter restricts which rows a load materializes. It is one of three
//! shapes:
//!
//! - [`Filter::Fields`] - per-column sets of accepted values, rendered as a
//!   conjunction of `IN (...)` clauses
//! - [`Filter::Raw`] - a trusted SQL fragment appended verbatim after
//!   `SELECT * FROM <table> WHERE `
//! - [`Filter::Custom`] - a [`RowLoader`] that runs its own query on a
//!   connection and fills the result set itself

use crate::error::{AdapterError, Result};
use crate::rule::{PolicyRule, PTYPE_COLUMN, VALUE_COLUMNS};
use crate::sql::Statement;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use sqlx::AnyConnection;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Columns a [`FieldFilter`] can constrain, in rendering order
const FILTER_COLUMNS: [&str; 7] = [PTYPE_COLUMN, "v0", "v1", "v2", "v3", "v4", "v5"];

/// Caller-controlled row fetch used by [`Filter::Custom`]
///
/// The loader gets a pooled connection and the base query
/// `SELECT * FROM <table> WHERE `. Whatever it leaves in `rows` becomes the
/// loaded policy set as is.
#[async_trait]
pub trait RowLoader: Send + Sync {
    async fn load(
        &self,
        conn: &mut AnyConnection,
        base_query: &str,
        rows: &mut Vec<PolicyRule>,
    ) -> Result<()>;
}

struct FnLoader<F>(F);

#[async_trait]
impl<F> RowLoader for FnLoader<F>
where
    F: for<'c> Fn(&'c mut AnyConnection, &'c str, &'c mut Vec<PolicyRule>) -> BoxFuture<'c, Result<()>>
        + Send
        + Sync,
{
    async fn load(
        &self,
        conn: &mut AnyConnection,
        base_query: &str,
        rows: &mut Vec<PolicyRule>,
    ) -> Result<()> {
        (self.0)(conn, base_query, rows).await
    }
}

/// Accepted values per column
///
/// A column with no entry or an empty list is unconstrained. Keys other than
/// `ptype` and `v0`..`v5` are kept but never applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add accepted values for `field`
    pub fn with<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(field, values);
        self
    }

    pub fn insert<I, S>(&mut self, field: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .entry(field.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Filter on one `ptype` and positional values, where `""` leaves a
    /// position unconstrained
    ///
    /// ```
    /// use cretoai_policy_adapter::FieldFilter;
    ///
    /// // every "p" rule whose action (v2) is "read"
    /// let filter = FieldFilter::positional("p", ["", "", "read"]);
    /// assert_eq!(filter.values("v2"), ["read"]);
    /// assert!(filter.values("v0").is_empty());
    /// ```
    pub fn positional<I, S>(ptype: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::new().with(PTYPE_COLUMN, [ptype.into()]);
        for (column, value) in VALUE_COLUMNS.iter().zip(values) {
            let value = value.into();
            if !value.is_empty() {
                filter.insert(*column, [value]);
            }
        }
        filter
    }

    /// Accepted values for `field`; empty when unconstrained
    pub fn values(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Constrained columns with their values, in table column order
    pub fn constraints(&self) -> impl Iterator<Item = (&'static str, &[String])> + '_ {
        FILTER_COLUMNS
            .iter()
            .map(|column| (*column, self.values(column)))
            .filter(|(_, values)| !values.is_empty())
    }

    /// True when no recognized column is constrained
    pub fn is_unconstrained(&self) -> bool {
        self.constraints().next().is_none()
    }

    /// Whether `rule` passes every constrained column
    pub fn matches(&self, rule: &PolicyRule) -> bool {
        self.constraints().all(|(column, values)| {
            let actual = if column == PTYPE_COLUMN {
                rule.ptype()
            } else {
                let index = VALUE_COLUMNS.iter().position(|c| *c == column).unwrap_or(0);
                rule.field(index)
            };
            values.iter().any(|v| v == actual)
        })
    }

    /// `col IN ($a, $b)` conditions, binding each value on `stmt`
    ///
    /// A value column that accepts `""` is wrapped in `COALESCE` so NULL
    /// cells match it, as they do in [`FieldFilter::matches`].
    pub(crate) fn conditions(&self, stmt: &mut Statement) -> Vec<String> {
        self.constraints()
            .map(|(column, values)| {
                let placeholders: Vec<String> =
                    values.iter().map(|v| stmt.bind(v.as_str())).collect();
                if column != PTYPE_COLUMN && values.iter().any(String::is_empty) {
                    format!("COALESCE({}, '') IN ({})", column, placeholders.join(", "))
                } else {
                    format!("{} IN ({})", column, placeholders.join(", "))
                }
            })
            .collect()
    }
}

/// Which rows a filtered load materializes
#[derive(Clone)]
pub enum Filter {
    /// Per-column accepted values
    Fields(FieldFilter),
    /// Trusted fragment appended to `SELECT * FROM <table> WHERE `
    Raw(String),
    /// Caller-supplied row fetch
    Custom(Arc<dyn RowLoader>),
}

impl Filter {
    /// Wrap a closure as a [`Filter::Custom`]
    ///
    /// ```no_run
    /// use cretoai_policy_adapter::{fetch_rules, Filter};
    ///
    /// let filter = Filter::custom(|conn, base_query, rows| {
    ///     Box::pin(async move {
    ///         *rows = fetch_rules(conn, &format!("{}v0 = 'alice'", base_query)).await?;
    ///         Ok(())
    ///     })
    /// });
    /// ```
    pub fn custom<F>(loader: F) -> Self
    where
        F: for<'c> Fn(&'c mut AnyConnection, &'c str, &'c mut Vec<PolicyRule>) -> BoxFuture<'c, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Filter::Custom(Arc::new(FnLoader(loader)))
    }

    pub fn loader(loader: impl RowLoader + 'static) -> Self {
        Filter::Custom(Arc::new(loader))
    }

    /// False for filters that select the whole table
    pub fn is_restrictive(&self) -> bool {
        match self {
            Filter::Fields(fields) => !fields.is_unconstrained(),
            Filter::Raw(fragment) => !fragment.trim().is_empty(),
            Filter::Custom(_) => true,
        }
    }

    /// Decode a filter from JSON: an object of `field -> [values]` or a string
    /// fragment
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(fragment) => Ok(Filter::Raw(fragment.clone())),
            Value::Object(map) => {
                let mut fields = FieldFilter::new();
                for (field, values) in map {
                    match values {
                        Value::Null => {}
                        Value::Array(items) => {
                            let items = items
                                .iter()
                                .map(|item| {
                                    item.as_str().map(str::to_string).ok_or_else(|| {
                                        AdapterError::InvalidFilterKind(format!(
                                            "values for '{}' must be strings, got {}",
                                            field, item
                                        ))
                                    })
                                })
                                .collect::<Result<Vec<_>>>()?;
                            fields.insert(field.clone(), items);
                        }
                        other => {
                            return Err(AdapterError::InvalidFilterKind(format!(
                                "values for '{}' must be a list, got {}",
                                field, other
                            )))
                        }
                    }
                }
                Ok(Filter::Fields(fields))
            }
            other => Err(AdapterError::InvalidFilterKind(format!(
                "expected a field map or a query fragment, got {}",
                other
            ))),
        }
    }
}

impl TryFrom<Value> for Filter {
    type Error = AdapterError;

    fn try_from(value: Value) -> Result<Self> {
        Filter::from_json(&value)
    }
}

impl From<FieldFilter> for Filter {
    fn from(fields: FieldFilter) -> Self {
        Filter::Fields(fields)
    }
}

impl From<&str> for Filter {
    fn from(fragment: &str) -> Self {
        Filter::Raw(fragment.to_string())
    }
}

impl From<String> for Filter {
    fn from(fragment: String) -> Self {
        Filter::Raw(fragment)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Filter::Raw(fragment) => f.debug_tuple("Raw").field(fragment).finish(),
            Filter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
