//! Policy rule model
//!
//! A stored rule is a type tag (`ptype`) plus up to [`MAX_FIELDS`] positional
//! string values. Missing positions read as the empty string, and trailing
//! empty values are not part of the logical rule, so `["alice", "data1", ""]`
//! and `["alice", "data1"]` are the same rule.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::Row;
use std::fmt;

/// Number of value columns in the policy table
pub const MAX_FIELDS: usize = 6;

/// Column holding the rule type tag
pub const PTYPE_COLUMN: &str = "ptype";

/// Value columns in positional order
pub const VALUE_COLUMNS: [&str; MAX_FIELDS] = ["v0", "v1", "v2", "v3", "v4", "v5"];

/// One stored policy rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord")]
pub struct PolicyRule {
    ptype: String,
    values: Vec<String>,
}

/// Unchecked wire shape, validated through `TryFrom`
#[derive(Deserialize)]
struct RuleRecord {
    ptype: String,
    #[serde(default)]
    values: Vec<String>,
}

impl TryFrom<RuleRecord> for PolicyRule {
    type Error = AdapterError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        PolicyRule::new(record.ptype, record.values)
    }
}

impl PolicyRule {
    /// Build a rule, rejecting an empty `ptype` or more than [`MAX_FIELDS`] values
    ///
    /// # Example
    /// ```
    /// use cretoai_policy_adapter::PolicyRule;
    ///
    /// let rule = PolicyRule::new("p", ["alice", "data1", "read"]).unwrap();
    /// assert_eq!(rule.field(1), "data1");
    /// assert_eq!(rule.field(4), "");
    /// ```
    pub fn new<I, S>(ptype: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ptype = ptype.into();
        if ptype.is_empty() {
            return Err(AdapterError::MalformedRule("ptype must not be empty".to_string()));
        }

        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        check_arity(&ptype, values.len())?;

        while values.last().is_some_and(|v| v.is_empty()) {
            values.pop();
        }

        Ok(Self { ptype, values })
    }

    /// Map a table row, reading NULL or absent value columns as `""`
    pub fn from_row(row: &AnyRow) -> Result<Self> {
        let ptype: String = row.try_get(PTYPE_COLUMN)?;

        let mut values = Vec::with_capacity(MAX_FIELDS);
        for column in VALUE_COLUMNS {
            let value = match row.try_get::<Option<String>, _>(column) {
                Ok(value) => value.unwrap_or_default(),
                Err(sqlx::Error::ColumnNotFound(_)) => String::new(),
                Err(e) => return Err(e.into()),
            };
            values.push(value);
        }

        Self::new(ptype, values)
    }

    /// Rule type tag
    pub fn ptype(&self) -> &str {
        &self.ptype
    }

    /// Significant values, without trailing empties
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value at `index`, or `""` past the end
    pub fn field(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// All [`MAX_FIELDS`] positions, padded with `""`
    pub fn padded(&self) -> [&str; MAX_FIELDS] {
        std::array::from_fn(|i| self.field(i))
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ptype)?;
        for value in &self.values {
            write!(f, ", {}", value)?;
        }
        Ok(())
    }
}

pub(crate) fn check_arity(ptype: &str, len: usize) -> Result<()> {
    if len > MAX_FIELDS {
        return Err(AdapterError::MalformedRule(format!(
            "rule of type '{}' has {} values, at most {} are stored",
            ptype, len, MAX_FIELDS
        )));
    }
    Ok(())
}
