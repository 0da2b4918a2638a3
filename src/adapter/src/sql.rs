//! Statement text with numbered `$N` placeholders
//!
//! Both the PostgreSQL and SQLite drivers accept `$N`, so every statement the
//! adapter issues is built here and executed through the Any driver.

use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;

#[derive(Debug)]
pub(crate) struct Statement {
    sql: String,
    binds: Vec<String>,
}

impl Statement {
    pub(crate) fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Register a bound value and return its placeholder
    pub(crate) fn bind(&mut self, value: impl Into<String>) -> String {
        self.binds.push(value.into());
        format!("${}", self.binds.len())
    }

    /// Append `WHERE a AND b ...`; nothing when `conditions` is empty
    pub(crate) fn push_where(&mut self, conditions: &[String]) -> &mut Self {
        if !conditions.is_empty() {
            self.sql.push_str(" WHERE ");
            self.sql.push_str(&conditions.join(" AND "));
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn query(&self) -> Query<'_, Any, AnyArguments<'_>> {
        self.binds
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| query.bind(value.as_str()))
    }
}
