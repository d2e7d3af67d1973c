//! Query model for rengu-store.
//!
//! A query is an ordered list of filter terms plus optional pagination and
//! a default boolean operator used by the server to join the terms.

use crate::error::CommandError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator used to combine filter terms that carry no explicit operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    /// All terms must match (`&`).
    #[default]
    #[serde(rename = "&")]
    And,
    /// Any term may match (`|`).
    #[serde(rename = "|")]
    Or,
}

impl Operator {
    /// Returns the wire symbol for the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "&" | "and" => Ok(Self::And),
            "|" | "or" => Ok(Self::Or),
            other => Err(CommandError::InvalidArgument(format!(
                "unknown operator '{other}' (expected and, or, & or |)"
            ))),
        }
    }
}

/// An immutable store query.
///
/// # Examples
///
/// ```
/// use rengu_store::core::{Operator, Query};
///
/// let query = Query::new(["author:Lao Tzu", "tao"])
///     .with_count(10)
///     .with_default_operator(Operator::Or);
/// assert_eq!(query.terms(), ["author:Lao Tzu", "tao"]);
/// assert_eq!(query.count(), Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    /// Filter terms, in order.
    terms: Vec<String>,
    /// Index of the first result to return.
    start: Option<usize>,
    /// Maximum number of results.
    count: Option<usize>,
    /// Operator joining the terms.
    default_operator: Option<Operator>,
}

impl Query {
    /// Creates a query from filter terms.
    pub fn new<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the index of the first result.
    #[must_use]
    pub const fn with_start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    /// Limits the number of results.
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the operator joining the terms.
    #[must_use]
    pub const fn with_default_operator(mut self, operator: Operator) -> Self {
        self.default_operator = Some(operator);
        self
    }

    /// Returns the filter terms.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Returns the start index, if set.
    #[must_use]
    pub const fn start(&self) -> Option<usize> {
        self.start
    }

    /// Returns the result limit, if set.
    #[must_use]
    pub const fn count(&self) -> Option<usize> {
        self.count
    }

    /// Returns the operator joining the terms, if set.
    #[must_use]
    pub const fn default_operator(&self) -> Option<Operator> {
        self.default_operator
    }

    /// Query-string parameters: one `q` per term, then the options that
    /// were set explicitly.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> =
            self.terms.iter().map(|t| ("q", t.clone())).collect();
        if let Some(start) = self.start {
            params.push(("start", start.to_string()));
        }
        if let Some(count) = self.count {
            params.push(("count", count.to_string()));
        }
        if let Some(op) = self.default_operator {
            params.push(("op", op.as_str().to_string()));
        }
        params
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = serde_json::to_string(&self.terms).map_err(|_| fmt::Error)?;
        f.write_str(&terms)
    }
}
