//! # Structured Filters
//!
//! Filters are a conjunction of typed predicates. Every store evaluates the
//! same [`Filter`] value, so no layer ever has to interpret a loose bag of
//! fields.

use crate::document::{compare_values, field, values_equal, Document};
use crate::error::ShardError;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;

/// A single condition on a document.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// String field equals value, ignoring case and surrounding whitespace.
    EqIgnoreCase { field: String, value: String },
    /// At least one of `fields` matches `pattern`.
    Matches { fields: Vec<String>, pattern: Regex },
    /// Field lies in `[min, max]`; either bound may be open.
    Range {
        field: String,
        min: Option<Value>,
        max: Option<Value>,
    },
    /// Field is absent or null.
    Missing { field: String },
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn eq_ignore_case(field: impl Into<String>, value: impl AsRef<str>) -> Self {
        Predicate::EqIgnoreCase {
            field: field.into(),
            value: value.as_ref().trim().to_lowercase(),
        }
    }

    /// Case-insensitive substring search over several fields.
    ///
    /// The term is matched literally; regex metacharacters typed into a
    /// search box are escaped.
    pub fn contains_any(fields: &[&str], term: &str) -> Result<Self, ShardError> {
        let pattern = RegexBuilder::new(&regex::escape(term.trim()))
            .case_insensitive(true)
            .build()
            .map_err(|e| ShardError::InvalidQuery(e.to_string()))?;
        Ok(Predicate::Matches {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            pattern,
        })
    }

    pub fn range(field: impl Into<String>, min: Option<Value>, max: Option<Value>) -> Self {
        Predicate::Range {
            field: field.into(),
            min,
            max,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Predicate::Missing {
            field: field.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::Eq { field: name, value } => {
                field(doc, name).is_some_and(|v| values_equal(v, value))
            }
            Predicate::EqIgnoreCase { field: name, value } => field(doc, name)
                .and_then(Value::as_str)
                .is_some_and(|v| v.trim().to_lowercase() == *value),
            Predicate::Matches { fields, pattern } => fields.iter().any(|name| {
                match field(doc, name) {
                    Some(Value::String(s)) => pattern.is_match(s),
                    Some(other) => pattern.is_match(&other.to_string()),
                    None => false,
                }
            }),
            Predicate::Range {
                field: name,
                min,
                max,
            } => match field(doc, name) {
                Some(v) => {
                    let above = min
                        .as_ref()
                        .map_or(true, |m| compare_values(v, m) != Ordering::Less);
                    let below = max
                        .as_ref()
                        .map_or(true, |m| compare_values(v, m) != Ordering::Greater);
                    above && below
                }
                None => false,
            },
            Predicate::Missing { field: name } => field(doc, name).is_none(),
        }
    }
}

/// A conjunction of predicates. The empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(Predicate::eq(field, value))
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.predicates.iter().all(|p| p.matches(doc))
    }
}

impl From<Predicate> for Filter {
    fn from(predicate: Predicate) -> Self {
        Filter::all().and(predicate)
    }
}
