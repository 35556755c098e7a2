//! In-memory relation for tests: evaluates constraints in Rust, records every
//! page request and can be told to fail at a given offset.

use std::cell::RefCell;

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use crate::error::{PainelError, Result};
use crate::models::Row;
use crate::query::{Constraint, Op, Query};

use super::RecordSource;

pub struct MemorySource {
    rows: Vec<Row>,
    fail_at: Option<usize>,
    requests: RefCell<Vec<(usize, usize)>>,
}

impl MemorySource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            fail_at: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn fail_at_offset(mut self, offset: usize) -> Self {
        self.fail_at = Some(offset);
        self
    }

    /// `(offset, limit)` of every page requested so far.
    pub fn requests(&self) -> Vec<(usize, usize)> {
        self.requests.borrow().clone()
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn matches(constraint: &Constraint, row: &Row) -> bool {
    let Some(actual) = text(row.get(constraint.column.name())) else {
        return false;
    };
    let wanted = constraint.value.as_str();
    match constraint.op {
        Op::Eq => actual == wanted,
        Op::Gte => actual.as_str() >= wanted,
        Op::Lte => actual.as_str() <= wanted,
        Op::Lt => actual.as_str() < wanted,
        Op::ILike => actual.to_lowercase().contains(&wanted.to_lowercase()),
    }
}

impl RecordSource for MemorySource {
    fn fetch_page(&self, query: &Query, offset: usize, limit: usize) -> Result<Vec<Row>> {
        self.requests.borrow_mut().push((offset, limit));
        if self.fail_at == Some(offset) {
            return Err(PainelError::Other("connection reset".to_string()));
        }

        let mut hits: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| query.constraints.iter().all(|c| matches(c, row)))
            .collect();
        let key = query.order_by.name();
        hits.sort_by_key(|row| text(row.get(key)));

        Ok(hits
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| {
                query
                    .columns
                    .iter()
                    .map(|c| {
                        let name = c.name().to_string();
                        let value = row.get(c.name()).cloned().unwrap_or(Value::Null);
                        (name, value)
                    })
                    .collect()
            })
            .collect())
    }
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

/// `n` rows, one per day from 2024-01-01, alternating revenue and expense.
pub fn sample_rows(n: usize) -> Vec<Row> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let date = start + Duration::days(i as i64);
            if i % 2 == 0 {
                row(json!({
                    "data": date.format("%Y-%m-%d").to_string(),
                    "natureza": "RECEITA",
                    "descricao": format!("row {i}"),
                    "receitas": 100,
                }))
            } else {
                row(json!({
                    "data": date.format("%Y-%m-%d").to_string(),
                    "natureza": "DESPESA",
                    "categoria": if i % 3 == 0 { "Material" } else { "Serviços" },
                    "credor": format!("Credor {}", i % 5),
                    "descricao": format!("row {i}"),
                    "despesa_bruta": 60,
                    "deducoes": 10,
                    "despesa_liquida": 50,
                }))
            }
        })
        .collect()
}
