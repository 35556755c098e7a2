use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PainelError, Result};
use crate::query::Column;

/// One row as returned by the relation: column name to loosely typed value.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Natureza {
    #[serde(rename = "RECEITA")]
    Revenue,
    #[serde(rename = "DESPESA")]
    Expense,
}

impl Natureza {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "RECEITA",
            Self::Expense => "DESPESA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "Receita",
            Self::Expense => "Despesa",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "RECEITA" => Some(Self::Revenue),
            "DESPESA" => Some(Self::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NaturezaFilter {
    #[default]
    #[serde(rename = "TODOS")]
    All,
    #[serde(rename = "RECEITA")]
    Revenue,
    #[serde(rename = "DESPESA")]
    Expense,
}

impl NaturezaFilter {
    pub fn natureza(&self) -> Option<Natureza> {
        match self {
            Self::All => None,
            Self::Revenue => Some(Natureza::Revenue),
            Self::Expense => Some(Natureza::Expense),
        }
    }
}

impl FromStr for NaturezaFilter {
    type Err = PainelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "" | "TODOS" | "ALL" => Ok(Self::All),
            "RECEITA" | "REVENUE" => Ok(Self::Revenue),
            "DESPESA" | "EXPENSE" => Ok(Self::Expense),
            other => Err(PainelError::QueryBuild(format!("unknown natureza: {other}"))),
        }
    }
}

/// The active query constraints. Replaced wholesale on every change;
/// `Filter::default()` is the cleared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    #[serde(default)]
    pub natureza: NaturezaFilter,
    pub category: Option<String>,
    pub counterparty: Option<String>,
    pub document_ref: Option<String>,
    pub description: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Filter {
    pub fn category(&self) -> Option<&str> {
        present(&self.category)
    }

    pub fn counterparty(&self) -> Option<&str> {
        present(&self.counterparty)
    }

    pub fn document_ref(&self) -> Option<&str> {
        present(&self.document_ref)
    }

    pub fn description(&self) -> Option<&str> {
        present(&self.description)
    }

    /// True when no field imposes a constraint.
    pub fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.month.is_none()
            && self.year.is_none()
            && self.natureza == NaturezaFilter::All
            && self.category().is_none()
            && self.counterparty().is_none()
            && self.document_ref().is_none()
            && self.description().is_none()
    }

    pub fn without_category(&self) -> Self {
        Self {
            category: None,
            ..self.clone()
        }
    }

    pub fn without_counterparty(&self) -> Self {
        Self {
            counterparty: None,
            ..self.clone()
        }
    }
}

/// One ledger entry, decoded from a fetched row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// `None` when the row's date was missing or unreadable.
    pub date: Option<NaiveDate>,
    pub natureza: Option<Natureza>,
    pub category: Option<String>,
    pub counterparty: Option<String>,
    pub description: Option<String>,
    pub revenue: Decimal,
    pub gross_expense: Decimal,
    pub deductions: Decimal,
    pub net_expense: Decimal,
    pub document_ref: Option<String>,
    pub attachment_url: Option<String>,
}

impl Record {
    /// Decode a row. Never fails: missing or non-numeric amounts become
    /// zero and a missing or unreadable date becomes `None`.
    pub fn from_row(row: &Row) -> Self {
        let date = row
            .get(Column::Date.name())
            .and_then(|v| v.as_str())
            .and_then(parse_iso_date);
        if date.is_none() {
            tracing::warn!(row = %serde_json::Value::Object(row.clone()), "row without a valid date");
        }
        let text = |c: Column| row.get(c.name()).and_then(coerce_text);
        let amount = |c: Column| row.get(c.name()).map(coerce_amount).unwrap_or_default();

        Self {
            date,
            natureza: text(Column::Natureza).as_deref().and_then(Natureza::parse),
            category: text(Column::Category),
            counterparty: text(Column::Counterparty),
            description: text(Column::Description),
            revenue: amount(Column::Revenue),
            gross_expense: amount(Column::GrossExpense),
            deductions: amount(Column::Deductions),
            net_expense: amount(Column::NetExpense),
            document_ref: text(Column::DocumentRef),
            attachment_url: text(Column::Attachment),
        }
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub fn coerce_amount(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .unwrap_or_default(),
        Value::String(s) => Decimal::from_str(s.trim()).unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
