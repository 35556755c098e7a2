//! Translates a [`Filter`] into the constraint list applied to the ledger
//! relation.
//!
//! Date handling, in priority order:
//! 1. explicit range (`date_from`..=`date_to`, inclusive both ends),
//! 2. year + month (half-open month, December rolls into January of the
//!    following year),
//! 3. year only (half-open calendar year),
//! 4. no date constraint.
//!
//! A range with only one bound, or a month without a year, falls through to
//! the next rule. Only an inverted range and an impossible month or year
//! are rejected.

use chrono::NaiveDate;

use crate::error::{PainelError, Result};
use crate::models::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Date,
    DocumentRef,
    Natureza,
    Category,
    Counterparty,
    Description,
    Revenue,
    GrossExpense,
    Deductions,
    NetExpense,
    Attachment,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Date,
        Column::DocumentRef,
        Column::Natureza,
        Column::Category,
        Column::Counterparty,
        Column::Description,
        Column::Revenue,
        Column::GrossExpense,
        Column::Deductions,
        Column::NetExpense,
        Column::Attachment,
    ];

    /// Column name in the `base` relation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "data",
            Self::DocumentRef => "doc_caixa",
            Self::Natureza => "natureza",
            Self::Category => "categoria",
            Self::Counterparty => "credor",
            Self::Description => "descricao",
            Self::Revenue => "receitas",
            Self::GrossExpense => "despesa_bruta",
            Self::Deductions => "deducoes",
            Self::NetExpense => "despesa_liquida",
            Self::Attachment => "processo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gte,
    Lte,
    Lt,
    /// Case-insensitive substring match.
    ILike,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub column: Column,
    pub op: Op,
    pub value: String,
}

impl Constraint {
    fn new(column: Column, op: Op, value: impl Into<String>) -> Self {
        Self {
            column,
            op,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Projection; results carry only these columns.
    pub columns: Vec<Column>,
    /// AND-combined.
    pub constraints: Vec<Constraint>,
    /// Always sorted ascending on this column.
    pub order_by: Column,
}

impl Query {
    /// Every row, every column, date ascending.
    pub fn unfiltered() -> Self {
        Self {
            columns: Column::ALL.to_vec(),
            constraints: Vec::new(),
            order_by: Column::Date,
        }
    }

    pub fn select(mut self, columns: &[Column]) -> Self {
        self.columns = columns.to_vec();
        self
    }
}

pub fn build_query(filter: &Filter) -> Result<Query> {
    let mut constraints = date_constraints(filter)?;

    if let Some(natureza) = filter.natureza.natureza() {
        constraints.push(Constraint::new(Column::Natureza, Op::Eq, natureza.as_str()));
    }
    if let Some(category) = filter.category() {
        constraints.push(Constraint::new(Column::Category, Op::Eq, category));
    }
    if let Some(counterparty) = filter.counterparty() {
        constraints.push(Constraint::new(Column::Counterparty, Op::Eq, counterparty));
    }
    if let Some(doc) = filter.document_ref() {
        constraints.push(Constraint::new(Column::DocumentRef, Op::ILike, doc));
    }
    if let Some(description) = filter.description() {
        constraints.push(Constraint::new(Column::Description, Op::ILike, description));
    }

    Ok(Query {
        constraints,
        ..Query::unfiltered()
    })
}

fn date_constraints(filter: &Filter) -> Result<Vec<Constraint>> {
    if let Some(month) = filter.month {
        check_month(month)?;
    }

    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
        if from > to {
            return Err(PainelError::QueryBuild(format!(
                "date range starts after it ends ({from} > {to})"
            )));
        }
        return Ok(vec![
            Constraint::new(Column::Date, Op::Gte, iso(from)),
            Constraint::new(Column::Date, Op::Lte, iso(to)),
        ]);
    }

    let Some(year) = filter.year else {
        return Ok(Vec::new());
    };
    if !(1000..=9998).contains(&year) {
        return Err(PainelError::QueryBuild(format!("year out of range: {year}")));
    }
    match filter.month {
        Some(month) => {
            let (start, end) = month_bounds(year, month)?;
            Ok(half_open(start, end))
        }
        None => Ok(half_open(ymd(year, 1)?, ymd(year + 1, 1)?)),
    }
}

fn check_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(PainelError::QueryBuild(format!(
            "month must be between 1 and 12, got {month}"
        )));
    }
    Ok(())
}

/// `[year-month-01, next-month-01)`.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    check_month(month)?;
    let start = ymd(year, month)?;
    let end = if month == 12 {
        ymd(year + 1, 1)?
    } else {
        ymd(year, month + 1)?
    };
    Ok((start, end))
}

fn ymd(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| PainelError::QueryBuild(format!("invalid date {year}-{month:02}-01")))
}

fn half_open(start: NaiveDate, end: NaiveDate) -> Vec<Constraint> {
    vec![
        Constraint::new(Column::Date, Op::Gte, iso(start)),
        Constraint::new(Column::Date, Op::Lt, iso(end)),
    ]
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NaturezaFilter;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn date_parts(q: &Query) -> Vec<(Op, String)> {
        q.constraints
            .iter()
            .filter(|c| c.column == Column::Date)
            .map(|c| (c.op, c.value.clone()))
            .collect()
    }

    #[test]
    fn test_empty_filter_has_no_constraints() {
        let q = build_query(&Filter::default()).unwrap();
        assert!(q.constraints.is_empty());
        assert_eq!(q.order_by, Column::Date);
        assert_eq!(q.columns.len(), Column::ALL.len());
    }

    #[test]
    fn test_explicit_range_is_inclusive() {
        let f = Filter {
            date_from: Some(d(2024, 1, 5)),
            date_to: Some(d(2024, 1, 20)),
            ..Filter::default()
        };
        let q = build_query(&f).unwrap();
        assert_eq!(
            date_parts(&q),
            vec![
                (Op::Gte, "2024-01-05".to_string()),
                (Op::Lte, "2024-01-20".to_string())
            ]
        );
    }

    #[test]
    fn test_range_takes_precedence_over_year_month() {
        let f = Filter {
            date_from: Some(d(2023, 6, 1)),
            date_to: Some(d(2023, 6, 30)),
            year: Some(2024),
            month: Some(2),
            ..Filter::default()
        };
        let q = build_query(&f).unwrap();
        assert_eq!(date_parts(&q)[0], (Op::Gte, "2023-06-01".to_string()));
        assert_eq!(date_parts(&q).len(), 2);
    }

    #[test]
    fn test_december_rolls_over() {
        let f = Filter {
            year: Some(2024),
            month: Some(12),
            ..Filter::default()
        };
        let q = build_query(&f).unwrap();
        assert_eq!(
            date_parts(&q),
            vec![
                (Op::Gte, "2024-12-01".to_string()),
                (Op::Lt, "2025-01-01".to_string())
            ]
        );
    }

    #[test]
    fn test_mid_year_month() {
        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(start, d(2024, 2, 1));
        assert_eq!(end, d(2024, 3, 1));
    }

    #[test]
    fn test_year_only() {
        let f = Filter {
            year: Some(2024),
            ..Filter::default()
        };
        let q = build_query(&f).unwrap();
        assert_eq!(
            date_parts(&q),
            vec![
                (Op::Gte, "2024-01-01".to_string()),
                (Op::Lt, "2025-01-01".to_string())
            ]
        );
    }

    #[test]
    fn test_half_range_falls_through_to_year() {
        let f = Filter {
            date_from: Some(d(2024, 3, 1)),
            year: Some(2024),
            ..Filter::default()
        };
        assert_eq!(
            date_parts(&build_query(&f).unwrap()),
            vec![
                (Op::Gte, "2024-01-01".to_string()),
                (Op::Lt, "2025-01-01".to_string())
            ]
        );
        let f = Filter {
            date_to: Some(d(2024, 3, 31)),
            year: Some(2024),
            month: Some(2),
            ..Filter::default()
        };
        assert_eq!(
            date_parts(&build_query(&f).unwrap()),
            vec![
                (Op::Gte, "2024-02-01".to_string()),
                (Op::Lt, "2024-03-01".to_string())
            ]
        );
    }

    #[test]
    fn test_half_range_alone_is_unbounded() {
        let f = Filter {
            date_to: Some(d(2024, 1, 1)),
            ..Filter::default()
        };
        assert!(build_query(&f).unwrap().constraints.is_empty());
    }

    #[test]
    fn test_month_without_year_is_unbounded() {
        let f = Filter {
            month: Some(3),
            ..Filter::default()
        };
        assert!(build_query(&f).unwrap().constraints.is_empty());
        let f = Filter {
            month: Some(13),
            ..Filter::default()
        };
        assert!(matches!(build_query(&f), Err(PainelError::QueryBuild(_))));
    }

    #[test]
    fn test_last_accepted_year() {
        let f = Filter {
            year: Some(9998),
            ..Filter::default()
        };
        assert_eq!(
            date_parts(&build_query(&f).unwrap()),
            vec![
                (Op::Gte, "9998-01-01".to_string()),
                (Op::Lt, "9999-01-01".to_string())
            ]
        );
        let f = Filter {
            year: Some(9998),
            month: Some(12),
            ..Filter::default()
        };
        assert!(build_query(&f).is_ok());
        let f = Filter {
            year: Some(9999),
            ..Filter::default()
        };
        assert!(build_query(&f).is_err());
    }

    #[test]
    fn test_rejects_bad_month_and_inverted_range() {
        assert!(month_bounds(2024, 13).is_err());
        assert!(month_bounds(2024, 0).is_err());
        let f = Filter {
            date_from: Some(d(2024, 2, 1)),
            date_to: Some(d(2024, 1, 1)),
            ..Filter::default()
        };
        assert!(build_query(&f).is_err());
    }

    #[test]
    fn test_equality_and_substring_filters() {
        let f = Filter {
            natureza: NaturezaFilter::Expense,
            category: Some("Material".to_string()),
            counterparty: Some("Papelaria Central".to_string()),
            document_ref: Some("12".to_string()),
            description: Some("papel".to_string()),
            ..Filter::default()
        };
        let q = build_query(&f).unwrap();
        assert_eq!(
            q.constraints,
            vec![
                Constraint::new(Column::Natureza, Op::Eq, "DESPESA"),
                Constraint::new(Column::Category, Op::Eq, "Material"),
                Constraint::new(Column::Counterparty, Op::Eq, "Papelaria Central"),
                Constraint::new(Column::DocumentRef, Op::ILike, "12"),
                Constraint::new(Column::Description, Op::ILike, "papel"),
            ]
        );
    }

    #[test]
    fn test_all_natureza_and_blank_fields_add_nothing() {
        let f = Filter {
            natureza: NaturezaFilter::All,
            category: Some(String::new()),
            document_ref: Some("  ".to_string()),
            ..Filter::default()
        };
        assert!(build_query(&f).unwrap().constraints.is_empty());
    }

    #[test]
    fn test_select_projects_columns() {
        let q = Query::unfiltered().select(&[Column::Category]);
        assert_eq!(q.columns, vec![Column::Category]);
    }
}
