//! Choices for the category / counterparty / year filter controls.
//!
//! Category choices are resolved under the active filter minus its own
//! category field (likewise for counterparties), so each list stays
//! consistent with everything else that is selected. Years are resolved
//! once, unfiltered.

use std::collections::BTreeSet;

use chrono::Datelike;
use serde::Serialize;

use crate::error::Result;
use crate::models::{parse_iso_date, Filter, Row};
use crate::query::{build_query, Column, Query};
use crate::source::{fetch_all, RecordSource};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub counterparties: Vec<String>,
}

fn distinct_text(rows: &[Row], column: Column) -> Vec<String> {
    rows.iter()
        .filter_map(|r| r.get(column.name()).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn distinct_for<S: RecordSource + ?Sized>(
    source: &S,
    filter: &Filter,
    column: Column,
    page_size: usize,
) -> Result<Vec<String>> {
    let query = build_query(filter)?.select(&[column]);
    let rows = fetch_all(source, &query, page_size)?;
    Ok(distinct_text(&rows, column))
}

pub fn resolve_options<S: RecordSource + ?Sized>(
    source: &S,
    filter: &Filter,
    page_size: usize,
) -> Result<FilterOptions> {
    let categories = distinct_for(source, &filter.without_category(), Column::Category, page_size)?;
    let counterparties = distinct_for(
        source,
        &filter.without_counterparty(),
        Column::Counterparty,
        page_size,
    )?;
    Ok(FilterOptions {
        categories,
        counterparties,
    })
}

/// Distinct years in the whole relation, newest first.
pub fn available_years<S: RecordSource + ?Sized>(source: &S, page_size: usize) -> Result<Vec<i32>> {
    let query = Query::unfiltered().select(&[Column::Date]);
    let rows = fetch_all(source, &query, page_size)?;
    let years: BTreeSet<i32> = rows
        .iter()
        .filter_map(|r| r.get(Column::Date.name()).and_then(|v| v.as_str()))
        .filter_map(parse_iso_date)
        .map(|d| d.year())
        .collect();
    Ok(years.into_iter().rev().collect())
}

/// Holds the current option lists for a set of filter controls.
#[derive(Debug, Default)]
pub struct OptionResolver {
    options: FilterOptions,
    years: Option<Vec<i32>>,
}

impl OptionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn years(&self) -> &[i32] {
        self.years.as_deref().unwrap_or(&[])
    }

    /// Re-resolve for `filter`. On failure the lists are cleared rather than
    /// left holding choices from a previous filter.
    pub fn refresh<S: RecordSource + ?Sized>(
        &mut self,
        source: &S,
        filter: &Filter,
        page_size: usize,
    ) -> Result<&FilterOptions> {
        match resolve_options(source, filter, page_size) {
            Ok(options) => {
                self.options = options;
                Ok(&self.options)
            }
            Err(e) => {
                tracing::warn!(error = %e, "option resolution failed; clearing choices");
                self.options = FilterOptions::default();
                Err(e)
            }
        }
    }

    /// Loads years on first call only.
    pub fn load_years<S: RecordSource + ?Sized>(&mut self, source: &S, page_size: usize) -> Result<&[i32]> {
        if self.years.is_none() {
            match available_years(source, page_size) {
                Ok(years) => self.years = Some(years),
                Err(e) => {
                    tracing::warn!(error = %e, "could not load available years");
                    return Err(e);
                }
            }
        }
        Ok(self.years())
    }
}
