//! Totals and chart series computed in a single pass over fetched records.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Natureza, Record};

pub const TOP_N: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub revenue: Decimal,
    pub gross_expense: Decimal,
    pub deductions: Decimal,
    pub net_expense: Decimal,
}

/// A calendar month. Orders chronologically; displays as `MM/YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub revenue: Decimal,
    pub expense: Decimal,
}

/// Accumulator keyed by `K` that remembers first-seen order.
#[derive(Debug, Clone)]
struct KeyedSums<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K: Eq + Hash + Clone, V: Default> KeyedSums<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &K) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.entries.push((key.clone(), V::default()));
                self.index.insert(key.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterpartyTotal {
    pub name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartData {
    /// Net expense per category, encounter order. Expense records only;
    /// records without a category are left out.
    pub by_category: Vec<(String, Decimal)>,
    /// Encounter order; use [`ChartData::monthly_sorted`] for display.
    pub monthly: Vec<(MonthKey, MonthlyPoint)>,
    /// At most [`TOP_N`] entries, descending, ties in encounter order.
    pub top_counterparties: Vec<CounterpartyTotal>,
}

impl ChartData {
    pub fn monthly_sorted(&self) -> Vec<(MonthKey, MonthlyPoint)> {
        let mut months = self.monthly.clone();
        months.sort_by_key(|(key, _)| *key);
        months
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty() && self.monthly.is_empty() && self.top_counterparties.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregates {
    pub totals: Totals,
    pub charts: ChartData,
    pub record_count: usize,
    /// Records counted in the totals but left out of the monthly series
    /// because their date was unreadable.
    pub undated_count: usize,
}

pub fn aggregate(records: &[Record]) -> Aggregates {
    let mut totals = Totals::default();
    let mut by_category: KeyedSums<String, Decimal> = KeyedSums::new();
    let mut monthly: KeyedSums<MonthKey, MonthlyPoint> = KeyedSums::new();
    let mut by_counterparty: KeyedSums<String, Decimal> = KeyedSums::new();
    let mut undated_count = 0usize;

    for r in records {
        totals.revenue += r.revenue;
        totals.gross_expense += r.gross_expense;
        totals.deductions += r.deductions;
        totals.net_expense += r.net_expense;

        match r.date {
            Some(date) => {
                let key = MonthKey {
                    year: date.year(),
                    month: date.month(),
                };
                let point = monthly.entry(&key);
                if r.natureza == Some(Natureza::Revenue) {
                    point.revenue += r.revenue;
                } else {
                    point.expense += r.net_expense;
                }
            }
            None => undated_count += 1,
        }

        if r.natureza == Some(Natureza::Expense) {
            if let Some(category) = &r.category {
                *by_category.entry(category) += r.net_expense;
            }
            if let Some(counterparty) = &r.counterparty {
                *by_counterparty.entry(counterparty) += r.net_expense;
            }
        }
    }

    let mut ranked: Vec<CounterpartyTotal> = by_counterparty
        .into_entries()
        .into_iter()
        .map(|(name, total)| CounterpartyTotal { name, total })
        .collect();
    // stable: equal totals keep encounter order
    ranked.sort_by(|a, b| b.total.cmp(&a.total));
    ranked.truncate(TOP_N);

    Aggregates {
        totals,
        charts: ChartData {
            by_category: by_category.into_entries(),
            monthly: monthly.into_entries(),
            top_counterparties: ranked,
        },
        record_count: records.len(),
        undated_count,
    }
}
