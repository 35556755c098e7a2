//! Shared filter state and load sequencing for the views that consume it.
//!
//! The filter is held as an `Arc<Filter>` and replaced wholesale. Every
//! replacement issues a new [`LoadTicket`]; a finished load is committed
//! only if its ticket is still the latest one issued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::aggregate::{aggregate, Aggregates};
use crate::error::PainelError;
use crate::models::{Filter, Record};
use crate::source::{fetch_records, RecordSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Default)]
pub struct LoadSequencer {
    latest: AtomicU64,
}

impl LoadSequencer {
    pub fn issue(&self) -> LoadTicket {
        LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug)]
pub struct LoadedData {
    pub records: Vec<Record>,
    pub aggregates: Aggregates,
}

/// Result of one fetch-then-aggregate pass. `NoData` is a successful query
/// with zero rows and is kept apart from `Failed`.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LoadedData),
    NoData,
    Failed(PainelError),
}

impl LoadOutcome {
    pub fn data(&self) -> Option<&LoadedData> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

pub fn load<S: RecordSource + ?Sized>(source: &S, filter: &Filter, page_size: usize) -> LoadOutcome {
    match fetch_records(source, filter, page_size) {
        Ok(records) if records.is_empty() => LoadOutcome::NoData,
        Ok(records) => {
            let aggregates = aggregate(&records);
            LoadOutcome::Loaded(LoadedData {
                records,
                aggregates,
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, "load failed");
            LoadOutcome::Failed(e)
        }
    }
}

/// What the table, chart and report views read from.
#[derive(Debug, Default)]
pub struct Dashboard {
    filter: Arc<Filter>,
    sequencer: LoadSequencer,
    current: Option<(Arc<Filter>, Arc<LoadOutcome>)>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> Arc<Filter> {
        Arc::clone(&self.filter)
    }

    /// Replace the filter and issue the ticket its load must present.
    pub fn set_filter(&mut self, filter: Filter) -> (LoadTicket, Arc<Filter>) {
        self.filter = Arc::new(filter);
        (self.sequencer.issue(), self.filter())
    }

    /// Clear every field back to the default state.
    pub fn reset(&mut self) -> (LoadTicket, Arc<Filter>) {
        self.set_filter(Filter::default())
    }

    /// Store `outcome` if `ticket` is still the latest. Returns false when the
    /// result belongs to a superseded filter and was dropped.
    pub fn commit(&mut self, ticket: LoadTicket, filter: Arc<Filter>, outcome: LoadOutcome) -> bool {
        if !self.sequencer.is_current(ticket) {
            tracing::debug!(?ticket, "discarding superseded load");
            return false;
        }
        self.current = Some((filter, Arc::new(outcome)));
        true
    }

    /// Issue, load and commit in one step.
    pub fn apply<S: RecordSource + ?Sized>(
        &mut self,
        source: &S,
        filter: Filter,
        page_size: usize,
    ) -> Arc<LoadOutcome> {
        let (ticket, filter) = self.set_filter(filter);
        let outcome = load(source, &filter, page_size);
        self.commit(ticket, filter, outcome);
        self.outcome().unwrap_or_else(|| Arc::new(LoadOutcome::NoData))
    }

    pub fn outcome(&self) -> Option<Arc<LoadOutcome>> {
        self.current.as_ref().map(|(_, o)| Arc::clone(o))
    }

    /// Filter the committed outcome was computed for.
    pub fn outcome_filter(&self) -> Option<Arc<Filter>> {
        self.current.as_ref().map(|(f, _)| Arc::clone(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::{sample_rows, MemorySource};
    use rust_decimal::Decimal;

    #[test]
    fn test_tickets_increase() {
        let seq = LoadSequencer::default();
        let a = seq.issue();
        let b = seq.issue();
        assert!(b > a);
        assert!(!seq.is_current(a));
        assert!(seq.is_current(b));
    }

    #[test]
    fn test_out_of_order_completion_keeps_latest() {
        let source = MemorySource::new(sample_rows(60));
        let mut dash = Dashboard::new();

        let (old_ticket, old_filter) = dash.set_filter(Filter {
            year: Some(2024),
            month: Some(1),
            ..Filter::default()
        });
        let (new_ticket, new_filter) = dash.set_filter(Filter {
            year: Some(2024),
            month: Some(2),
            ..Filter::default()
        });

        let newer = load(&source, &new_filter, 1000);
        let older = load(&source, &old_filter, 1000);
        assert!(dash.commit(new_ticket, Arc::clone(&new_filter), newer));
        assert!(!dash.commit(old_ticket, old_filter, older));

        assert_eq!(dash.outcome_filter().unwrap(), new_filter);
        let outcome = dash.outcome().unwrap();
        let data = outcome.data().unwrap();
        assert!(data
            .records
            .iter()
            .all(|r| r.date.map(|d| d.format("%m").to_string()).as_deref() == Some("02")));
    }

    #[test]
    fn test_no_data_vs_failed() {
        let source = MemorySource::new(sample_rows(10));
        let f = Filter {
            year: Some(1999),
            ..Filter::default()
        };
        assert!(matches!(load(&source, &f, 1000), LoadOutcome::NoData));

        let broken = MemorySource::new(sample_rows(10)).fail_at_offset(0);
        assert!(matches!(
            load(&broken, &Filter::default(), 1000),
            LoadOutcome::Failed(PainelError::Fetch(_))
        ));
    }

    #[test]
    fn test_apply_loads_and_aggregates() {
        let source = MemorySource::new(sample_rows(4));
        let mut dash = Dashboard::new();
        let outcome = dash.apply(&source, Filter::default(), 1000);
        let data = outcome.data().unwrap();
        assert_eq!(data.aggregates.record_count, 4);
        assert_eq!(data.aggregates.totals.revenue, Decimal::from(200));
        assert_eq!(data.aggregates.totals.net_expense, Decimal::from(100));
    }

    #[test]
    fn test_reset_replaces_filter() {
        let mut dash = Dashboard::new();
        dash.set_filter(Filter {
            year: Some(2024),
            ..Filter::default()
        });
        let before = dash.filter();
        let (_, after) = dash.reset();
        assert!(after.is_empty());
        assert_eq!(before.year, Some(2024));
    }
}
