use crate::error::{PainelError, Result};
use crate::models::{Filter, Record, Row};
use crate::query::{build_query, Query};

#[cfg(test)]
pub mod memory;

/// Rows requested per page.
pub const PAGE_SIZE: usize = 1000;

/// A relation that answers one page of a query at a time, sorted ascending
/// on `query.order_by`.
pub trait RecordSource {
    fn fetch_page(&self, query: &Query, offset: usize, limit: usize) -> Result<Vec<Row>>;
}

/// Request pages from offset 0 until one comes back short or empty.
/// Any page failure discards everything collected so far.
pub fn fetch_all<S: RecordSource + ?Sized>(
    source: &S,
    query: &Query,
    page_size: usize,
) -> Result<Vec<Row>> {
    let page_size = page_size.max(1);
    let mut rows: Vec<Row> = Vec::new();
    let mut offset = 0usize;
    let mut pages = 0usize;

    loop {
        let page = source.fetch_page(query, offset, page_size).map_err(|e| {
            tracing::warn!(offset, page_size, error = %e, "page request failed");
            match e {
                PainelError::Fetch(msg) => PainelError::Fetch(msg),
                other => PainelError::Fetch(format!("page at offset {offset}: {other}")),
            }
        })?;
        pages += 1;
        let len = page.len();
        tracing::debug!(offset, rows = len, "fetched page");

        if len == 0 {
            break;
        }
        rows.extend(page);
        offset += page_size;
        if len < page_size {
            break;
        }
    }

    tracing::info!(rows = rows.len(), pages, "fetch complete");
    Ok(rows)
}

/// Build the query for `filter`, fetch every matching row and decode it.
pub fn fetch_records<S: RecordSource + ?Sized>(
    source: &S,
    filter: &Filter,
    page_size: usize,
) -> Result<Vec<Record>> {
    let query = build_query(filter)?;
    let rows = fetch_all(source, &query, page_size)?;
    Ok(rows.iter().map(Record::from_row).collect())
}
