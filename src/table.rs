//! Client-side sorting and paging of fetched records for the table view.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::PainelError;
use crate::models::Record;

pub const ROWS_PER_PAGE: usize = 20;
const MAX_PAGE_BUTTONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Date,
    DocumentRef,
    Natureza,
    Category,
    Counterparty,
    Description,
}

impl FromStr for SortColumn {
    type Err = PainelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" | "data" => Ok(Self::Date),
            "doc" | "doc_caixa" => Ok(Self::DocumentRef),
            "natureza" => Ok(Self::Natureza),
            "category" | "categoria" => Ok(Self::Category),
            "counterparty" | "credor" => Ok(Self::Counterparty),
            "description" | "descricao" => Ok(Self::Description),
            other => Err(PainelError::Other(format!("cannot sort by {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort state of the table; clicking the active column flips its order,
/// clicking another column starts ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSort {
    pub column: SortColumn,
    pub order: SortOrder,
}

impl Default for TableSort {
    fn default() -> Self {
        Self {
            column: SortColumn::Date,
            order: SortOrder::Asc,
        }
    }
}

impl TableSort {
    pub fn toggled(self, column: SortColumn) -> Self {
        let order = if self.column == column && self.order == SortOrder::Asc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        Self { column, order }
    }
}

fn text_key(r: &Record, column: SortColumn) -> Option<&str> {
    match column {
        SortColumn::Date => None,
        SortColumn::DocumentRef => r.document_ref.as_deref(),
        SortColumn::Natureza => r.natureza.map(|n| n.as_str()),
        SortColumn::Category => r.category.as_deref(),
        SortColumn::Counterparty => r.counterparty.as_deref(),
        SortColumn::Description => r.description.as_deref(),
    }
}

fn compare(a: &Record, b: &Record, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Date => a.date.cmp(&b.date),
        _ => text_key(a, column).cmp(&text_key(b, column)),
    }
}

/// Stable sort; empty fields (including unreadable dates) sort first ascending.
pub fn sort_records(records: &mut [Record], sort: TableSort) {
    records.sort_by(|a, b| {
        let ord = compare(a, b, sort.column);
        match sort.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[derive(Debug, PartialEq)]
pub struct TablePage<'a> {
    pub rows: &'a [Record],
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
}

/// Page `page` (1-based, clamped to the valid range) of `records`.
pub fn paginate(records: &[Record], page: usize, per_page: usize) -> TablePage<'_> {
    let per_page = per_page.max(1);
    let total_pages = records.len().div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));
    let start = ((page - 1) * per_page).min(records.len());
    let end = (start + per_page).min(records.len());
    TablePage {
        rows: &records[start..end],
        page,
        total_pages,
    }
}

/// Page numbers for the pager buttons: a window of up to five pages around
/// `current`, shifted to stay inside `1..=total`.
pub fn page_window(current: usize, total: usize) -> Vec<usize> {
    if total <= 1 {
        return Vec::new();
    }
    let mut start = current.saturating_sub(MAX_PAGE_BUTTONS / 2).max(1);
    let end = (start + MAX_PAGE_BUTTONS - 1).min(total);
    if end + 1 - start < MAX_PAGE_BUTTONS {
        start = (end + 1).saturating_sub(MAX_PAGE_BUTTONS).max(1);
    }
    (start..=end).collect()
}
