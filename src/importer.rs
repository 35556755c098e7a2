use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::db::insert_entry;
use crate::error::{PainelError, Result};
use crate::models::{parse_iso_date, Natureza};
use crate::query::Column;

/// Parse a money cell. Accepts pt-BR (`R$ 1.234,56`) and plain (`1234.56`)
/// notation. Returns `None` for anything that is not a number.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s = raw.trim().trim_start_matches("R$").trim().replace(' ', "");
    if s.is_empty() {
        return None;
    }
    let normalized = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s
    };
    Decimal::from_str(&normalized).ok()
}

/// `YYYY-MM-DD` or `dd/mm/yyyy`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    parse_iso_date(raw).or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok())
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Semicolon files are common in pt-BR spreadsheets; pick whichever
/// separator the header line uses more.
fn sniff_delimiter(file_path: &Path) -> Result<u8> {
    let content = std::fs::read_to_string(file_path)?;
    let header = content.lines().next().unwrap_or_default();
    let semis = header.matches(';').count();
    let commas = header.matches(',').count();
    Ok(if semis > commas { b';' } else { b',' })
}

#[derive(Debug, Clone, PartialEq)]
struct ParsedEntry {
    date: NaiveDate,
    natureza: Option<String>,
    category: Option<String>,
    counterparty: Option<String>,
    description: Option<String>,
    /// Normalised number, or the raw cell when it did not parse.
    amounts: [Option<String>; 4],
    document_ref: Option<String>,
    attachment_url: Option<String>,
}

const AMOUNT_COLUMNS: [Column; 4] = [
    Column::Revenue,
    Column::GrossExpense,
    Column::Deductions,
    Column::NetExpense,
];

fn parse_file(file_path: &Path) -> Result<(Vec<ParsedEntry>, usize)> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(file_path)?)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(file_path)?;

    let index: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim_start_matches('\u{feff}').to_lowercase(), i))
        .collect();
    if !index.contains_key(Column::Date.name()) {
        return Err(PainelError::Other(format!(
            "{}: missing '{}' column",
            file_path.display(),
            Column::Date.name()
        )));
    }

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = |c: Column| -> Option<String> {
            index
                .get(c.name())
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let Some(date) = cell(Column::Date).as_deref().and_then(parse_date) else {
            tracing::warn!(line = line + 2, "skipping row without a valid date");
            skipped += 1;
            continue;
        };
        let amounts = AMOUNT_COLUMNS.map(|c| {
            cell(c).map(|raw| match parse_amount(&raw) {
                Some(d) => d.to_string(),
                None => raw,
            })
        });
        let natureza = cell(Column::Natureza)
            .map(|raw| Natureza::parse(&raw).map(|n| n.as_str().to_string()).unwrap_or(raw));
        entries.push(ParsedEntry {
            date,
            natureza,
            category: cell(Column::Category),
            counterparty: cell(Column::Counterparty),
            description: cell(Column::Description),
            amounts,
            document_ref: cell(Column::DocumentRef),
            attachment_url: cell(Column::Attachment),
        });
    }
    Ok((entries, skipped))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

/// Load a CSV into `base`. A file whose checksum was already imported is
/// skipped as a whole.
pub fn import_file(conn: &Connection, file_path: &Path) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            tracing::info!(file = %file_path.display(), "file already imported");
            return Ok(ImportResult {
                imported: 0,
                skipped: 0,
                duplicate_file: true,
            });
        }
    }

    let (entries, skipped) = parse_file(file_path)?;
    let min_date = entries.iter().map(|e| e.date).min().map(|d| d.to_string());
    let max_date = entries.iter().map(|e| e.date).max().map(|d| d.to_string());

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO imports (filename, record_count, date_range_start, date_range_end, checksum) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            entries.len() as i64,
            min_date,
            max_date,
            checksum,
        ],
    )?;
    let import_id = tx.last_insert_rowid();
    for e in &entries {
        insert_entry(
            &tx,
            &e.date.to_string(),
            e.natureza.as_deref(),
            e.category.as_deref(),
            e.counterparty.as_deref(),
            e.description.as_deref(),
            [
                e.amounts[0].as_deref(),
                e.amounts[1].as_deref(),
                e.amounts[2].as_deref(),
                e.amounts[3].as_deref(),
            ],
            e.document_ref.as_deref(),
            e.attachment_url.as_deref(),
            Some(import_id),
        )?;
    }
    tx.commit()?;

    tracing::info!(file = %file_path.display(), imported = entries.len(), skipped, "import finished");
    Ok(ImportResult {
        imported: entries.len(),
        skipped,
        duplicate_file: false,
    })
}
