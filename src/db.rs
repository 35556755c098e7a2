use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Number, Value};

use crate::error::Result;
use crate::models::Row;
use crate::query::{Column, Op, Query};
use crate::source::RecordSource;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS base (
    id INTEGER PRIMARY KEY,
    data TEXT NOT NULL,
    doc_caixa TEXT,
    natureza TEXT,
    categoria TEXT,
    credor TEXT,
    descricao TEXT,
    receitas NUMERIC,
    despesa_bruta NUMERIC,
    deducoes NUMERIC,
    despesa_liquida NUMERIC,
    processo TEXT,
    import_id INTEGER,
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE INDEX IF NOT EXISTS idx_base_data ON base(data);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// SQL text and bound parameters for one page of `query`.
fn page_sql(query: &Query, offset: usize, limit: usize) -> (String, Vec<String>) {
    let columns: Vec<&str> = query.columns.iter().map(Column::name).collect();
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    for c in &query.constraints {
        let n = params.len() + 1;
        let col = c.column.name();
        let clause = match c.op {
            Op::Eq => format!("{col} = ?{n}"),
            Op::Gte => format!("{col} >= ?{n}"),
            Op::Lte => format!("{col} <= ?{n}"),
            Op::Lt => format!("{col} < ?{n}"),
            Op::ILike => format!("{col} LIKE ?{n} ESCAPE '\\'"),
        };
        clauses.push(clause);
        params.push(match c.op {
            Op::ILike => like_pattern(&c.value),
            _ => c.value.clone(),
        });
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {} FROM base{where_clause} ORDER BY {} ASC, id ASC LIMIT {limit} OFFSET {offset}",
        columns.join(", "),
        query.order_by.name(),
    );
    (sql, params)
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    }
}

impl RecordSource for Connection {
    fn fetch_page(&self, query: &Query, offset: usize, limit: usize) -> Result<Vec<Row>> {
        let (sql, params) = page_sql(query, offset, limit);
        let mut stmt = self.prepare(&sql)?;
        let param_values: Vec<&dyn rusqlite::types::ToSql> = params
            .iter()
            .map(|p| p as &dyn rusqlite::types::ToSql)
            .collect();
        let rows = stmt.query_map(param_values.as_slice(), |row| {
            let mut out = Row::new();
            for (i, c) in query.columns.iter().enumerate() {
                out.insert(c.name().to_string(), json_value(row.get_ref(i)?));
            }
            Ok(out)
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

/// Plain insert used by the importer and tests. Amounts are bound as text
/// so non-numeric values survive to the read side unchanged.
#[allow(clippy::too_many_arguments)]
pub fn insert_entry(
    conn: &Connection,
    date: &str,
    natureza: Option<&str>,
    category: Option<&str>,
    counterparty: Option<&str>,
    description: Option<&str>,
    amounts: [Option<&str>; 4],
    document_ref: Option<&str>,
    attachment_url: Option<&str>,
    import_id: Option<i64>,
) -> Result<()> {
    let [revenue, gross, deductions, net] = amounts;
    conn.execute(
        "INSERT INTO base (data, natureza, categoria, credor, descricao, receitas, despesa_bruta, deducoes, despesa_liquida, doc_caixa, processo, import_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            date, natureza, category, counterparty, description,
            revenue, gross, deductions, net, document_ref, attachment_url, import_id
        ],
    )?;
    Ok(())
}
