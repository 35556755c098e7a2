pub mod import;
pub mod init;
#[cfg(feature = "pdf")]
pub mod export;
pub mod report;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{PainelError, Result};
use crate::importer::parse_date;
use crate::models::{Filter, NaturezaFilter};
use crate::query::build_query;
use crate::session::{Dashboard, LoadOutcome, LoadedData};
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "painel", about = "Filtered revenue/expense reports over a municipal ledger.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the database.
    Init {
        /// Path for painel data (default: ~/Documents/painel)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import ledger rows from a CSV file.
    Import {
        /// CSV with a header row named after the ledger columns
        file: String,
    },
    /// List matching records, 20 per page.
    Show {
        #[command(flatten)]
        filters: FilterArgs,
        /// Sort column: data, doc, natureza, categoria, credor, descricao
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Totals for the matching records.
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Expense per category, monthly series and top counterparties.
    Charts {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Category, counterparty and year choices under the given filters.
    Options {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export a report to PDF.
    #[cfg(feature = "pdf")]
    Export {
        /// financeiro, listagem or credores
        kind: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output path (default: <data_dir>/exports/<kind>-<timestamp>.pdf)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Range start, YYYY-MM-DD or dd/mm/yyyy (used only together with --to)
    #[arg(long = "from")]
    pub from: Option<String>,
    /// Range end, inclusive (used only together with --from)
    #[arg(long = "to")]
    pub to: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    /// 1-12, ignored without --year
    #[arg(long)]
    pub month: Option<u32>,
    /// TODOS, RECEITA or DESPESA
    #[arg(long)]
    pub natureza: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub counterparty: Option<String>,
    /// Substring of the cash document reference
    #[arg(long)]
    pub doc: Option<String>,
    /// Substring of the description
    #[arg(long)]
    pub description: Option<String>,
}

fn flag_date(flag: &str, raw: &Option<String>) -> Result<Option<chrono::NaiveDate>> {
    raw.as_deref()
        .map(|s| parse_date(s).ok_or_else(|| PainelError::QueryBuild(format!("--{flag}: invalid date '{s}'"))))
        .transpose()
}

impl FilterArgs {
    /// Convert and validate; an invalid combination fails here, before any
    /// query is issued.
    pub fn to_filter(&self) -> Result<Filter> {
        let natureza = match &self.natureza {
            Some(n) => n.parse()?,
            None => NaturezaFilter::All,
        };
        let filter = Filter {
            date_from: flag_date("from", &self.from)?,
            date_to: flag_date("to", &self.to)?,
            month: self.month,
            year: self.year,
            natureza,
            category: self.category.clone(),
            counterparty: self.counterparty.clone(),
            document_ref: self.doc.clone(),
            description: self.description.clone(),
        };
        build_query(&filter)?;
        Ok(filter)
    }
}

pub(crate) fn open_db() -> Result<(Settings, Connection)> {
    let settings = load_settings();
    let path = settings.db_path();
    if !path.exists() {
        return Err(PainelError::Other(format!(
            "no database at {}; run `painel init` first",
            path.display()
        )));
    }
    let conn = get_connection(&path)?;
    Ok((settings, conn))
}

/// Loaded state for one command. `None` means the query matched nothing and
/// "No data found" has been printed.
pub(crate) struct View {
    pub settings: Settings,
    pub filter: Arc<Filter>,
    pub outcome: Arc<LoadOutcome>,
}

impl View {
    pub fn data(&self) -> Option<&LoadedData> {
        self.outcome.data()
    }
}

pub(crate) fn load_view(args: &FilterArgs) -> Result<Option<View>> {
    let filter = args.to_filter()?;
    let (settings, conn) = open_db()?;
    let mut dashboard = Dashboard::new();
    let outcome = dashboard.apply(&conn, filter, settings.page_size);
    match &*outcome {
        LoadOutcome::Failed(e) => Err(e.to_owned_error()),
        LoadOutcome::NoData => {
            println!("No data found");
            Ok(None)
        }
        LoadOutcome::Loaded(_) => Ok(Some(View {
            settings,
            filter: dashboard.filter(),
            outcome,
        })),
    }
}
