//! Report documents built from already-loaded state. Nothing here queries
//! the relation again.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::PainelError;
use crate::fmt::{date_br, money, month_name};
use crate::layout::{Align, Cell, DocumentBuilder, LaidOutDocument, Orientation, TableColumn, LINK_GLYPH};
use crate::models::{Filter, Record};
use crate::session::LoadedData;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Totals, per-category expenses and the monthly series.
    Financial,
    /// One row per record.
    Listing,
    /// Top counterparties by net expense.
    Ranking,
}

impl ReportKind {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Financial => "relatorio-financeiro",
            Self::Listing => "relatorio-digitalizacao",
            Self::Ranking => "ranking-credores",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Financial => "Relatório Financeiro",
            Self::Listing => "Relatório de Digitalização",
            Self::Ranking => "Top 10 Credores",
        }
    }

    pub fn orientation(self) -> Orientation {
        match self {
            Self::Listing => Orientation::Landscape,
            Self::Financial | Self::Ranking => Orientation::Portrait,
        }
    }
}

impl FromStr for ReportKind {
    type Err = PainelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "financeiro" | "financial" => Ok(Self::Financial),
            "listagem" | "listing" | "digitalizacao" => Ok(Self::Listing),
            "credores" | "ranking" => Ok(Self::Ranking),
            other => Err(PainelError::Other(format!(
                "unknown report '{other}' (expected financeiro, listagem or credores)"
            ))),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Header and footer text shared by every report.
#[derive(Debug, Clone)]
pub struct Letterhead {
    pub organization: String,
    pub footer: String,
}

impl From<&Settings> for Letterhead {
    fn from(s: &Settings) -> Self {
        Self {
            organization: s.organization_name.clone(),
            footer: s.footer_text.clone(),
        }
    }
}

/// One human-readable line per active filter condition. An explicit range
/// is shown instead of year/month when both bounds are set.
pub fn filter_disclosure(filter: &Filter) -> Vec<String> {
    let mut lines = Vec::new();
    match (filter.date_from, filter.date_to) {
        (Some(from), Some(to)) => {
            lines.push(format!("Período: {} a {}", date_br(from), date_br(to)));
        }
        _ => match (filter.month, filter.year) {
            (Some(m), Some(y)) => {
                let name = month_name(m).map(str::to_string).unwrap_or_else(|| m.to_string());
                lines.push(format!("Mês: {name} de {y}"));
            }
            (None, Some(y)) => lines.push(format!("Ano: {y}")),
            _ => {}
        },
    }
    if let Some(n) = filter.natureza.natureza() {
        lines.push(format!("Natureza: {}", n.label()));
    }
    if let Some(c) = filter.category() {
        lines.push(format!("Categoria: {c}"));
    }
    if let Some(c) = filter.counterparty() {
        lines.push(format!("Credor: {c}"));
    }
    if let Some(d) = filter.document_ref() {
        lines.push(format!("Doc. Caixa: {d}"));
    }
    if let Some(d) = filter.description() {
        lines.push(format!("Descrição: {d}"));
    }
    lines
}

/// `<slug>-<YYYY-MM-DD_HHMMSS>.pdf`
pub fn export_file_name(kind: ReportKind, at: NaiveDateTime) -> String {
    format!("{}-{}.pdf", kind.slug(), at.format("%Y-%m-%d_%H%M%S"))
}

fn dash(field: &Option<String>) -> String {
    field.clone().unwrap_or_else(|| "-".to_string())
}

fn listing_row(r: &Record) -> Vec<Cell> {
    let link = match &r.attachment_url {
        Some(url) => Cell::Link {
            label: LINK_GLYPH.to_string(),
            url: url.clone(),
        },
        None => Cell::from("-"),
    };
    vec![
        Cell::from(r.date.map(date_br).unwrap_or_else(|| "-".to_string())),
        Cell::from(dash(&r.document_ref)),
        Cell::from(r.natureza.map(|n| n.as_str()).unwrap_or("-")),
        Cell::from(dash(&r.category)),
        Cell::from(dash(&r.counterparty)),
        Cell::from(money(r.revenue)),
        Cell::from(money(r.gross_expense)),
        Cell::from(money(r.deductions)),
        Cell::from(money(r.net_expense)),
        link,
    ]
}

const LISTING_COLUMNS: [TableColumn; 10] = [
    TableColumn::new("Data", 20.0, Align::Left),
    TableColumn::new("Doc", 18.0, Align::Left),
    TableColumn::new("Natureza", 20.0, Align::Left),
    TableColumn::new("Categoria", 38.0, Align::Left),
    TableColumn::new("Credor", 55.0, Align::Left),
    TableColumn::new("Receitas", 24.0, Align::Right),
    TableColumn::new("Desp. Bruta", 24.0, Align::Right),
    TableColumn::new("Deduções", 22.0, Align::Right),
    TableColumn::new("Desp. Líquida", 26.0, Align::Right),
    TableColumn::new("Processo", 20.0, Align::Center),
];

const CATEGORY_COLUMNS: [TableColumn; 2] = [
    TableColumn::new("Categoria", 130.0, Align::Left),
    TableColumn::new("Despesa Líquida", 52.0, Align::Right),
];

const MONTHLY_COLUMNS: [TableColumn; 3] = [
    TableColumn::new("Mês", 62.0, Align::Left),
    TableColumn::new("Receitas", 60.0, Align::Right),
    TableColumn::new("Despesas", 60.0, Align::Right),
];

fn financial_body(b: &mut DocumentBuilder, data: &LoadedData) {
    let t = &data.aggregates.totals;
    b.section_label("Resumo");
    b.key_values(
        &[
            ("Receitas".to_string(), money(t.revenue)),
            ("Despesa Bruta".to_string(), money(t.gross_expense)),
            ("Deduções".to_string(), money(t.deductions)),
            ("Despesa Líquida".to_string(), money(t.net_expense)),
        ],
        false,
    );
    b.separator();
    b.key_values(
        &[("Saldo (Receitas - Despesa Líquida)".to_string(), money(t.revenue - t.net_expense))],
        true,
    );
    b.blank_row();

    let charts = &data.aggregates.charts;
    if !charts.by_category.is_empty() {
        b.section_label("Despesas por Categoria");
        let rows: Vec<Vec<Cell>> = charts
            .by_category
            .iter()
            .map(|(name, total)| vec![Cell::from(name.as_str()), Cell::from(money(*total))])
            .collect();
        b.table(&CATEGORY_COLUMNS, &rows);
        b.blank_row();
    }

    let months = charts.monthly_sorted();
    if !months.is_empty() {
        b.section_label("Receitas x Despesas por Mês");
        let rows: Vec<Vec<Cell>> = months
            .iter()
            .map(|(key, p)| {
                vec![
                    Cell::from(key.to_string()),
                    Cell::from(money(p.revenue)),
                    Cell::from(money(p.expense)),
                ]
            })
            .collect();
        b.table(&MONTHLY_COLUMNS, &rows);
    }
}

fn listing_body(b: &mut DocumentBuilder, data: &LoadedData) {
    let rows: Vec<Vec<Cell>> = data.records.iter().map(listing_row).collect();
    b.table(&LISTING_COLUMNS, &rows);
    b.blank_row();
    b.paragraph(&format!("Total de registros: {}", data.records.len()));
}

fn ranking_body(b: &mut DocumentBuilder, data: &LoadedData) {
    let top = &data.aggregates.charts.top_counterparties;
    if top.is_empty() {
        b.paragraph("Nenhuma despesa com credor informado.");
        return;
    }
    b.section_label("Credores por Despesa Líquida");
    let items: Vec<(String, String)> = top.iter().map(|c| (c.name.clone(), money(c.total))).collect();
    b.numbered_list(&items);
}

/// Lay out `kind` for the committed load and the filter it was computed for.
pub fn build_report(kind: ReportKind, data: &LoadedData, filter: &Filter, letterhead: &Letterhead) -> LaidOutDocument {
    let mut b = DocumentBuilder::new(kind.title(), kind.orientation());
    b.title_block(&letterhead.organization, kind.title());
    b.filter_block(&filter_disclosure(filter));
    match kind {
        ReportKind::Financial => financial_body(&mut b, data),
        ReportKind::Listing => listing_body(&mut b, data),
        ReportKind::Ranking => ranking_body(&mut b, data),
    }
    b.finish(&letterhead.footer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::{Natureza, NaturezaFilter};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn expense(day: u32, counterparty: &str, net: i64, url: Option<&str>) -> Record {
        Record {
            date: Some(d(2024, 1, day)),
            natureza: Some(Natureza::Expense),
            category: Some("Material".to_string()),
            counterparty: Some(counterparty.to_string()),
            description: None,
            revenue: Decimal::ZERO,
            gross_expense: Decimal::from(net),
            deductions: Decimal::ZERO,
            net_expense: Decimal::from(net),
            document_ref: Some(format!("CX-{day:03}")),
            attachment_url: url.map(str::to_string),
        }
    }

    fn loaded(records: Vec<Record>) -> LoadedData {
        let aggregates = aggregate(&records);
        LoadedData { records, aggregates }
    }

    fn letterhead() -> Letterhead {
        Letterhead {
            organization: "Câmara Municipal de Araripe".to_string(),
            footer: "Gerado por Painel do Gestor".to_string(),
        }
    }

    fn all_text(doc: &LaidOutDocument) -> Vec<String> {
        doc.pages.iter().flat_map(|p| p.texts().map(str::to_string)).collect()
    }

    #[test]
    fn test_disclosure_empty_filter() {
        assert!(filter_disclosure(&Filter::default()).is_empty());
    }

    #[test]
    fn test_disclosure_month_name() {
        let f = Filter {
            month: Some(12),
            year: Some(2024),
            natureza: NaturezaFilter::Expense,
            counterparty: Some("Papelaria Central".to_string()),
            ..Filter::default()
        };
        assert_eq!(
            filter_disclosure(&f),
            vec!["Mês: Dezembro de 2024", "Natureza: Despesa", "Credor: Papelaria Central"]
        );
    }

    #[test]
    fn test_disclosure_range_wins_over_year() {
        let f = Filter {
            date_from: Some(d(2024, 1, 1)),
            date_to: Some(d(2024, 3, 31)),
            year: Some(2023),
            document_ref: Some(" CX ".to_string()),
            description: Some("papel".to_string()),
            ..Filter::default()
        };
        assert_eq!(
            filter_disclosure(&f),
            vec!["Período: 01/01/2024 a 31/03/2024", "Doc. Caixa: CX", "Descrição: papel"]
        );
    }

    #[test]
    fn test_export_file_name_is_timestamped() {
        let at = d(2024, 5, 7).and_hms_opt(9, 3, 1).unwrap();
        assert_eq!(
            export_file_name(ReportKind::Listing, at),
            "relatorio-digitalizacao-2024-05-07_090301.pdf"
        );
    }

    #[test]
    fn test_report_kind_parse() {
        assert_eq!("credores".parse::<ReportKind>().unwrap(), ReportKind::Ranking);
        assert_eq!("Financeiro".parse::<ReportKind>().unwrap(), ReportKind::Financial);
        assert!("outro".parse::<ReportKind>().is_err());
    }

    #[test]
    fn test_financial_report_contents() {
        let data = loaded(vec![expense(5, "Bazar Sol", 400, None)]);
        let f = Filter {
            year: Some(2024),
            ..Filter::default()
        };
        let doc = build_report(ReportKind::Financial, &data, &f, &letterhead());
        assert_eq!(doc.orientation, Orientation::Portrait);
        let text = all_text(&doc);
        assert!(text.contains(&"Relatório Financeiro".to_string()));
        assert!(text.contains(&"Ano: 2024".to_string()));
        assert!(text.contains(&"R$ 400,00".to_string()));
        assert!(text.contains(&"01/2024".to_string()));
    }

    #[test]
    fn test_no_filter_block_when_unfiltered() {
        let data = loaded(vec![expense(5, "Bazar Sol", 400, None)]);
        let doc = build_report(ReportKind::Ranking, &data, &Filter::default(), &letterhead());
        assert!(!all_text(&doc).contains(&"Filtros aplicados".to_string()));
    }

    #[test]
    fn test_listing_is_landscape_with_links_and_footer_everywhere() {
        let records: Vec<Record> = (1..=28)
            .flat_map(|day| {
                (0..4).map(move |i| {
                    let url = (i == 0).then_some("https://example.org/doc.pdf");
                    expense(day, &format!("Credor {i}"), 10, url)
                })
            })
            .collect();
        let data = loaded(records);
        let doc = build_report(ReportKind::Listing, &data, &Filter::default(), &letterhead());
        assert_eq!(doc.orientation, Orientation::Landscape);
        assert!(doc.page_count() > 1);
        for page in &doc.pages {
            assert!(page.texts().any(|t| t == "Gerado por Painel do Gestor"));
            assert!(page.texts().any(|t| t == "Credor"));
        }
        let links: usize = doc
            .pages
            .iter()
            .flat_map(|p| &p.commands)
            .filter(|c| matches!(c, crate::layout::DrawCommand::Link { .. }))
            .count();
        assert_eq!(links, 28);
    }

    #[test]
    fn test_ranking_is_numbered() {
        let data = loaded(vec![
            expense(1, "Beta", 100, None),
            expense(2, "Gama", 300, None),
        ]);
        let doc = build_report(ReportKind::Ranking, &data, &Filter::default(), &letterhead());
        let text = all_text(&doc);
        assert!(text.contains(&"1. Gama".to_string()));
        assert!(text.contains(&"2. Beta".to_string()));
    }
}
