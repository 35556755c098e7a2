use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;

use crate::aggregate::Totals;
use crate::cli::{load_view, open_db, FilterArgs};
use crate::error::{PainelError, Result};
use crate::fmt::{date_br, money};
use crate::options::OptionResolver;
use crate::reports::filter_disclosure;
use crate::table::{page_window, paginate, sort_records, SortColumn, SortOrder, TableSort, ROWS_PER_PAGE};

fn amount(val: rust_decimal::Decimal) -> Cell {
    Cell::new(money(val)).set_alignment(CellAlignment::Right)
}

fn print_filters(lines: &[String]) {
    if !lines.is_empty() {
        println!("{}", lines.join(" | ").dimmed());
    }
}

pub fn show(filters: &FilterArgs, sort: Option<&str>, desc: bool, page: usize) -> Result<()> {
    let Some(view) = load_view(filters)? else {
        return Ok(());
    };
    let Some(data) = view.data() else {
        return Ok(());
    };

    let column: SortColumn = sort.map(str::parse::<SortColumn>).transpose()?.unwrap_or(SortColumn::Date);
    let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
    let mut records = data.records.clone();
    sort_records(&mut records, TableSort { column, order });
    let page = paginate(&records, page, ROWS_PER_PAGE);

    let mut table = Table::new();
    table.set_header(vec![
        "Data", "Doc", "Natureza", "Categoria", "Credor", "Descrição", "Receitas", "Desp. Líquida", "Processo",
    ]);
    for r in page.rows {
        table.add_row(vec![
            Cell::new(r.date.map(date_br).unwrap_or_else(|| "-".to_string())),
            Cell::new(r.document_ref.as_deref().unwrap_or("-")),
            Cell::new(r.natureza.map(|n| n.as_str()).unwrap_or("-")),
            Cell::new(r.category.as_deref().unwrap_or("-")),
            Cell::new(r.counterparty.as_deref().unwrap_or("-")),
            Cell::new(r.description.as_deref().unwrap_or("")),
            amount(r.revenue),
            amount(r.net_expense),
            Cell::new(r.attachment_url.as_deref().unwrap_or("")),
        ]);
    }

    print_filters(&filter_disclosure(&view.filter));
    println!("{table}");
    let buttons: Vec<String> = page_window(page.page, page.total_pages)
        .into_iter()
        .map(|n| {
            if n == page.page {
                format!("[{n}]").bold().to_string()
            } else {
                n.to_string()
            }
        })
        .collect();
    println!(
        "Página {} de {} ({} registros)  {}",
        page.page,
        page.total_pages,
        records.len(),
        buttons.join(" ")
    );
    Ok(())
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    record_count: usize,
    totals: &'a Totals,
}

pub fn summary(filters: &FilterArgs, json: bool) -> Result<()> {
    let Some(view) = load_view(filters)? else {
        return Ok(());
    };
    let Some(data) = view.data() else {
        return Ok(());
    };
    let totals = &data.aggregates.totals;

    if json {
        let out = serde_json::to_string_pretty(&SummaryJson {
            record_count: data.aggregates.record_count,
            totals,
        })
        .map_err(|e| PainelError::Other(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["", "Valor"]);
    table.add_row(vec![Cell::new("Receitas".green().bold()), amount(totals.revenue)]);
    table.add_row(vec![Cell::new("Despesa Bruta"), amount(totals.gross_expense)]);
    table.add_row(vec![Cell::new("Deduções"), amount(totals.deductions)]);
    table.add_row(vec![Cell::new("Despesa Líquida".red().bold()), amount(totals.net_expense)]);
    table.add_row(vec![
        Cell::new("Saldo".bold()),
        amount(totals.revenue - totals.net_expense),
    ]);

    print_filters(&filter_disclosure(&view.filter));
    println!("Resumo ({} registros)\n{table}", data.aggregates.record_count);
    Ok(())
}

pub fn charts(filters: &FilterArgs) -> Result<()> {
    let Some(view) = load_view(filters)? else {
        return Ok(());
    };
    let Some(data) = view.data() else {
        return Ok(());
    };
    let charts = &data.aggregates.charts;
    print_filters(&filter_disclosure(&view.filter));

    let mut categories = Table::new();
    categories.set_header(vec!["Categoria", "Despesa Líquida"]);
    for (name, total) in &charts.by_category {
        categories.add_row(vec![Cell::new(name), amount(*total)]);
    }
    println!("Despesas por Categoria\n{categories}");

    let mut monthly = Table::new();
    monthly.set_header(vec!["Mês", "Receitas", "Despesas"]);
    for (key, point) in charts.monthly_sorted() {
        monthly.add_row(vec![Cell::new(key.to_string()), amount(point.revenue), amount(point.expense)]);
    }
    println!("Receitas x Despesas por Mês\n{monthly}");

    let mut top = Table::new();
    top.set_header(vec!["#", "Credor", "Despesa Líquida"]);
    for (i, c) in charts.top_counterparties.iter().enumerate() {
        top.add_row(vec![Cell::new(i + 1), Cell::new(&c.name), amount(c.total)]);
    }
    println!("Top 10 Credores\n{top}");
    Ok(())
}

pub fn options(filters: &FilterArgs) -> Result<()> {
    let filter = filters.to_filter()?;
    let (settings, conn) = open_db()?;
    let mut resolver = OptionResolver::new();
    let years = resolver.load_years(&conn, settings.page_size)?.to_vec();
    let options = resolver.refresh(&conn, &filter, settings.page_size)?;

    let years: Vec<String> = years.iter().map(i32::to_string).collect();
    println!("{} {}", "Anos:".bold(), years.join(", "));
    println!("{}", "Categorias:".bold());
    for c in &options.categories {
        println!("  {c}");
    }
    println!("{}", "Credores:".bold());
    for c in &options.counterparties {
        println!("  {c}");
    }
    Ok(())
}
