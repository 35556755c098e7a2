use std::path::PathBuf;

use crate::cli::{load_view, FilterArgs};
use crate::error::Result;
use crate::pdf::write_pdf;
use crate::reports::{build_report, export_file_name, Letterhead, ReportKind};

pub fn run(kind: &str, filters: &FilterArgs, output: Option<String>) -> Result<()> {
    let kind: ReportKind = kind.parse()?;
    let Some(view) = load_view(filters)? else {
        return Ok(());
    };
    let Some(data) = view.data() else {
        return Ok(());
    };

    let document = build_report(kind, data, &view.filter, &Letterhead::from(&view.settings));
    let path = match output {
        Some(p) => PathBuf::from(p),
        None => view
            .settings
            .exports_dir()
            .join(export_file_name(kind, chrono::Local::now().naive_local())),
    };
    write_pdf(&document, &path)?;
    println!("Wrote {} ({} pages)", path.display(), document.page_count());
    Ok(())
}
