use std::io::BufWriter;
use std::path::Path;

use printpdf::*;

use crate::error::{PainelError, Result};
use crate::layout::{DrawCommand, LaidOutDocument};

fn render_err(e: impl std::fmt::Debug) -> PainelError {
    PainelError::Render(format!("{e:?}"))
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    height: f32,
}

impl PdfWriter {
    fn layer(&self, page: PdfPageIndex, layer: PdfLayerIndex) -> PdfLayerReference {
        self.doc.get_page(page).get_layer(layer)
    }

    /// Layout y grows downwards; PDF y grows upwards.
    fn pdf_y(&self, y: f32) -> f32 {
        self.height - y
    }

    fn draw(&self, layer: &PdfLayerReference, cmd: &DrawCommand) {
        match cmd {
            DrawCommand::Text { text, x, y, size, bold } => {
                let font = if *bold { &self.font_bold } else { &self.font };
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(self.pdf_y(*y)), font);
            }
            DrawCommand::Line { x1, y1, x2, y2 } => {
                layer.set_outline_thickness(0.5);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), Mm(self.pdf_y(*y1))), false),
                        (Point::new(Mm(*x2), Mm(self.pdf_y(*y2))), false),
                    ],
                    is_closed: false,
                });
            }
            DrawCommand::Link { x, y, width, height, url } => {
                let rect = Rect::new(
                    Mm(*x),
                    Mm(self.pdf_y(*y + *height)),
                    Mm(*x + *width),
                    Mm(self.pdf_y(*y)),
                );
                layer.add_link_annotation(LinkAnnotation::new(
                    rect,
                    None,
                    None,
                    Actions::uri(url.clone()),
                    None,
                ));
            }
        }
    }
}

/// Serialize a laid-out document to PDF bytes.
pub fn render(document: &LaidOutDocument) -> Result<Vec<u8>> {
    let (w, h) = document.orientation.size();
    let (doc, first_page, first_layer) = PdfDocument::new(&document.title, Mm(w), Mm(h), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_err)?;
    let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_err)?;
    let writer = PdfWriter {
        doc,
        font,
        font_bold,
        height: h,
    };

    for (i, page) in document.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            writer.doc.add_page(Mm(w), Mm(h), "Layer 1")
        };
        let layer = writer.layer(page_idx, layer_idx);
        for cmd in &page.commands {
            writer.draw(&layer, cmd);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    writer.doc.save(&mut buf).map_err(render_err)?;
    buf.into_inner().map_err(|e| PainelError::Render(e.to_string()))
}

/// Render and write to `path`, creating parent directories as needed.
pub fn write_pdf(document: &LaidOutDocument, path: &Path) -> Result<()> {
    let bytes = render(document)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    tracing::info!(path = %path.display(), pages = document.page_count(), bytes = bytes.len(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Align, Cell, DocumentBuilder, Orientation, TableColumn};

    fn sample() -> LaidOutDocument {
        let cols = [
            TableColumn::new("Nome", 100.0, Align::Left),
            TableColumn::new("Processo", 30.0, Align::Center),
        ];
        let rows: Vec<Vec<Cell>> = (0..80)
            .map(|i| {
                vec![
                    Cell::from(format!("linha {i}")),
                    Cell::Link {
                        label: "[abrir]".to_string(),
                        url: "https://example.org/x.pdf".to_string(),
                    },
                ]
            })
            .collect();
        let mut b = DocumentBuilder::new("Teste", Orientation::Landscape);
        b.title_block("Org", "Relatório de Digitalização");
        b.table(&cols, &rows);
        b.finish("Gerado por Painel do Gestor")
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&sample()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_write_pdf_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports").join("out.pdf");
        write_pdf(&sample(), &path).unwrap();
        assert!(path.exists());
    }
}
