//! Backend-independent page layout.
//!
//! [`DocumentBuilder`] keeps a top-down y cursor in millimetres and records
//! [`DrawCommand`]s per page. A new page starts whenever the next element
//! would cross the content bottom. [`DocumentBuilder::finish`] stamps the
//! same footer on every page once all content is placed.

const MARGIN_TOP: f32 = 15.0;
const MARGIN_SIDE: f32 = 14.0;
/// Content must stay above this distance from the bottom edge.
const CONTENT_BOTTOM: f32 = 22.0;
const FOOTER_RULE: f32 = 15.0;
const FOOTER_TEXT: f32 = 8.0;

const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TABLE_FONT_SIZE: f32 = 8.0;
const ORG_SIZE: f32 = 18.0;
const TITLE_SIZE: f32 = 14.0;
const FOOTER_SIZE: f32 = 10.0;

pub const LINK_GLYPH: &str = "[abrir]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// A4 (width, height) in mm.
    pub fn size(self) -> (f32, f32) {
        match self {
            Self::Portrait => (210.0, 297.0),
            Self::Landscape => (297.0, 210.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// All coordinates are mm from the top-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    /// Clickable area; `y` is the top edge.
    Link {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        url: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub commands: Vec<DrawCommand>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub title: String,
    pub orientation: Orientation,
    pub pages: Vec<Page>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: &'static str,
    pub width: f32,
    pub align: Align,
}

impl TableColumn {
    pub const fn new(header: &'static str, width: f32, align: Align) -> Self {
        Self { header, width, align }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Link { label: String, url: String },
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

/// Cut `text` so it fits in `width`, marking the cut with "...".
fn fit(text: &str, width: f32, size: f32) -> String {
    if approx_text_width(text, size) <= width {
        return text.to_string();
    }
    let max = ((width / (size * 0.18)) as usize).saturating_sub(3);
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

pub struct DocumentBuilder {
    title: String,
    orientation: Orientation,
    width: f32,
    height: f32,
    pages: Vec<Page>,
    y: f32,
}

impl DocumentBuilder {
    pub fn new(title: &str, orientation: Orientation) -> Self {
        let (width, height) = orientation.size();
        Self {
            title: title.to_string(),
            orientation,
            width,
            height,
            pages: vec![Page::default()],
            y: MARGIN_TOP,
        }
    }

    fn right_edge(&self) -> f32 {
        self.width - MARGIN_SIDE
    }

    fn push(&mut self, command: DrawCommand) {
        if let Some(page) = self.pages.last_mut() {
            page.commands.push(command);
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN_TOP;
    }

    /// Break to a new page when `needed` mm would cross the content bottom.
    /// Returns true if a break happened.
    fn ensure_space(&mut self, needed: f32) -> bool {
        if self.y + needed > self.height - CONTENT_BOTTOM {
            self.new_page();
            return true;
        }
        false
    }

    fn text_at(&mut self, text: &str, x: f32, width: f32, align: Align, size: f32, bold: bool) {
        let tw = approx_text_width(text, size);
        let x = match align {
            Align::Left => x,
            Align::Center => x + (width - tw) / 2.0,
            Align::Right => x + width - tw,
        };
        let y = self.y;
        self.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            size,
            bold,
        });
    }

    fn hline(&mut self) {
        let (x1, x2, y) = (MARGIN_SIDE, self.right_edge(), self.y);
        self.push(DrawCommand::Line { x1, y1: y, x2, y2: y });
    }

    /// Organization name and report name, centred, then a rule.
    pub fn title_block(&mut self, organization: &str, report_name: &str) {
        let span = self.right_edge() - MARGIN_SIDE;
        self.text_at(organization, MARGIN_SIDE, span, Align::Center, ORG_SIZE, true);
        self.y += 8.0;
        self.text_at(report_name, MARGIN_SIDE, span, Align::Center, TITLE_SIZE, false);
        self.y += 5.0;
        self.hline();
        self.y += 6.0;
    }

    /// Applied-filter lines. Draws nothing for an empty list.
    pub fn filter_block(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        self.section_label("Filtros aplicados");
        for line in lines {
            self.ensure_space(ROW_H);
            self.text_at(line, MARGIN_SIDE + 2.0, 0.0, Align::Left, FONT_SIZE, false);
            self.y += ROW_H;
        }
        self.blank_row();
    }

    pub fn section_label(&mut self, label: &str) {
        self.ensure_space(ROW_H * 2.0);
        self.text_at(label, MARGIN_SIDE, 0.0, Align::Left, FONT_SIZE + 1.0, true);
        self.y += ROW_H + 1.0;
    }

    pub fn blank_row(&mut self) {
        self.y += ROW_H;
    }

    pub fn separator(&mut self) {
        self.hline();
        self.y += 2.0;
    }

    pub fn paragraph(&mut self, text: &str) {
        self.ensure_space(ROW_H);
        self.text_at(text, MARGIN_SIDE, 0.0, Align::Left, FONT_SIZE, false);
        self.y += ROW_H;
    }

    /// Two-column label/value block, values right-aligned.
    pub fn key_values(&mut self, rows: &[(String, String)], bold_last: bool) {
        let label_w = (self.right_edge() - MARGIN_SIDE) * 0.6;
        let value_w = (self.right_edge() - MARGIN_SIDE) - label_w;
        for (i, (label, value)) in rows.iter().enumerate() {
            let bold = bold_last && i + 1 == rows.len();
            self.ensure_space(ROW_H);
            self.text_at(label, MARGIN_SIDE, label_w, Align::Left, FONT_SIZE, bold);
            self.text_at(value, MARGIN_SIDE + label_w, value_w, Align::Right, FONT_SIZE, bold);
            self.y += ROW_H;
        }
    }

    fn table_header(&mut self, columns: &[TableColumn]) {
        let mut x = MARGIN_SIDE;
        for col in columns {
            self.text_at(col.header, x, col.width, col.align, TABLE_FONT_SIZE, true);
            x += col.width;
        }
        self.y += ROW_H - 1.0;
        self.hline();
        self.y += 3.0;
    }

    /// Grid with a header row that is drawn again at the top of every page
    /// the table continues onto.
    pub fn table(&mut self, columns: &[TableColumn], rows: &[Vec<Cell>]) {
        self.ensure_space(ROW_H * 3.0);
        self.table_header(columns);
        for row in rows {
            if self.ensure_space(ROW_H) {
                self.table_header(columns);
            }
            let mut x = MARGIN_SIDE;
            for (col, cell) in columns.iter().zip(row) {
                match cell {
                    Cell::Text(text) => {
                        let text = fit(text, col.width - 1.0, TABLE_FONT_SIZE);
                        self.text_at(&text, x, col.width, col.align, TABLE_FONT_SIZE, false);
                    }
                    Cell::Link { label, url } => {
                        self.text_at(label, x, col.width, col.align, TABLE_FONT_SIZE, false);
                        let (y, width) = (self.y - ROW_H + 1.5, col.width);
                        self.push(DrawCommand::Link {
                            x,
                            y,
                            width,
                            height: ROW_H,
                            url: url.clone(),
                        });
                    }
                }
                x += col.width;
            }
            self.y += ROW_H;
        }
    }

    /// `1. name ........ value` lines.
    pub fn numbered_list(&mut self, items: &[(String, String)]) {
        let span = self.right_edge() - MARGIN_SIDE;
        for (i, (name, value)) in items.iter().enumerate() {
            self.ensure_space(ROW_H + 1.0);
            let label = fit(&format!("{}. {}", i + 1, name), span * 0.7, FONT_SIZE);
            self.text_at(&label, MARGIN_SIDE, span * 0.7, Align::Left, FONT_SIZE, false);
            self.text_at(value, MARGIN_SIDE + span * 0.7, span * 0.3, Align::Right, FONT_SIZE, false);
            self.y += ROW_H + 1.0;
        }
    }

    /// Stamp `footer` on every page and hand back the finished document.
    pub fn finish(mut self, footer: &str) -> LaidOutDocument {
        let (width, height) = (self.width, self.height);
        let right = self.right_edge();
        let size = FOOTER_SIZE;
        let tw = approx_text_width(footer, size);
        for page in &mut self.pages {
            page.commands.push(DrawCommand::Line {
                x1: MARGIN_SIDE,
                y1: height - FOOTER_RULE,
                x2: right,
                y2: height - FOOTER_RULE,
            });
            page.commands.push(DrawCommand::Text {
                text: footer.to_string(),
                x: (width - tw) / 2.0,
                y: height - FOOTER_TEXT,
                size,
                bold: false,
            });
        }
        LaidOutDocument {
            title: self.title,
            orientation: self.orientation,
            pages: self.pages,
        }
    }
}
