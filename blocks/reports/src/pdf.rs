use crate::types::WeeklyReport;
use chrono::NaiveDate;
use printpdf::{
    BuiltinFont, Color, Greyscale, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 14.0;
const MARGIN_BOTTOM: f32 = 20.0;
const TASK_COLUMN_WIDTH: f32 = 52.0;
const SHIFT_COLUMN_WIDTH: f32 = 22.0;
/// Shift columns per table section before wrapping to a new block
const COLUMNS_PER_SECTION: usize = 6;
/// Roughly what fits in 180mm of 11pt Helvetica
const NOTE_LINE_CHARS: usize = 95;

pub fn report_file_name(generated_on: NaiveDate) -> String {
    format!("Shift-Report-{}.pdf", generated_on.format("%Y-%m-%d"))
}

/// Writes top-down in millimetres and opens new pages as needed
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Distance from the top edge
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, String> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| format!("PDF font error: {:?}", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| format!("PDF font error: {:?}", e))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: 22.0,
        })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - MARGIN_BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = 22.0;
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - self.y), font);
    }

    fn grey(&self, level: f32) {
        self.layer
            .set_fill_color(Color::Greyscale(Greyscale::new(level, None)));
    }

    fn finish(self) -> Result<Vec<u8>, String> {
        self.doc
            .save_to_bytes()
            .map_err(|e| format!("PDF write error: {:?}", e))
    }
}

/// Greedy word wrap that keeps the author's line breaks
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

/// Render the weekly matrix and notes. Returns None when there is nothing to report.
pub fn render_report_pdf(report: &WeeklyReport) -> Result<Option<Vec<u8>>, String> {
    if report.is_empty() {
        return Ok(None);
    }

    let mut out = PageWriter::new(&report.title)?;

    out.text(&report.title, 18.0, MARGIN_LEFT, false);
    out.y += 8.0;
    out.grey(0.4);
    out.text(&format!("Week: {}", report.week.label), 11.0, MARGIN_LEFT, false);
    out.grey(0.0);
    out.y += 10.0;

    for (section, columns) in report.columns.chunks(COLUMNS_PER_SECTION).enumerate() {
        let first = section * COLUMNS_PER_SECTION;
        out.ensure_room(10.0 + 7.0 * (report.rows.len() as f32 + 1.0));

        out.text("Task", 10.0, MARGIN_LEFT, true);
        for (i, column) in columns.iter().enumerate() {
            let x = MARGIN_LEFT + TASK_COLUMN_WIDTH + SHIFT_COLUMN_WIDTH * i as f32;
            out.text(&column.day_label, 10.0, x, true);
        }
        out.y += 5.0;
        out.grey(0.4);
        for (i, column) in columns.iter().enumerate() {
            let x = MARGIN_LEFT + TASK_COLUMN_WIDTH + SHIFT_COLUMN_WIDTH * i as f32;
            out.text(&column.start_label, 8.0, x, false);
        }
        out.grey(0.0);
        out.y += 7.0;

        for row in &report.rows {
            out.text(&row.label, 10.0, MARGIN_LEFT, false);
            for i in 0..columns.len() {
                if row.completed.get(first + i).copied().unwrap_or(false) {
                    let x = MARGIN_LEFT + TASK_COLUMN_WIDTH + SHIFT_COLUMN_WIDTH * i as f32;
                    out.text("Yes", 10.0, x, false);
                }
            }
            out.y += 7.0;
        }
        out.y += 6.0;
    }

    out.ensure_room(20.0);
    out.y += 4.0;
    out.text("Shift Notes", 14.0, MARGIN_LEFT, false);
    out.y += 4.0;

    for note in &report.notes {
        let lines = wrap_text(&note.notes, NOTE_LINE_CHARS);
        out.ensure_room(10.0 + 5.0 * lines.len() as f32);
        out.y += 6.0;
        out.text(&format!("{}:", note.heading), 11.0, MARGIN_LEFT + 1.0, true);
        out.y += 7.0;
        for line in &lines {
            out.ensure_room(5.0);
            out.text(line, 11.0, MARGIN_LEFT + 1.0, false);
            out.y += 5.0;
        }
    }

    out.finish().map(Some)
}
