//! PDF exports: a table on its own, or a combined report.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use printpdf::image_crate::ImageDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::{Artifact, ArtifactStore};
use crate::parser::TableData;
use crate::{ChartwiseError, Result};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
/// Total width shared by all table columns.
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const MAX_IMAGE_HEIGHT: f32 = 240.0;

const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 16.0;
const LINE_HEIGHT: f32 = 6.0;
const ROW_HEIGHT: f32 = 8.0;
/// Rough Helvetica advance at body size, in millimetres per character.
const CHAR_WIDTH: f32 = 1.8;

/// Pieces of a combined report. Missing pieces are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportContents<'a> {
    pub title: &'a str,
    pub summary: Option<&'a str>,
    pub table: Option<&'a TableData>,
    pub bar_chart: Option<&'a Path>,
    pub pie_chart: Option<&'a Path>,
    pub screenshot: Option<&'a Path>,
}

/// Writes `table` to a new PDF with one fixed-width column per header.
pub fn table_pdf(table: &TableData, title: &str, store: &ArtifactStore) -> Result<Artifact> {
    let mut writer = PdfWriter::new(title)?;
    writer.heading(title);
    writer.table(table);

    let path = store.allocate("table", "pdf");
    writer.save(&path)?;
    Ok(Artifact::new(path))
}

/// Writes summary, table, bar chart, pie chart and screenshot pages, in that order.
///
/// Any piece that is absent or cannot be read is left out without affecting
/// the others.
pub fn report_pdf(contents: &ReportContents<'_>, store: &ArtifactStore) -> Result<Artifact> {
    let mut writer = PdfWriter::new(contents.title)?;
    writer.heading(contents.title);

    if let Some(summary) = contents.summary {
        writer.paragraph(summary);
    }
    if let Some(table) = contents.table {
        writer.table(table);
    }

    let images = [("Bar chart", contents.bar_chart), ("Pie chart", contents.pie_chart), ("Screenshot", contents.screenshot)];
    for (heading, path) in images {
        let Some(path) = path else {
            continue;
        };
        if let Err(e) = writer.image_page(heading, path) {
            tracing::warn!(file = %path.display(), error = %e, "skipping image in report");
        }
    }

    let path = store.allocate("report", "pdf");
    writer.save(&path)?;
    Ok(Artifact::new(path))
}

/// A top-to-bottom text cursor over a growing document.
struct PdfWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
    page_has_content: bool,
    page_count: usize,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self { doc, regular, bold, layer, y: PAGE_HEIGHT - MARGIN, page_has_content: false, page_count: 1 })
    }

    fn new_page(&mut self) {
        self.page_count += 1;
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", self.page_count));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.page_has_content = false;
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    fn text_at(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.page_has_content = true;
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(LINE_HEIGHT * 2.0);
        self.y -= LINE_HEIGHT;
        self.text_at(text, HEADING_SIZE, MARGIN, true);
        self.y -= LINE_HEIGHT;
    }

    fn paragraph(&mut self, text: &str) {
        let width = (CONTENT_WIDTH / CHAR_WIDTH) as usize;
        for line in wrap_lines(text, width) {
            self.ensure_space(LINE_HEIGHT);
            self.y -= LINE_HEIGHT;
            if !line.is_empty() {
                self.text_at(&line, BODY_SIZE, MARGIN, false);
            }
        }
        self.y -= LINE_HEIGHT;
    }

    fn table(&mut self, table: &TableData) {
        if table.headers.is_empty() {
            return;
        }

        let column_width = CONTENT_WIDTH / table.headers.len() as f32;
        let max_chars = ((column_width - 1.0) / CHAR_WIDTH).max(1.0) as usize;

        self.table_row(&table.headers, column_width, max_chars, true);
        for row in &table.rows {
            self.table_row(row, column_width, max_chars, false);
        }
        self.y -= LINE_HEIGHT;
    }

    fn table_row(&mut self, cells: &[String], column_width: f32, max_chars: usize, bold: bool) {
        self.ensure_space(ROW_HEIGHT);
        self.y -= ROW_HEIGHT;
        for (idx, cell) in cells.iter().enumerate() {
            let x = MARGIN + idx as f32 * column_width;
            self.text_at(&fit_cell(cell, max_chars), BODY_SIZE, x, bold);
        }
    }

    /// Places a PNG on its own page, scaled to fit the content area.
    fn image_page(&mut self, heading: &str, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        let decoder = PngDecoder::new(BufReader::new(file)).map_err(image_error)?;
        let (px_width, px_height) = decoder.dimensions();
        let image = Image::try_from(decoder).map_err(image_error)?;

        if self.page_has_content {
            self.new_page();
        }
        self.heading(heading);

        let max_height = MAX_IMAGE_HEIGHT.min(self.y - MARGIN);
        let dpi = (px_width as f32 / mm_to_inches(CONTENT_WIDTH)).max(px_height as f32 / mm_to_inches(max_height));
        let height_mm = px_height as f32 / dpi * 25.4;

        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.y - height_mm)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.y -= height_mm;
        self.page_has_content = true;
        Ok(())
    }

    fn save(self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.doc.save(&mut std::io::BufWriter::new(file)).map_err(pdf_error)
    }
}

fn pdf_error(e: printpdf::Error) -> ChartwiseError {
    ChartwiseError::PdfError(e.to_string())
}

fn image_error(e: printpdf::image_crate::ImageError) -> ChartwiseError {
    ChartwiseError::ImageError(e.to_string())
}

fn mm_to_inches(mm: f32) -> f32 {
    mm / 25.4
}

/// Shortens a cell to `max_chars`, marking the cut with `...`.
fn fit_cell(cell: &str, max_chars: usize) -> String {
    if cell.chars().count() <= max_chars {
        return cell.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = cell.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Greedy word wrap that keeps blank lines between paragraphs.
fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for source in text.lines() {
        let mut current = String::new();
        for word in source.split_whitespace() {
            let needed = if current.is_empty() { word.len() } else { current.len() + 1 + word.len() };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table() -> TableData {
        TableData::new(
            vec!["Brand".to_string(), "Price".to_string()],
            vec![vec!["Apple".to_string(), "900".to_string()], vec!["Samsung".to_string(), "700".to_string()]],
        )
    }

    fn is_pdf(path: &Path) -> bool {
        std::fs::read(path).map(|bytes| bytes.starts_with(b"%PDF")).unwrap_or(false)
    }

    #[test]
    fn test_table_pdf() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();

        let artifact = table_pdf(&table(), "Phones", &store).unwrap();
        assert!(artifact.file_name.ends_with("_table.pdf"));
        assert!(is_pdf(&artifact.path));
    }

    #[test]
    fn test_table_pdf_many_rows_spans_pages() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        let rows = (0..120).map(|i| vec![format!("Brand {}", i), i.to_string()]).collect();
        let big = TableData::new(vec!["Brand".to_string(), "Price".to_string()], rows);

        let artifact = table_pdf(&big, "Long", &store).unwrap();
        assert!(is_pdf(&artifact.path));
    }

    #[test]
    fn test_report_pdf_skips_missing_pieces() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        let table = table();
        let missing = tmp.path().join("missing_bar.png");

        let contents = ReportContents {
            title: "Report",
            summary: Some("Apple leads the market."),
            table: Some(&table),
            bar_chart: Some(&missing),
            ..Default::default()
        };

        let artifact = report_pdf(&contents, &store).unwrap();
        assert!(artifact.file_name.ends_with("_report.pdf"));
        assert!(is_pdf(&artifact.path));
    }

    #[test]
    fn test_report_pdf_empty() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        let artifact = report_pdf(&ReportContents { title: "Empty", ..Default::default() }, &store).unwrap();
        assert!(is_pdf(&artifact.path));
    }

    #[test]
    fn test_fit_cell() {
        assert_eq!(fit_cell("short", 10), "short");
        assert_eq!(fit_cell("a very long cell value", 10), "a very ...");
        assert_eq!(fit_cell("abc", 2), "...");
    }

    #[test]
    fn test_wrap_lines() {
        let lines = wrap_lines("one two three four\n\nfive", 9);
        assert_eq!(lines, vec!["one two", "three", "four", "", "five"]);
    }
}
