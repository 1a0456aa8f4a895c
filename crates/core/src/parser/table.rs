//! Markdown table extraction from model output.
//!
//! Model-written markdown is unreliable, so extraction is forgiving: a row is
//! kept only when its cell count equals the header count, and anything else
//! is dropped without failing the rest of the response. Both extraction modes
//! share that rule and the same cell splitter.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// A line that opens and closes with a pipe, the shape of a markdown table row.
static PIPE_ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\|.*\|\s*$").unwrap());

/// How tables are located in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TableMode {
    /// Every contiguous block of pipe-delimited lines is a table. The first
    /// line is the header and the second is treated as the separator.
    #[default]
    PipeBlocks,
    /// A single table: the first non-separator `|` line is the header and
    /// every later `|` line with a matching cell count is a row.
    Single,
}

/// Headers and rows extracted from markdown table syntax.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Creates a table, silently dropping rows whose length differs from the header count.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows.into_iter().filter(|row| row.len() == width).collect();
        Self { headers, rows }
    }

    /// Index of the column named `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().filter_map(move |row| row.get(index).map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pushes a row if it has the right width. Returns whether it was kept.
    fn push_row(&mut self, cells: Vec<String>) -> bool {
        if cells.len() == self.headers.len() {
            self.rows.push(cells);
            true
        } else {
            false
        }
    }
}

/// Extracts zero or more tables from `text` using the given mode.
pub fn extract_tables(text: &str, mode: TableMode) -> Vec<TableData> {
    match mode {
        TableMode::PipeBlocks => extract_pipe_tables(text),
        TableMode::Single => extract_single_table(text).into_iter().collect(),
    }
}

/// Extracts every contiguous block of pipe rows as its own table.
///
/// Blocks with fewer than two lines are discarded. Row index one is skipped as
/// the separator; data rows begin at index two.
pub fn extract_pipe_tables(text: &str) -> Vec<TableData> {
    let mut tables = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in text.lines() {
        if PIPE_ROW.is_match(line) {
            block.push(line.trim());
            continue;
        }
        if let Some(table) = table_from_block(&block) {
            tables.push(table);
        }
        block.clear();
    }

    if let Some(table) = table_from_block(&block) {
        tables.push(table);
    }

    tables
}

fn table_from_block(block: &[&str]) -> Option<TableData> {
    if block.len() < 2 {
        return None;
    }

    let headers = split_cells(block[0]);
    if headers.is_empty() {
        return None;
    }

    let mut table = TableData { headers, rows: Vec::new() };
    for line in &block[2..] {
        let cells = split_cells(line);
        if !table.push_row(cells) {
            tracing::debug!(row = *line, "dropping table row with mismatched cell count");
        }
    }

    Some(table)
}

/// Extracts at most one table, tolerating missing separators and stray lines.
///
/// Blank lines and code fences are ignored. Any line containing `---` counts as
/// a separator and is skipped wherever it appears.
pub fn extract_single_table(text: &str) -> Option<TableData> {
    let mut table: Option<TableData> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("```") {
            continue;
        }
        if !line.contains('|') || line.contains("---") {
            continue;
        }

        let cells = split_cells(line);
        if let Some(table) = table.as_mut() {
            if !table.push_row(cells) {
                tracing::debug!(row = line, "skipping table row with mismatched cell count");
            }
        } else if !cells.is_empty() {
            table = Some(TableData { headers: cells, rows: Vec::new() });
        }
    }

    table
}

/// Splits a table line into trimmed cells.
///
/// Only the empty artifacts produced by the enclosing pipes are removed, so an
/// empty cell in the middle of a row is preserved.
pub fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);

    if line.trim().is_empty() {
        return Vec::new();
    }

    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pipe_table_basic() {
        let text = "Intro\n\n|Brand|Price|\n|---|---|\n|Apple|900|\n|Samsung|700|\n\nOutro";
        let tables = extract_pipe_tables(text);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, strings(&["Brand", "Price"]));
        assert_eq!(tables[0].rows, vec![strings(&["Apple", "900"]), strings(&["Samsung", "700"])]);
    }

    #[test]
    fn test_pipe_table_at_end_without_newline() {
        let text = "| A | B |\n| --- | --- |\n| 1 | 2 |";
        let tables = extract_pipe_tables(text);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn test_multiple_pipe_tables() {
        let text = "|A|B|\n|-|-|\n|1|2|\n\nBetween\n\n|X|\n|-|\n|y|\n|z|\n";
        let tables = extract_pipe_tables(text);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, strings(&["A", "B"]));
        assert_eq!(tables[1].headers, strings(&["X"]));
        assert_eq!(tables[1].rows.len(), 2);
    }

    #[test]
    fn test_single_line_block_is_discarded() {
        let text = "|not a table|\n\nplain text";
        assert!(extract_pipe_tables(text).is_empty());
    }

    #[test]
    fn test_pipe_table_drops_malformed_rows() {
        let text = "|Brand|Price|\n|---|---|\n|Apple|900|\n|Broken|\n|Samsung|700|extra|\n|Nokia|100|\n";
        let tables = extract_pipe_tables(text);

        assert_eq!(tables[0].rows, vec![strings(&["Apple", "900"]), strings(&["Nokia", "100"])]);
    }

    #[test]
    fn test_pipe_table_header_only() {
        let tables = extract_pipe_tables("|A|B|\n|---|---|\n");
        assert_eq!(tables.len(), 1);
        assert!(tables[0].is_empty());
    }

    #[test]
    fn test_single_table_without_separator() {
        let text = "```\nBrand | Price\nApple | 900\n\nSamsung | 700\n```";
        let table = extract_single_table(text).unwrap();

        assert_eq!(table.headers, strings(&["Brand", "Price"]));
        assert_eq!(table.rows, vec![strings(&["Apple", "900"]), strings(&["Samsung", "700"])]);
    }

    #[test]
    fn test_single_table_skips_mismatched_rows() {
        let text = "| Brand | Price |\n|---|---|\n| Apple | 900 |\n| Samsung |\n| Nokia | 100 |";
        let table = extract_single_table(text).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], strings(&["Nokia", "100"]));
    }

    #[test]
    fn test_single_mode_extracts_only_one_table() {
        let text = "|A|B|\n|---|---|\n|1|2|\n\n|X|Y|Z|\n|---|---|---|\n|7|8|9|";
        let tables = extract_tables(text, TableMode::Single);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, strings(&["A", "B"]));
        assert_eq!(tables[0].rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn test_single_table_none_without_pipes() {
        assert!(extract_single_table("no tables here\n\njust prose").is_none());
    }

    #[rstest]
    #[case("|a|b|c|", &["a", "b", "c"])]
    #[case("| a | | c |", &["a", "", "c"])]
    #[case("a | b", &["a", "b"])]
    #[case("  |  spaced  |  ", &["spaced"])]
    #[case("||", &[])]
    fn test_split_cells(#[case] line: &str, #[case] expected: &[&str]) {
        assert_eq!(split_cells(line), strings(expected));
    }

    #[test]
    fn test_table_data_new_drops_wrong_width() {
        let table = TableData::new(strings(&["A", "B"]), vec![strings(&["1", "2"]), strings(&["3"])]);
        assert_eq!(table.rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn test_column_lookup() {
        let table = TableData::new(strings(&["Brand", "Price"]), vec![strings(&["Apple", "900"])]);
        assert_eq!(table.column_index("Price"), Some(1));
        assert_eq!(table.column_index("price"), None);
        assert_eq!(table.column(0).collect::<Vec<_>>(), vec!["Apple"]);
    }
}
