//! `BAR:` / `PIE:` chart block extraction.
//!
//! The model is asked to describe charts as free text:
//!
//! ```text
//! BAR: Title: Market share
//! Labels: Apple, Samsung, Xiaomi
//! Values: 30%, 25%, 10%
//! ```
//!
//! A block runs from its marker to the first blank line (or the end of the
//! text). Anything that does not yield matching, non-empty label and value
//! lists is treated as absent.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `Title:`, `Labels:` and `Values:` fields, in that order, within one block.
static CHART_FIELDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Title:\s*(.*?)\s*Labels:\s*(.*?)\s*Values:\s*([^\n]*)").unwrap());

/// End of a chart block.
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// The kind of chart to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartKind {
    Bar,
    Pie,
}

impl ChartKind {
    /// The marker that opens this kind's block in model output.
    pub fn marker(self) -> &'static str {
        match self {
            ChartKind::Bar => "BAR:",
            ChartKind::Pie => "PIE:",
        }
    }

    /// Lowercase name used in artifact file names.
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized description of one chart to render.
///
/// `labels` and `values` always have the same, non-zero length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSpec {
    /// Builds a spec, or `None` when the label and value counts differ or are zero.
    pub fn new(kind: ChartKind, title: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Option<Self> {
        if labels.len() != values.len() || values.is_empty() {
            return None;
        }
        Some(Self { kind, title: title.into(), labels, values })
    }

    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Finds the first `kind` block in `text` that parses into a valid spec.
///
/// A marker that only appears in prose, or opens a malformed block, is skipped
/// in favour of the next occurrence.
pub fn extract_chart_spec(text: &str, kind: ChartKind) -> Option<ChartSpec> {
    text.match_indices(kind.marker()).find_map(|(start, marker)| {
        let rest = &text[start + marker.len()..];
        let block = match BLANK_LINE.find(rest) {
            Some(m) => &rest[..m.start()],
            None => rest,
        };
        parse_block(block, kind)
    })
}

fn parse_block(block: &str, kind: ChartKind) -> Option<ChartSpec> {
    let Some(caps) = CHART_FIELDS.captures(block) else {
        tracing::debug!(%kind, "chart block without Title/Labels/Values fields");
        return None;
    };

    let title = caps[1].trim();
    let labels = parse_labels(&caps[2]);
    let values = parse_values(&caps[3]);

    let spec = ChartSpec::new(kind, title, labels, values);
    if spec.is_none() {
        tracing::debug!(%kind, "discarding chart block with mismatched or empty values");
    }
    spec
}

/// Extracts the bar spec then the pie spec, keeping at most `max_charts`.
pub fn extract_chart_specs(text: &str, max_charts: usize) -> Vec<ChartSpec> {
    [ChartKind::Bar, ChartKind::Pie]
        .into_iter()
        .filter_map(|kind| extract_chart_spec(text, kind))
        .take(max_charts)
        .collect()
}

fn parse_labels(field: &str) -> Vec<String> {
    field.split(',').map(|label| label.trim().to_string()).collect()
}

/// Keeps the first integer found in each comma-separated token, dropping tokens without one.
fn parse_values(field: &str) -> Vec<f64> {
    field
        .split(',')
        .filter_map(|token| INTEGER.find(token))
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bar_spec_basic() {
        let text = "Some summary.\n\nBAR: Title: Sales\nLabels: A, B, C\nValues: 10, 20, 30\n";
        let spec = extract_chart_spec(text, ChartKind::Bar).unwrap();

        assert_eq!(spec.kind, ChartKind::Bar);
        assert_eq!(spec.title, "Sales");
        assert_eq!(spec.labels, strings(&["A", "B", "C"]));
        assert_eq!(spec.values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_pie_spec_with_decorated_values() {
        let text = "PIE: Title: Share\nLabels: X, Y, Z\nValues: 25%, about 35 units, ~40\n";
        let spec = extract_chart_spec(text, ChartKind::Pie).unwrap();

        assert_eq!(spec.values, vec![25.0, 35.0, 40.0]);
        assert_eq!(spec.total(), 100.0);
    }

    #[test]
    fn test_only_first_integer_per_token() {
        let text = "BAR: Title: T\nLabels: A, B\nValues: 12 of 40, 7.5\n";
        let spec = extract_chart_spec(text, ChartKind::Bar).unwrap();
        assert_eq!(spec.values, vec![12.0, 7.0]);
    }

    #[test]
    fn test_mismatched_counts_discarded() {
        let text = "BAR: Title: T\nLabels: A, B, C\nValues: 1, 2\n";
        assert!(extract_chart_spec(text, ChartKind::Bar).is_none());
    }

    #[test]
    fn test_non_numeric_values_discarded() {
        let text = "PIE: Title: T\nLabels: A, B\nValues: many, few\n";
        assert!(extract_chart_spec(text, ChartKind::Pie).is_none());
    }

    #[test]
    fn test_non_numeric_token_dropped_causes_mismatch() {
        let text = "BAR: Title: T\nLabels: A, B\nValues: 5, n/a\n";
        assert!(extract_chart_spec(text, ChartKind::Bar).is_none());
    }

    #[test]
    fn test_block_ends_at_blank_line() {
        let text = "BAR: Title: Broken\n\nPIE: Title: P\nLabels: A\nValues: 1\n";
        assert!(extract_chart_spec(text, ChartKind::Bar).is_none());
        assert!(extract_chart_spec(text, ChartKind::Pie).is_some());
    }

    #[test]
    fn test_fields_on_one_line() {
        let text = "- BAR: Title: Inline Labels: A, B Values: 3, 4";
        let spec = extract_chart_spec(text, ChartKind::Bar).unwrap();

        assert_eq!(spec.title, "Inline");
        assert_eq!(spec.labels, strings(&["A", "B"]));
        assert_eq!(spec.values, vec![3.0, 4.0]);
    }

    #[test]
    fn test_marker_in_prose_skipped() {
        let text = "Summary mentions a BAR: chart below.\n\nBAR: Title: T\nLabels: A, B\nValues: 1, 2\n";
        let spec = extract_chart_spec(text, ChartKind::Bar).unwrap();

        assert_eq!(spec.title, "T");
        assert_eq!(spec.values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_malformed_block_falls_through_to_next() {
        let text = "PIE: Title: Bad\nLabels: A, B\nValues: 1\n\nPIE: Title: Good\nLabels: A\nValues: 9\n";
        let spec = extract_chart_spec(text, ChartKind::Pie).unwrap();
        assert_eq!(spec.title, "Good");
    }

    #[test]
    fn test_values_on_next_line() {
        let text = "BAR: Title: T\nLabels: A, B\nValues:\n1, 2\n";
        let spec = extract_chart_spec(text, ChartKind::Bar).unwrap();
        assert_eq!(spec.values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_values_wider_than_u64() {
        let text = "BAR: Title: T\nLabels: A, B\nValues: 99999999999999999999999, 2\n";
        let spec = extract_chart_spec(text, ChartKind::Bar).unwrap();

        assert_eq!(spec.values.len(), 2);
        assert!(spec.values[0] > 9.9e22);
        assert_eq!(spec.values[1], 2.0);
    }

    #[test]
    fn test_missing_marker() {
        assert!(extract_chart_spec("Title: T\nLabels: A\nValues: 1", ChartKind::Bar).is_none());
    }

    #[test]
    fn test_extract_chart_specs_order_and_limit() {
        let text = "PIE: Title: P\nLabels: A\nValues: 1\n\nBAR: Title: B\nLabels: A\nValues: 2\n";

        let both = extract_chart_specs(text, 2);
        assert_eq!(both.iter().map(|s| s.kind).collect::<Vec<_>>(), vec![ChartKind::Bar, ChartKind::Pie]);

        let one = extract_chart_specs(text, 1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].kind, ChartKind::Bar);

        assert!(extract_chart_specs(text, 0).is_empty());
    }

    #[test]
    fn test_chart_spec_new_invariant() {
        assert!(ChartSpec::new(ChartKind::Bar, "t", vec![], vec![]).is_none());
        assert!(ChartSpec::new(ChartKind::Bar, "t", strings(&["a"]), vec![1.0, 2.0]).is_none());
        assert!(ChartSpec::new(ChartKind::Pie, "t", strings(&["a"]), vec![1.0]).is_some());
    }
}
