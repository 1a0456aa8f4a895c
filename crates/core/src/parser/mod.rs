//! Structured artifacts from a model's markdown answer.
//!
//! [`parse_response`] is pure: the same text and config always produce the
//! same [`ParsedResponse`].
//!
//! # Example
//!
//! ```rust
//! use chartwise_core::parser::{ParseConfig, parse_response};
//!
//! let text = "Summary.\n\n|Brand|Price|\n|---|---|\n|Apple|900|\n\nBAR: Title: T\nLabels: A, B\nValues: 1, 2\n";
//! let parsed = parse_response(text, &ParseConfig::default());
//! assert_eq!(parsed.tables[0].headers, vec!["Brand", "Price"]);
//! assert_eq!(parsed.charts[0].values, vec![1.0, 2.0]);
//! ```

pub mod brand;
pub mod chart;
pub mod table;

pub use brand::{BrandCount, BrandShare, DEFAULT_BRAND_COLUMN, brand_charts, brand_counts, percentage_shares};
pub use chart::{ChartKind, ChartSpec, extract_chart_spec, extract_chart_specs};
pub use table::{TableData, TableMode, extract_pipe_tables, extract_single_table, extract_tables, split_cells};

use serde::Serialize;

/// Configuration for response parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseConfig {
    /// Table extraction strategy.
    pub table_mode: TableMode,
    /// Maximum number of chart specs kept (bar first, then pie).
    pub max_charts: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self { table_mode: TableMode::PipeBlocks, max_charts: 2 }
    }
}

/// Tables and chart specs found in one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedResponse {
    pub tables: Vec<TableData>,
    pub charts: Vec<ChartSpec>,
}

impl ParsedResponse {
    pub fn chart(&self, kind: ChartKind) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.charts.is_empty()
    }
}

/// Extracts every table and up to `max_charts` chart specs from `text`.
pub fn parse_response(text: &str, config: &ParseConfig) -> ParsedResponse {
    let tables = extract_tables(text, config.table_mode);
    let charts = extract_chart_specs(text, config.max_charts);

    tracing::debug!(tables = tables.len(), charts = charts.len(), "parsed model response");

    ParsedResponse { tables, charts }
}
