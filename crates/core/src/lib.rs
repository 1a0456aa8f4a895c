pub mod error;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod screenshot;

pub use error::{ChartwiseError, Result};
pub use fetch::{FetchConfig, RawDocument};
pub use fetch::{fetch_document, fetch_file, fetch_stdin, fetch_url, html_to_text};
pub use model::{ChatModel, OllamaClient, OllamaConfig};
pub use parser::{
    BrandCount, BrandShare, ChartKind, ChartSpec, ParseConfig, ParsedResponse, TableData, TableMode, parse_response,
};
pub use parser::{brand_charts, brand_counts, extract_chart_spec, extract_chart_specs, extract_tables, percentage_shares};
pub use pipeline::{ChartSource, Pipeline, PipelineConfig, PipelineConfigBuilder, Report, summary_text};
pub use prompt::{PromptConfig, build_prompt};
pub use render::chart::load_font;
pub use render::{Artifact, ArtifactStore, render_chart, response_to_html, table_to_html, tables_to_html};
#[cfg(feature = "pdf")]
pub use render::{ReportContents, report_pdf, table_pdf};
pub use screenshot::{ScreenshotConfig, capture_screenshot};
