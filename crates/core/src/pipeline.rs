//! The request pipeline: fetch, prompt, model, parse, render.
//!
//! One [`Pipeline`] serves many requests. Each call runs a single pass with no
//! retries, and every failure degrades the result instead of aborting it: a
//! failed fetch or model call becomes a visible message, and a chart or PDF
//! that cannot be produced is left out of the [`Report`].
//!
//! # Example
//!
//! ```rust,no_run
//! use chartwise_core::{OllamaClient, OllamaConfig, Pipeline, PipelineConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> chartwise_core::Result<()> {
//! let config = PipelineConfig::builder().output_dir("static/charts").max_charts(2).build();
//! let pipeline = Pipeline::new(config, OllamaClient::new(OllamaConfig::default())?)?;
//!
//! let report = pipeline.run("https://example.com/phones", "Compare phone prices by brand").await;
//! println!("{}", report.ai_response);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use serde::Serialize;

use crate::{ChartwiseError, Result};
use crate::fetch::{FetchConfig, RawDocument, fetch_document};
use crate::model::ChatModel;
use crate::parser::{
    BrandCount, BrandShare, ChartSpec, ParseConfig, ParsedResponse, TableMode, brand_charts, brand_counts,
    parse_response, percentage_shares,
};
use crate::prompt::{PromptConfig, build_prompt};
use crate::render::{Artifact, ArtifactStore, render_chart, tables_to_html};
use crate::screenshot::{ScreenshotConfig, capture_screenshot};

/// Where the rendered charts come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum ChartSource {
    /// The `BAR:` and `PIE:` blocks of the model response.
    #[default]
    ResponseSpecs,
    /// Brand frequencies of the first table: a count bar chart and a share pie chart.
    BrandCounts {
        /// Column to aggregate; `Brand` (or the first column) when unset.
        column: Option<String>,
    },
}

/// Configuration for a [`Pipeline`].
///
/// # Example
///
/// ```rust
/// use chartwise_core::{ChartSource, PipelineConfig, TableMode};
///
/// let config = PipelineConfig::builder()
///     .table_mode(TableMode::Single)
///     .chart_source(ChartSource::BrandCounts { column: None })
///     .export_pdf(false)
///     .build();
/// assert_eq!(config.parse.max_charts, 2);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub prompt: PromptConfig,
    pub parse: ParseConfig,
    pub chart_source: ChartSource,
    /// Write the table and report PDFs (default: true).
    pub export_pdf: bool,
    /// Attach base64 image data to chart artifacts (default: true).
    pub embed_charts: bool,
    /// Capture a page screenshot when set (default: disabled).
    pub screenshot: Option<ScreenshotConfig>,
    /// Directory all artifacts are written to (default: `static/charts`).
    pub output_dir: PathBuf,
    /// TrueType font for chart text; common system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            prompt: PromptConfig::default(),
            parse: ParseConfig::default(),
            chart_source: ChartSource::default(),
            export_pdf: true,
            embed_charts: true,
            screenshot: None,
            output_dir: PathBuf::from("static/charts"),
            font_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for PipelineConfig.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Sets the fetch timeout in seconds.
    pub fn fetch_timeout(mut self, seconds: u64) -> Self {
        self.config.fetch.timeout = seconds;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.fetch.user_agent = user_agent.into();
        self
    }

    /// Sets how many characters of page text go into the prompt.
    pub fn content_limit(mut self, limit: usize) -> Self {
        self.config.prompt.content_limit = limit;
        self
    }

    pub fn table_mode(mut self, mode: TableMode) -> Self {
        self.config.parse.table_mode = mode;
        self
    }

    pub fn max_charts(mut self, max: usize) -> Self {
        self.config.parse.max_charts = max;
        self
    }

    pub fn chart_source(mut self, source: ChartSource) -> Self {
        self.config.chart_source = source;
        self
    }

    pub fn export_pdf(mut self, value: bool) -> Self {
        self.config.export_pdf = value;
        self
    }

    pub fn embed_charts(mut self, value: bool) -> Self {
        self.config.embed_charts = value;
        self
    }

    /// Enables page screenshots with the given settings.
    pub fn screenshot(mut self, config: ScreenshotConfig) -> Self {
        self.config.screenshot = Some(config);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

/// Everything produced for one analysis request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub url: String,
    /// Page text, or the scraping error message.
    pub content: String,
    /// Raw model answer, or the model error message.
    pub ai_response: String,
    pub parsed: ParsedResponse,
    /// One escaped HTML table per parsed table.
    pub tables_html: Vec<String>,
    pub charts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub brand_counts: Vec<BrandCount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub brand_shares: Vec<BrandShare>,
    pub screenshot: Option<Artifact>,
    pub table_pdf: Option<Artifact>,
    pub report_pdf: Option<Artifact>,
}

impl Report {
    /// Converts the report to a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| ChartwiseError::SerializeError(e.to_string()))
    }
}

/// Runs analysis requests against one model and one artifact directory.
pub struct Pipeline<M> {
    config: PipelineConfig,
    model: M,
    store: ArtifactStore,
}

impl<M: ChatModel> Pipeline<M> {
    /// Opens the artifact directory and registers the chart font.
    ///
    /// A missing font is not fatal: charts are then skipped at render time.
    pub fn new(config: PipelineConfig, model: M) -> Result<Self> {
        let store = ArtifactStore::new(&config.output_dir)?;

        match crate::render::chart::load_font(config.font_path.as_deref()) {
            Ok(font) => tracing::debug!(font = %font.display(), "chart font ready"),
            Err(e) => tracing::warn!(error = %e, "no chart font available; charts will be skipped"),
        }

        Ok(Self { config, model, store })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Fetches `url` without calling the model.
    ///
    /// A failed fetch yields a document whose text is the error message.
    pub async fn preview(&self, url: &str) -> RawDocument {
        match fetch_document(url, &self.config.fetch).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(url, error = %e, "scraping failed");
                RawDocument::new(url, format!("Error scraping website: {}", e))
            }
        }
    }

    /// Fetches `url`, optionally screenshots it, then analyzes the page.
    pub async fn run(&self, url: &str, prompt: &str) -> Report {
        let mut doc = self.preview(url).await;

        if let Some(config) = &self.config.screenshot {
            match capture_screenshot(url, config, &self.store).await {
                Ok(path) => doc.screenshot = Some(path),
                Err(e) => tracing::warn!(url, error = %e, "screenshot failed"),
            }
        }

        self.analyze(doc, prompt).await
    }

    /// Prompts the model with already fetched content and renders the answer.
    pub async fn analyze(&self, doc: RawDocument, prompt: &str) -> Report {
        let full_prompt = build_prompt(&doc.text, prompt, &self.config.prompt);

        let ai_response = match self.model.chat(&full_prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "model call failed");
                format!("Error from model: {}", e)
            }
        };

        // Chart drawing and PDF writing are blocking file work.
        let config = self.config.clone();
        let store = self.store.clone();
        let fallback = Report {
            url: doc.url.clone(),
            content: doc.text.clone(),
            ai_response: ai_response.clone(),
            ..Default::default()
        };

        match tokio::task::spawn_blocking(move || build_report(&config, &store, doc, ai_response)).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "report rendering task failed");
                fallback
            }
        }
    }
}

/// Parses the answer and renders its tables, charts and PDFs.
fn build_report(config: &PipelineConfig, store: &ArtifactStore, doc: RawDocument, ai_response: String) -> Report {
    let parsed = parse_response(&ai_response, &config.parse);
    let tables_html = tables_to_html(&parsed.tables);

    let (specs, brand_counts, brand_shares) = chart_specs(config, &parsed);
    let charts = specs.iter().filter_map(|spec| render(spec, store, config.embed_charts)).collect();

    let mut report = Report {
        url: doc.url,
        content: doc.text,
        ai_response,
        parsed,
        tables_html,
        charts,
        brand_counts,
        brand_shares,
        screenshot: doc.screenshot.map(Artifact::new),
        table_pdf: None,
        report_pdf: None,
    };

    if config.export_pdf {
        export_pdfs(store, &mut report);
    }

    tracing::debug!(
        url = %report.url,
        tables = report.parsed.tables.len(),
        charts = report.charts.len(),
        "analysis complete"
    );
    report
}

fn chart_specs(config: &PipelineConfig, parsed: &ParsedResponse) -> (Vec<ChartSpec>, Vec<BrandCount>, Vec<BrandShare>) {
    match &config.chart_source {
        ChartSource::ResponseSpecs => (parsed.charts.clone(), Vec::new(), Vec::new()),
        ChartSource::BrandCounts { column } => {
            let Some(table) = parsed.tables.first() else {
                return (Vec::new(), Vec::new(), Vec::new());
            };
            let counts = brand_counts(table, column.as_deref());
            let shares = percentage_shares(&counts);
            let mut specs = brand_charts(&counts);
            specs.truncate(config.parse.max_charts);
            (specs, counts, shares)
        }
    }
}

fn render(spec: &ChartSpec, store: &ArtifactStore, embed: bool) -> Option<Artifact> {
    render_chart(spec, store, embed)
        .inspect_err(|e| tracing::warn!(kind = %spec.kind, error = %e, "chart skipped"))
        .ok()
}

#[cfg(feature = "pdf")]
fn export_pdfs(store: &ArtifactStore, report: &mut Report) {
    use crate::parser::ChartKind;
    use crate::render::{ReportContents, report_pdf, table_pdf};

    let table = report.parsed.tables.first();
    let chart_path = |kind: ChartKind| {
        let suffix = format!("_{}.png", kind.as_str());
        report.charts.iter().find(|a| a.file_name.ends_with(&suffix)).map(|a| a.path.as_path())
    };

    let table_artifact = table.and_then(|table| {
        table_pdf(table, "Extracted table", store)
            .inspect_err(|e| tracing::warn!(error = %e, "table PDF skipped"))
            .ok()
    });

    let summary = summary_text(&report.ai_response);
    let contents = ReportContents {
        title: "Analysis report",
        summary: (!summary.is_empty()).then_some(summary.as_str()),
        table,
        bar_chart: chart_path(ChartKind::Bar),
        pie_chart: chart_path(ChartKind::Pie),
        screenshot: report.screenshot.as_ref().map(|a| a.path.as_path()),
    };
    let report_artifact =
        report_pdf(&contents, store).inspect_err(|e| tracing::warn!(error = %e, "report PDF skipped")).ok();

    report.table_pdf = table_artifact;
    report.report_pdf = report_artifact;
}

#[cfg(not(feature = "pdf"))]
fn export_pdfs(_store: &ArtifactStore, _report: &mut Report) {
    tracing::debug!("PDF export requested but the pdf feature is disabled");
}

/// The prose part of a response: everything before the first table row or
/// chart block, trimmed.
pub fn summary_text(response: &str) -> String {
    let mut lines = Vec::new();
    for line in response.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('|') || trimmed.starts_with("BAR:") || trimmed.starts_with("PIE:") {
            break;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}
