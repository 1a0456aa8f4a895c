mod page;
mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chartwise_core::{
    ChartSource, OllamaClient, OllamaConfig, Pipeline, PipelineConfig, ScreenshotConfig, TableMode,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "chartwise_server=info,chartwise_core=info,tower_http=info";

/// Web front end: scrape a page, ask a local model, render tables and charts
#[derive(Parser, Debug)]
#[command(name = "chartwise-server")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "CHARTWISE_ADDR", default_value = "127.0.0.1:5000")]
    addr: SocketAddr,

    /// Directory for charts and PDFs, also served under /static/charts
    #[arg(long, env = "CHARTWISE_OUTPUT_DIR", default_value = "static/charts")]
    output_dir: PathBuf,

    /// Ollama server URL
    #[arg(long, env = "CHARTWISE_ENDPOINT", default_value = "http://localhost:11434")]
    endpoint: String,

    /// Model name
    #[arg(long, env = "CHARTWISE_MODEL", default_value = "mistral")]
    model: String,

    /// Model request timeout in seconds
    #[arg(long, env = "CHARTWISE_MODEL_TIMEOUT", default_value = "120")]
    model_timeout: u64,

    /// HTTP fetch timeout in seconds
    #[arg(long, env = "CHARTWISE_FETCH_TIMEOUT", default_value = "10")]
    fetch_timeout: u64,

    /// Characters of page text sent to the model
    #[arg(long, env = "CHARTWISE_CONTENT_LIMIT", default_value = "2000")]
    content_limit: usize,

    /// Table extraction mode
    #[arg(long, env = "CHARTWISE_TABLE_MODE", default_value = "pipe", value_parser = ["pipe", "single"])]
    table_mode: String,

    /// Maximum number of charts per request
    #[arg(long, env = "CHARTWISE_MAX_CHARTS", default_value = "2")]
    max_charts: usize,

    /// Chart brand frequencies of the first table instead of the model's chart blocks
    #[arg(long, env = "CHARTWISE_BRAND_COUNTS")]
    brand_counts: bool,

    /// Column aggregated for brand charts (default: Brand)
    #[arg(long, env = "CHARTWISE_BRAND_COLUMN")]
    brand_column: Option<String>,

    /// TrueType font used for chart text
    #[arg(long, env = "CHARTWISE_FONT")]
    font: Option<PathBuf>,

    /// Skip the table and report PDFs
    #[arg(long, env = "CHARTWISE_NO_PDF")]
    no_pdf: bool,

    /// Capture page screenshots with headless Chrome
    #[arg(long, env = "CHARTWISE_SCREENSHOT")]
    screenshot: bool,

    /// Chrome/Chromium binary used for screenshots
    #[arg(long, env = "CHARTWISE_CHROME")]
    chrome: Option<String>,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        let table_mode = if self.table_mode == "single" { TableMode::Single } else { TableMode::PipeBlocks };
        let chart_source = if self.brand_counts {
            ChartSource::BrandCounts { column: self.brand_column.clone() }
        } else {
            ChartSource::ResponseSpecs
        };

        let mut builder = PipelineConfig::builder()
            .fetch_timeout(self.fetch_timeout)
            .content_limit(self.content_limit)
            .table_mode(table_mode)
            .max_charts(self.max_charts)
            .chart_source(chart_source)
            .export_pdf(!self.no_pdf)
            .output_dir(&self.output_dir);

        if let Some(font) = &self.font {
            builder = builder.font_path(font);
        }
        if self.screenshot {
            builder = builder.screenshot(ScreenshotConfig { chrome_binary: self.chrome.clone(), ..Default::default() });
        }
        builder.build()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .init();

    let args = Args::parse();

    let model = OllamaClient::new(OllamaConfig {
        endpoint: args.endpoint.clone(),
        model: args.model.clone(),
        timeout: args.model_timeout,
    })
    .context("Invalid model endpoint")?;
    let pipeline = Pipeline::new(args.pipeline_config(), model)
        .with_context(|| format!("Failed to prepare output directory {}", args.output_dir.display()))?;

    let app = routes::router(Arc::new(pipeline));

    let listener =
        tokio::net::TcpListener::bind(args.addr).await.with_context(|| format!("Failed to bind {}", args.addr))?;
    tracing::info!(addr = %args.addr, model = %args.model, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.context("Server error")?;

    Ok(())
}
