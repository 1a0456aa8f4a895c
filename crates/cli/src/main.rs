mod echo;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::Context;
use chartwise_core::{
    ChartSource, OllamaClient, OllamaConfig, Pipeline, PipelineConfig, RawDocument, Report, ScreenshotConfig,
    TableMode, fetch_file, fetch_stdin,
};
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::echo::{
    format_size, print_banner, print_info, print_report_details, print_step, print_success, print_timing_summary,
    print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Table extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableModeArg {
    Pipe,
    Single,
}

impl FromStr for TableModeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pipe" | "blocks" => Ok(Self::Pipe),
            "single" => Ok(Self::Single),
            _ => Err(format!("Invalid table mode: {}. Valid options: pipe, single", s)),
        }
    }
}

impl From<TableModeArg> for TableMode {
    fn from(arg: TableModeArg) -> Self {
        match arg {
            TableModeArg::Pipe => TableMode::PipeBlocks,
            TableModeArg::Single => TableMode::Single,
        }
    }
}

/// Scrape a page, ask a local model about it, and render tables and charts
#[derive(Parser, Debug)]
#[command(name = "chartwise")]
#[command(version)]
#[command(about = "Turn web pages into LLM-generated tables, charts and reports", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Question for the model; without it the scraped text is printed
    #[arg(short, long, value_name = "PROMPT")]
    prompt: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "10", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Ollama server URL
    #[arg(long, default_value = "http://localhost:11434", value_name = "URL")]
    endpoint: String,

    /// Model name
    #[arg(short, long, default_value = "mistral", value_name = "NAME")]
    model: String,

    /// Model request timeout in seconds
    #[arg(long, default_value = "120", value_name = "SECS")]
    model_timeout: u64,

    /// Characters of page text sent to the model
    #[arg(long, default_value = "2000", value_name = "NUM")]
    content_limit: usize,

    /// Table extraction mode (pipe, single)
    #[arg(long, default_value = "pipe", value_name = "MODE")]
    table_mode: TableModeArg,

    /// Maximum number of charts to render
    #[arg(long, default_value = "2", value_name = "NUM")]
    max_charts: usize,

    /// Chart brand frequencies of the first table instead of the model's chart blocks
    #[arg(long)]
    brand_counts: bool,

    /// Column aggregated by --brand-counts (default: Brand)
    #[arg(long, value_name = "NAME", requires = "brand_counts")]
    brand_column: Option<String>,

    /// Directory for charts and PDFs
    #[arg(long, default_value = "static/charts", value_name = "DIR")]
    output_dir: PathBuf,

    /// TrueType font used for chart text
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Skip the table and report PDFs
    #[arg(long)]
    no_pdf: bool,

    /// Capture a page screenshot with headless Chrome (URL input only)
    #[arg(long)]
    screenshot: bool,

    /// Chrome/Chromium binary used for screenshots
    #[arg(long, value_name = "PATH", requires = "screenshot")]
    chrome: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn is_url(&self) -> bool {
        self.input.starts_with("http://") || self.input.starts_with("https://")
    }

    fn pipeline_config(&self) -> PipelineConfig {
        let chart_source = if self.brand_counts {
            ChartSource::BrandCounts { column: self.brand_column.clone() }
        } else {
            ChartSource::ResponseSpecs
        };

        let mut builder = PipelineConfig::builder()
            .fetch_timeout(self.timeout)
            .content_limit(self.content_limit)
            .table_mode(self.table_mode.into())
            .max_charts(self.max_charts)
            .chart_source(chart_source)
            .export_pdf(!self.no_pdf)
            .embed_charts(false)
            .output_dir(&self.output_dir);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(font) = &self.font {
            builder = builder.font_path(font);
        }
        if self.screenshot {
            builder = builder.screenshot(ScreenshotConfig { chrome_binary: self.chrome.clone(), ..Default::default() });
        }
        builder.build()
    }

    fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig { endpoint: self.endpoint.clone(), model: self.model.clone(), timeout: self.model_timeout }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "chartwise=debug,chartwise_core=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Reads a local input (file or stdin) into a document.
fn read_local(input: &str) -> anyhow::Result<RawDocument> {
    let html = if input == "-" {
        fetch_stdin().context("Failed to read from stdin")?
    } else {
        fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?
    };
    Ok(RawDocument::from_html(input, &html))
}

fn render_report(report: &Report, json: bool) -> anyhow::Result<String> {
    if json {
        let json = report.to_json().context("Failed to serialize report")?;
        return serde_json::to_string_pretty(&json).context("Failed to serialize report");
    }

    let mut output = report.ai_response.trim_end().to_string();
    output.push('\n');

    let artifacts = report
        .charts
        .iter()
        .map(|chart| ("Chart", chart))
        .chain(report.screenshot.iter().map(|s| ("Screenshot", s)))
        .chain(report.table_pdf.iter().map(|pdf| ("Table PDF", pdf)))
        .chain(report.report_pdf.iter().map(|pdf| ("Report PDF", pdf)));

    let mut first = true;
    for (label, artifact) in artifacts {
        if first {
            output.push('\n');
            first = false;
        }
        output.push_str(&format!("{}: {}\n", label, artifact.path.display()));
    }

    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let total_steps = if args.prompt.is_some() { 3 } else { 2 };
    let started = Instant::now();
    let mut timings: Vec<(String, Duration)> = Vec::new();

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let pipeline = if args.prompt.is_some() || args.is_url() {
        let model = OllamaClient::new(args.ollama_config()).context("Invalid model endpoint")?;
        Some(Pipeline::new(args.pipeline_config(), model).context("Failed to prepare output directory")?)
    } else {
        None
    };

    let step_started = Instant::now();
    let mut doc = match &pipeline {
        Some(pipeline) if args.is_url() => {
            if args.verbose {
                print_step(1, total_steps, &format!("Fetching from {}", args.input.bright_white().underline()));
            }
            pipeline.preview(&args.input).await
        }
        _ => {
            if args.verbose {
                print_step(1, total_steps, &format!("Reading {}", args.input.bright_white()));
            }
            read_local(&args.input)?
        }
    };
    timings.push(("Fetch".to_string(), step_started.elapsed()));

    if args.verbose {
        eprintln!("  {} {}", "Text:".dimmed(), format_size(doc.text.len()).bright_white());
        eprintln!();
    }

    let output = match (&pipeline, &args.prompt) {
        (Some(pipeline), Some(prompt)) => {
            if args.screenshot {
                if args.is_url() {
                    let config = pipeline.config().screenshot.clone().unwrap_or_default();
                    match chartwise_core::capture_screenshot(&args.input, &config, pipeline.store()).await {
                        Ok(path) => doc.screenshot = Some(path),
                        Err(e) => print_warning(&format!("Screenshot skipped: {}", e)),
                    }
                } else {
                    print_warning("Screenshots need a URL input");
                }
            }

            if args.verbose {
                print_step(2, total_steps, &format!("Asking {}", args.model.bright_white()));
            }
            let step_started = Instant::now();
            let report = pipeline.analyze(doc, prompt).await;
            timings.push(("Analysis".to_string(), step_started.elapsed()));

            if report.ai_response.starts_with("Error from model") {
                print_warning(&report.ai_response);
            }
            if args.verbose {
                print_report_details(&report);
            }
            render_report(&report, args.json)?
        }
        _ if args.json => serde_json::to_string_pretty(&doc).context("Failed to serialize document")?,
        _ => doc.text,
    };

    if args.verbose {
        print_step(total_steps, total_steps, "Writing output");
        eprintln!();
        print_timing_summary(started.elapsed(), &timings);
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output.trim_end());
        }
    }

    Ok(())
}
