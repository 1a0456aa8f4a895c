//! Bar and pie chart images drawn with plotters.
//!
//! Text is rendered with a TrueType font registered through [`load_font`];
//! until one is loaded, drawing fails with [`ChartwiseError::ChartError`].

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use super::{Artifact, ArtifactStore};
use crate::parser::{ChartKind, ChartSpec};
use crate::{ChartwiseError, Result};

const BAR_SIZE: (u32, u32) = (1000, 600);
const PIE_SIZE: (u32, u32) = (800, 800);

type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Fonts tried when no explicit font file is configured.
const SYSTEM_FONTS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

static LOADED_FONT: OnceLock<PathBuf> = OnceLock::new();

/// Registers the chart font, once per process.
///
/// Uses `path` when given, otherwise the first existing entry of a list of
/// common system fonts. Later calls return the font already loaded.
pub fn load_font(path: Option<&Path>) -> Result<PathBuf> {
    if let Some(loaded) = LOADED_FONT.get() {
        return Ok(loaded.clone());
    }

    let candidate = match path {
        Some(path) => path.to_path_buf(),
        None => SYSTEM_FONTS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
            .ok_or_else(|| ChartwiseError::ConfigError("no chart font found; configure a .ttf file".to_string()))?,
    };

    let bytes = fs::read(&candidate)?;
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font("sans-serif", FontStyle::Normal, bytes)
        .map_err(|_| ChartwiseError::ConfigError(format!("invalid font {}", candidate.display())))?;

    tracing::debug!(font = %candidate.display(), "registered chart font");
    Ok(LOADED_FONT.get_or_init(|| candidate).clone())
}

/// Draws `spec` to a fresh PNG in `store`.
///
/// With `embed`, the returned artifact also carries the base64 of the image.
pub fn render_chart(spec: &ChartSpec, store: &ArtifactStore, embed: bool) -> Result<Artifact> {
    let path = store.allocate(spec.kind.as_str(), "png");

    let drawn = match spec.kind {
        ChartKind::Bar => draw_bar(spec, &path),
        ChartKind::Pie => draw_pie(spec, &path),
    };
    if let Err(e) = drawn {
        let _ = fs::remove_file(&path);
        return Err(ChartwiseError::ChartError(e.to_string()));
    }

    let mut artifact = Artifact::new(path);
    if embed {
        let bytes = fs::read(&artifact.path)?;
        artifact.inline_base64 = Some(STANDARD.encode(bytes));
    }

    tracing::debug!(kind = %spec.kind, file = %artifact.file_name, "rendered chart");
    Ok(artifact)
}

fn draw_bar(spec: &ChartSpec, path: &Path) -> DrawResult {
    let root = BitMapBackend::new(path, BAR_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let count = spec.values.len();
    let max = spec.values.iter().copied().fold(0.0_f64, f64::max);
    let top = if max > 0.0 { max * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..count).into_segmented(), 0.0..top)?;

    let label_for = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(idx) => spec.labels.get(*idx).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(count)
        .x_label_formatter(&label_for)
        .x_desc("Categories")
        .y_desc("Values")
        .draw()?;

    chart.draw_series(spec.values.iter().enumerate().map(|(idx, value)| {
        let mut bar =
            Rectangle::new([(SegmentValue::Exact(idx), 0.0), (SegmentValue::Exact(idx + 1), *value)], Palette99::pick(idx).filled());
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;

    root.present()?;
    Ok(())
}

fn draw_pie(spec: &ChartSpec, path: &Path) -> DrawResult {
    let root = BitMapBackend::new(path, PIE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let titled = root.titled(&spec.title, ("sans-serif", 28))?;
    let (width, height) = titled.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let colors: Vec<RGBColor> = (0..spec.values.len()).map(palette_color).collect();

    let mut pie = Pie::new(&center, &radius, spec.values.as_slice(), colors.as_slice(), spec.labels.as_slice());
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 16).into_font().color(&BLACK));
    titled.draw(&pie)?;

    root.present()?;
    Ok(())
}

fn palette_color(idx: usize) -> RGBColor {
    let RGBAColor(r, g, b, _) = Palette99::pick(idx).to_rgba();
    RGBColor(r, g, b)
}
