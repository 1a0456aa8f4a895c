use owo_colors::OwoColorize;

use chartwise_core::Report;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Chartwise".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Turn web pages into tables, charts and reports\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print timing information with color coding
///
/// Model calls routinely take seconds, so the thresholds are coarse.
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 500.0 {
        eprintln!("  {} {:>10.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 5000.0 {
        eprintln!("  {} {:>10.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>10.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print what the analysis produced
pub fn print_report_details(report: &Report) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Analysis Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Tables:".dimmed(), report.parsed.tables.len().to_string().bright_white());
    eprintln!("  {} {}", "Chart specs:".dimmed(), report.parsed.charts.len().to_string().bright_white());
    eprintln!("  {} {}", "Charts:".dimmed(), report.charts.len().to_string().bright_white());
    if !report.brand_counts.is_empty() {
        eprintln!("  {} {}", "Brands:".dimmed(), report.brand_counts.len().to_string().bright_white());
    }
    eprintln!();
}

/// Print timing summary
pub fn print_timing_summary(total: std::time::Duration, timings: &[(String, std::time::Duration)]) {
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Timing Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for (label, duration) in timings {
        print_timing(label, *duration);
    }

    eprintln!("  {} {:>10.2}ms\n", format!("{}:", "Total").bold().dimmed(), total.as_secs_f64() * 1000.0);
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
