//! HTML pages. Every interpolated value is escaped here.

use chartwise_core::{Artifact, RawDocument, Report, response_to_html};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;color:#222}\
form{display:grid;gap:.5rem;margin-bottom:2rem}input,textarea{padding:.5rem;font:inherit}\
textarea{min-height:5rem}.styled-table{border-collapse:collapse;margin:1rem 0;width:100%}\
.styled-table th,.styled-table td{border:1px solid #ccc;padding:.4rem .6rem;text-align:left}\
.styled-table thead tr{background:#2b6cb0;color:#fff}.charts img{max-width:100%;margin:1rem 0}\
.content{white-space:pre-wrap;background:#f7f7f7;padding:1rem;max-height:24rem;overflow:auto}\
.downloads a{margin-right:1rem}";

/// The empty form.
pub fn index(error: Option<&str>) -> String {
    let mut body = form("", "");
    if let Some(error) = error {
        body.push_str(&format!("<p class=\"error\">{}</p>", text(error)));
    }
    layout(&body)
}

/// Scraped text only, for a URL submitted without a prompt.
pub fn preview(doc: &RawDocument) -> String {
    let mut body = form(&doc.url, "");
    body.push_str("<h2>Page content</h2>");
    body.push_str(&format!("<div class=\"content\">{}</div>", text(&doc.text)));
    layout(&body)
}

/// The full analysis: model answer, tables, charts and downloads.
pub fn report(report: &Report, prompt: &str) -> String {
    let mut body = form(&report.url, prompt);

    body.push_str("<h2>AI response</h2>");
    body.push_str(&response_to_html(&report.ai_response));

    if !report.tables_html.is_empty() {
        body.push_str("<h2>Tables</h2>");
        for table in &report.tables_html {
            body.push_str(table);
        }
    }

    if !report.charts.is_empty() {
        body.push_str("<h2>Charts</h2><div class=\"charts\">");
        for chart in &report.charts {
            body.push_str(&format!("<img src=\"{}\" alt=\"{}\">", attr(&image_src(chart)), attr(&chart.file_name)));
        }
        body.push_str("</div>");
    }

    if let Some(screenshot) = &report.screenshot {
        body.push_str("<h2>Screenshot</h2><div class=\"charts\">");
        body.push_str(&format!("<img src=\"{}\" alt=\"page screenshot\">", attr(&image_src(screenshot))));
        body.push_str("</div>");
    }

    let downloads: Vec<String> = [("Table PDF", &report.table_pdf), ("Report PDF", &report.report_pdf)]
        .into_iter()
        .filter_map(|(label, artifact)| artifact.as_ref().map(|a| download_link(label, a)))
        .collect();
    if !downloads.is_empty() {
        body.push_str(&format!("<h2>Downloads</h2><p class=\"downloads\">{}</p>", downloads.join("")));
    }

    layout(&body)
}

fn image_src(artifact: &Artifact) -> String {
    artifact.data_uri("image/png").unwrap_or_else(|| format!("/static/charts/{}", artifact.file_name))
}

fn download_link(label: &str, artifact: &Artifact) -> String {
    format!("<a href=\"/download/{}\">{}</a>", attr(&artifact.file_name), text(label))
}

fn form(url: &str, prompt: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/\">\
         <label for=\"url\">URL</label>\
         <input id=\"url\" name=\"url\" type=\"url\" required value=\"{}\">\
         <label for=\"prompt\">Prompt (leave empty to only scrape)</label>\
         <textarea id=\"prompt\" name=\"prompt\">{}</textarea>\
         <button type=\"submit\">Analyze</button>\
         </form>",
        attr(url),
        text(prompt)
    )
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Chartwise</title>\
         <style>{}</style></head><body><h1>Chartwise</h1>{}</body></html>",
        STYLE, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_index_escapes_error() {
        let html = index(Some("<b>bad</b>"));
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(html.contains("<form method=\"post\""));
    }

    #[test]
    fn test_preview_escapes_text_and_url() {
        let doc = RawDocument::new("https://example.com/?q=\"x\"", "<script>alert(1)</script>");
        let html = preview(&doc);

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("value=\"https://example.com/?q=&quot;x&quot;\""));
    }

    #[test]
    fn test_report_image_sources() {
        let mut inline = Artifact::new(PathBuf::from("/tmp/a_bar.png"));
        inline.inline_base64 = Some("AAAA".to_string());
        let linked = Artifact::new(PathBuf::from("/tmp/b_pie.png"));

        let report = Report {
            url: "https://example.com".to_string(),
            ai_response: "Summary".to_string(),
            charts: vec![inline, linked],
            report_pdf: Some(Artifact::new(PathBuf::from("/tmp/c_report.pdf"))),
            ..Default::default()
        };
        let html = super::report(&report, "Compare");

        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
        assert!(html.contains("src=\"/static/charts/b_pie.png\""));
        assert!(html.contains("<a href=\"/download/c_report.pdf\">Report PDF</a>"));
        assert!(!html.contains("Table PDF"));
        assert!(html.contains(">Compare</textarea>"));
    }
}
