use html_escape::encode_text;

use crate::parser::TableData;

/// Render a table as escaped HTML.
pub fn table_to_html(table: &TableData) -> String {
    let mut html = String::from("<table class=\"styled-table\"><thead><tr>");
    for header in &table.headers {
        html.push_str(&format!("<th>{}</th>", encode_text(header)));
    }
    html.push_str("</tr></thead><tbody>");

    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", encode_text(cell)));
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
    html
}

/// Render each table independently.
pub fn tables_to_html(tables: &[TableData]) -> Vec<String> {
    tables.iter().map(table_to_html).collect()
}

/// Render the raw model answer as escaped, whitespace-preserving HTML.
pub fn response_to_html(text: &str) -> String {
    format!("<div class=\"ai-response\" style=\"white-space: pre-wrap\">{}</div>", encode_text(text))
}
