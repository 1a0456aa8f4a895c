use std::sync::Arc;

use axum::Router;
use axum::extract::{Form, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use chartwise_core::{ChatModel, Pipeline};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::page;

type SharedPipeline<M> = Arc<Pipeline<M>>;

/// Form fields of the analysis page.
#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub prompt: String,
}

/// Builds the application router around a shared pipeline.
pub fn router<M>(pipeline: SharedPipeline<M>) -> Router
where
    M: ChatModel + Send + Sync + 'static,
{
    let charts_dir = pipeline.store().dir().to_path_buf();

    Router::new()
        .route("/", get(index).post(analyze::<M>))
        .route("/download/{filename}", get(download::<M>))
        .nest_service("/static/charts", ServeDir::new(charts_dir))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CompressionLayer::new()))
        .with_state(pipeline)
}

async fn index() -> Html<String> {
    Html(page::index(None))
}

/// URL only: scrape and show the text. URL and prompt: full analysis.
async fn analyze<M>(State(pipeline): State<SharedPipeline<M>>, Form(form): Form<AnalyzeForm>) -> Html<String>
where
    M: ChatModel + Send + Sync + 'static,
{
    let url = form.url.trim();
    let prompt = form.prompt.trim();

    if url.is_empty() {
        return Html(page::index(Some("Please enter a URL.")));
    }

    if prompt.is_empty() {
        let doc = pipeline.preview(url).await;
        return Html(page::preview(&doc));
    }

    tracing::info!(url, "analyzing page");
    let report = pipeline.run(url, prompt).await;
    Html(page::report(&report, prompt))
}

async fn download<M>(State(pipeline): State<SharedPipeline<M>>, Path(filename): Path<String>) -> Response
where
    M: ChatModel + Send + Sync + 'static,
{
    let Some(path) = pipeline.store().resolve(&filename) else {
        return not_found();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"{}\"", filename);
            ([(header::CONTENT_TYPE, content_type(&filename)), (header::CONTENT_DISPOSITION, disposition.as_str())], bytes)
                .into_response()
        }
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "download failed");
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

fn content_type(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chartwise_core::{PipelineConfig, Result};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const RESPONSE: &str = "Prices by brand.\n\n|Brand|Price|\n|---|---|\n|<i>Apple</i>|900|\n|Samsung|700|\n";

    struct StubModel;

    impl ChatModel for StubModel {
        async fn chat(&self, _prompt: &str) -> Result<String> {
            Ok(RESPONSE.to_string())
        }
    }

    fn app(tmp: &TempDir) -> (Router, SharedPipeline<StubModel>) {
        let config = PipelineConfig::builder().output_dir(tmp.path().join("charts")).export_pdf(false).build();
        let pipeline = Arc::new(Pipeline::new(config, StubModel).unwrap());
        (router(pipeline.clone()), pipeline)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_form(body: &'static str) -> Request<Body> {
        Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = app(&tmp);

        let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<form method=\"post\""));
    }

    #[tokio::test]
    async fn test_post_without_url() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = app(&tmp);

        let response = app.oneshot(post_form("url=&prompt=")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Please enter a URL."));
    }

    #[tokio::test]
    async fn test_post_url_only_previews() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = app(&tmp);

        let response = app.oneshot(post_form("url=ftp%3A%2F%2Fexample.com&prompt=")).await.unwrap();
        let body = body_text(response).await;
        assert!(body.contains("Error scraping website"));
        assert!(!body.contains("AI response"));
    }

    #[tokio::test]
    async fn test_post_with_prompt_renders_escaped_tables() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = app(&tmp);

        let response = app.oneshot(post_form("url=ftp%3A%2F%2Fexample.com&prompt=Compare+prices")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("AI response"));
        assert!(body.contains("class=\"styled-table\""));
        assert!(body.contains("<td>&lt;i&gt;Apple&lt;/i&gt;</td>"));
        assert!(!body.contains("<i>Apple</i>"));
    }

    #[tokio::test]
    async fn test_download_existing_file() {
        let tmp = TempDir::new().unwrap();
        let (app, pipeline) = app(&tmp);
        let path = pipeline.store().allocate("report", "pdf");
        std::fs::write(&path, b"%PDF-1.3").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();

        let response =
            app.oneshot(Request::get(format!("/download/{}", name)).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(body_text(response).await, "%PDF-1.3");
    }

    #[tokio::test]
    async fn test_download_missing_file() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = app(&tmp);

        let response = app.oneshot(Request::get("/download/missing_report.pdf").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "not found");
    }

    #[tokio::test]
    async fn test_download_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let (app, _) = app(&tmp);
        std::fs::write(tmp.path().join("secret.txt"), b"secret").unwrap();

        let response =
            app.oneshot(Request::get("/download/..%2Fsecret.txt").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_charts_served() {
        let tmp = TempDir::new().unwrap();
        let (app, pipeline) = app(&tmp);
        let path = pipeline.store().allocate("bar", "png");
        std::fs::write(&path, b"png").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();

        let response =
            app.oneshot(Request::get(format!("/static/charts/{}", name)).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a_bar.png"), "image/png");
        assert_eq!(content_type("a_report.PDF"), "application/pdf");
        assert_eq!(content_type("notes"), "application/octet-stream");
    }
}
