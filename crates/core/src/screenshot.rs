//! One-shot page screenshots with a headless Chrome/Chromium binary.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::render::ArtifactStore;
use crate::{ChartwiseError, Result};

const CHROME_CANDIDATES: [&str; 4] = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"];

/// Settings for headless screenshots.
#[derive(Debug, Clone)]
pub struct ScreenshotConfig {
    /// Browser binary; detected from a list of common names when unset.
    pub chrome_binary: Option<String>,
    /// Viewport as `(width, height)` in pixels.
    pub window_size: (u32, u32),
    /// Seconds before the browser process is abandoned.
    pub timeout: u64,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self { chrome_binary: None, window_size: (1280, 900), timeout: 30 }
    }
}

/// Finds the first Chrome/Chromium binary that answers `--version`.
pub async fn detect_chrome_binary() -> Option<String> {
    for candidate in CHROME_CANDIDATES {
        let status = Command::new(candidate)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if status.is_ok_and(|s| s.success()) {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Captures `url` to `<id>_screenshot.png` in `store`.
pub async fn capture_screenshot(url: &str, config: &ScreenshotConfig, store: &ArtifactStore) -> Result<PathBuf> {
    let chrome = match &config.chrome_binary {
        Some(binary) => binary.clone(),
        None => detect_chrome_binary()
            .await
            .ok_or_else(|| ChartwiseError::ScreenshotError("no Chrome/Chromium binary found".to_string()))?,
    };

    let path = store.allocate("screenshot", "png");
    let (width, height) = config.window_size;

    let mut command = Command::new(&chrome);
    command
        .arg("--headless")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--hide-scrollbars")
        .arg(format!("--window-size={},{}", width, height))
        .arg(format!("--screenshot={}", path.display()))
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(Duration::from_secs(config.timeout), command.output())
        .await
        .map_err(|_| ChartwiseError::Timeout { timeout: config.timeout })?
        .map_err(|e| ChartwiseError::ScreenshotError(format!("failed to run {}: {}", chrome, e)))?;

    if !output.status.success() {
        let _ = std::fs::remove_file(&path);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ChartwiseError::ScreenshotError(stderr.trim().to_string()));
    }

    if !path.is_file() {
        return Err(ChartwiseError::ScreenshotError("browser exited without writing a screenshot".to_string()));
    }

    tracing::debug!(url, file = %path.display(), "captured screenshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_screenshot_config_default() {
        let config = ScreenshotConfig::default();
        assert_eq!(config.window_size, (1280, 900));
        assert!(config.chrome_binary.is_none());
    }

    #[tokio::test]
    async fn test_capture_with_missing_binary() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        let config = ScreenshotConfig { chrome_binary: Some("/nonexistent/chrome".to_string()), ..Default::default() };

        let result = capture_screenshot("https://example.com", &config, &store).await;
        assert!(matches!(result, Err(ChartwiseError::ScreenshotError(_))));
    }
}
