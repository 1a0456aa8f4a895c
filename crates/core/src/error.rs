//! Error types for Chartwise operations.
//!
//! This module defines the main error type [`ChartwiseError`] which represents
//! everything that can go wrong while fetching a page, talking to the model,
//! or writing chart and PDF artifacts.
//!
//! The pipeline itself degrades instead of failing (see [`crate::pipeline`]),
//! so these errors mostly surface from the individual building blocks.
//!
//! # Example
//!
//! ```rust
//! use chartwise_core::{ChartwiseError, Result};
//!
//! fn require_text(text: &str) -> Result<&str> {
//!     if text.is_empty() {
//!         return Err(ChartwiseError::ModelError("empty response".to_string()));
//!     }
//!     Ok(text)
//! }
//! # assert!(require_text("").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fetching, model calls and artifact rendering.
#[derive(Error, Debug)]
pub enum ChartwiseError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File I/O errors.
    ///
    /// Wraps standard I/O errors for reading inputs and writing artifacts.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// The chat model returned something that is not a usable answer.
    #[error("Model error: {0}")]
    ModelError(String),

    /// The chat endpoint answered with a non-success status.
    #[error("Model endpoint returned status {status}: {body}")]
    ModelStatus { status: u16, body: String },

    /// Chart drawing or PNG encoding failed.
    #[error("Chart rendering failed: {0}")]
    ChartError(String),

    /// PDF assembly or serialization failed.
    #[error("PDF generation failed: {0}")]
    PdfError(String),

    /// An image could not be decoded for embedding.
    #[error("Image error: {0}")]
    ImageError(String),

    /// Headless browser screenshot failed.
    #[error("Screenshot failed: {0}")]
    ScreenshotError(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A report could not be serialized.
    #[error("Serialization failed: {0}")]
    SerializeError(String),
}

/// Result type alias for ChartwiseError.
pub type Result<T> = std::result::Result<T, ChartwiseError>;
