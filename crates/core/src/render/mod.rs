//! Artifact rendering: HTML tables, chart images and PDF exports.
//!
//! Every file is written through an [`ArtifactStore`], which owns the output
//! directory and the `<random-id>_<kind>.<ext>` naming scheme. Files are never
//! reused or cleaned up.

pub mod chart;
pub mod html;
#[cfg(feature = "pdf")]
pub mod pdf;

pub use chart::render_chart;
pub use html::{response_to_html, table_to_html, tables_to_html};
#[cfg(feature = "pdf")]
pub use pdf::{ReportContents, report_pdf, table_pdf};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::Result;

/// A file written to the artifact directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    /// Full path on disk.
    pub path: PathBuf,
    /// Bare file name, as used by the download route.
    pub file_name: String,
    /// Base64 of the file contents, when inline embedding was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_base64: Option<String>,
}

impl Artifact {
    pub fn new(path: PathBuf) -> Self {
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Self { path, file_name, inline_base64: None }
    }

    /// A `data:` URI for direct embedding, if inline bytes are available.
    pub fn data_uri(&self, mime: &str) -> Option<String> {
        self.inline_base64.as_ref().map(|b64| format!("data:{};base64,{}", mime, b64))
    }
}

/// The directory generated artifacts are written to.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A fresh, collision-free path named `<random-id>_<kind>.<ext>`.
    pub fn allocate(&self, kind: &str, ext: &str) -> PathBuf {
        let id = Uuid::new_v4().simple();
        self.dir.join(format!("{}_{}.{}", id, kind, ext))
    }

    /// Resolves a download request to an existing file in the store.
    ///
    /// Only plain file names are accepted; anything with a path separator or a
    /// parent reference resolves to `None`, as does a missing file.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let is_plain = !file_name.is_empty()
            && !file_name.starts_with('.')
            && !file_name.contains(['/', '\\'])
            && Path::new(file_name).file_name().is_some_and(|n| n == file_name);
        if !is_plain {
            return None;
        }

        let path = self.dir.join(file_name);
        path.is_file().then_some(path)
    }
}
