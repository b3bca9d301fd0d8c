//! PDF ingestion: upload storage and per-page text extraction.
//!
//! Extraction sits behind [`PdfExtractor`] so the subprocess-based default
//! can be swapped for an in-process fake in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::{error, info};

use crate::error::RagError;
use crate::types::{Document, Origin};

/// Extracts the text of a PDF file, one string per page.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, RagError>;
}

/// Default extractor shelling out to the `pdftotext` binary (poppler).
/// Pages arrive separated by form feeds on stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdftotextExtractor;

#[async_trait]
impl PdfExtractor for PdftotextExtractor {
    async fn extract_pages(&self, path: &Path) -> Result<Vec<String>, RagError> {
        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .await
            .map_err(|err| {
                RagError::Extraction(format!(
                    "pdftotext command failed: {err} (is poppler installed?)"
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RagError::Extraction(format!("pdftotext failed: {stderr}")));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(RagError::Extraction(
                "pdftotext produced no text output".to_string(),
            ));
        }

        Ok(text.split('\u{c}').map(str::to_string).collect())
    }
}

/// Loads a PDF into one [`Document`] per non-empty page.
///
/// Extraction failures are recovered locally: the condition is logged and an
/// empty list is returned, which callers treat as "nothing to index" rather
/// than a hard failure.
pub async fn load_pdf(
    extractor: &dyn PdfExtractor,
    path: &Path,
) -> Result<Vec<Document>, RagError> {
    let pages = match extractor.extract_pages(path).await {
        Ok(pages) => pages,
        Err(RagError::Extraction(reason)) => {
            error!(path = %path.display(), %reason, "failed to process PDF");
            return Ok(Vec::new());
        }
        Err(other) => return Err(other),
    };

    let source_id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let documents: Vec<Document> = pages
        .into_iter()
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(index, page)| {
            Document::new(page, Origin::Pdf, &source_id)
                .with_metadata("source", path.display().to_string())
                .with_metadata("page", (index + 1).to_string())
        })
        .collect();

    if documents.is_empty() {
        error!(path = %path.display(), "no content extracted from PDF");
    } else {
        info!(path = %path.display(), pages = documents.len(), "loaded PDF");
    }
    Ok(documents)
}

/// Writes an uploaded file into the PDFs directory and returns its path.
pub async fn store_upload(
    directory: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, RagError> {
    fs::create_dir_all(directory).await?;
    let path = directory.join(file_name);
    fs::write(&path, bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeExtractor(Vec<String>);

    #[async_trait]
    impl PdfExtractor for FakeExtractor {
        async fn extract_pages(&self, _path: &Path) -> Result<Vec<String>, RagError> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl PdfExtractor for FailingExtractor {
        async fn extract_pages(&self, _path: &Path) -> Result<Vec<String>, RagError> {
            Err(RagError::Extraction("scrambled xref table".to_string()))
        }
    }

    #[tokio::test]
    async fn one_document_per_non_empty_page() {
        let extractor = FakeExtractor(vec![
            "page one text".to_string(),
            "   ".to_string(),
            "page three text".to_string(),
        ]);
        let documents = load_pdf(&extractor, Path::new("report.pdf")).await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source_id, "report.pdf");
        assert_eq!(documents[0].metadata.get("page").map(String::as_str), Some("1"));
        assert_eq!(documents[1].metadata.get("page").map(String::as_str), Some("3"));
        assert!(documents.iter().all(|d| d.origin == Origin::Pdf));
    }

    #[tokio::test]
    async fn extraction_failure_yields_empty_not_error() {
        let documents = load_pdf(&FailingExtractor, Path::new("broken.pdf"))
            .await
            .unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn store_upload_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_upload(dir.path(), "notes.pdf", b"%PDF-1.4 stub")
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4 stub");
    }
}
