use async_trait::async_trait;
use mupdf::{Document, TextPageFlags};
use std::path::Path;
use tracing::info;

use super::TextExtractor;
use crate::error::ServiceError;

/// Extracts the text layer of a PDF with MuPDF, page by page.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfTextExtractor;

#[async_trait]
impl TextExtractor for MupdfTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, ServiceError> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| ServiceError::Pdf(e.to_string()))?
        {
            return Err(ServiceError::Pdf(format!(
                "PDF file not found: {}",
                path.display()
            )));
        }

        let path_owned = path.to_path_buf();
        let (pages, text) = tokio::task::spawn_blocking(move || read_pdf_text(&path_owned))
            .await
            .map_err(|e| ServiceError::Pdf(e.to_string()))??;

        if text.trim().is_empty() {
            return Err(ServiceError::Pdf(
                "no text layer found in PDF (scanned document?)".to_string(),
            ));
        }

        info!(
            path = %path.display(),
            pages,
            chars = text.len(),
            "Loaded PDF text"
        );
        Ok(text)
    }
}

fn read_pdf_text(path: &Path) -> Result<(usize, String), ServiceError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ServiceError::Pdf("invalid path encoding".to_string()))?;
    let document = Document::open(path_str).map_err(|e| ServiceError::Pdf(e.to_string()))?;

    let mut pages_text = Vec::new();
    for page in document
        .pages()
        .map_err(|e| ServiceError::Pdf(e.to_string()))?
    {
        let page = page.map_err(|e| ServiceError::Pdf(e.to_string()))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| ServiceError::Pdf(e.to_string()))?;

        let mut page_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let line_text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                page_text.push_str(&line_text);
                page_text.push('\n');
            }
        }
        pages_text.push(page_text);
    }

    Ok((pages_text.len(), pages_text.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = MupdfTextExtractor
            .extract_text(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    /// Requires: PDF_TEST_PATH pointing at a text PDF
    #[tokio::test]
    async fn extracts_text_from_sample_pdf() -> anyhow::Result<()> {
        let pdf_path = match std::env::var("PDF_TEST_PATH") {
            Ok(path) => path,
            Err(_) => {
                println!("Skipping test - set PDF_TEST_PATH environment variable");
                return Ok(());
            }
        };

        let text = MupdfTextExtractor.extract_text(Path::new(&pdf_path)).await?;
        assert!(!text.trim().is_empty());
        Ok(())
    }
}
