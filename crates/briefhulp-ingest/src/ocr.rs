//! Text from PDFs and photographed letters via external binaries
//! (`pdftotext` from poppler, `tesseract`).

use std::io::Write;
use std::path::Path;

use briefhulp_core::{Error, OcrSettings, Result};
use tokio::process::Command;
use tracing::{debug, info};

use crate::file::{decode_text, FileKind};

/// Extracts letter text from uploaded bytes or files on disk.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    settings: OcrSettings,
}

impl TextExtractor {
    pub fn new(settings: OcrSettings) -> Self {
        Self { settings }
    }

    /// Extract text from in-memory bytes (an upload).
    ///
    /// Returns `Error::Extraction` when nothing readable was found.
    pub async fn extract_bytes(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let kind = FileKind::from_name(name);
        let text = match kind {
            FileKind::Text => decode_text(bytes),
            FileKind::Pdf | FileKind::Image => {
                let mut tmp = tempfile::Builder::new()
                    .prefix("briefhulp-")
                    .suffix(kind.temp_suffix())
                    .tempfile()?;
                tmp.write_all(bytes)?;
                tmp.flush()?;
                self.run_tool(kind, tmp.path()).await?
            }
            FileKind::Unsupported => {
                return Err(Error::Validation(format!("unsupported file type: {}", name)));
            }
        };
        non_empty(text, name)
    }

    /// Extract text from a file on disk.
    pub async fn extract_path(&self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let kind = FileKind::from_name(&name);
        let text = match kind {
            FileKind::Text => decode_text(&tokio::fs::read(path).await?),
            FileKind::Pdf | FileKind::Image => self.run_tool(kind, path).await?,
            FileKind::Unsupported => {
                return Err(Error::Validation(format!("unsupported file type: {}", name)));
            }
        };
        non_empty(text, &name)
    }

    async fn run_tool(&self, kind: FileKind, input: &Path) -> Result<String> {
        let (program, mut cmd) = match kind {
            FileKind::Pdf => {
                let mut cmd = Command::new(&self.settings.pdftotext_cmd);
                cmd.arg("-layout").arg("-enc").arg("UTF-8").arg(input).arg("-");
                (&self.settings.pdftotext_cmd, cmd)
            }
            _ => {
                let mut cmd = Command::new(&self.settings.tesseract_cmd);
                cmd.arg(input).arg("stdout").arg("-l").arg(&self.settings.language);
                (&self.settings.tesseract_cmd, cmd)
            }
        };

        debug!("Running {} on {}", program, input.display());
        let output = cmd.kill_on_drop(true).output().await.map_err(|e| {
            Error::Ocr(format!("could not start {}: {}", program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        let text = decode_text(&output.stdout);
        info!("{} extracted {} chars", program, text.len());
        Ok(text)
    }
}

fn non_empty(text: String, name: &str) -> Result<String> {
    if text.trim().is_empty() {
        Err(Error::Extraction(format!("no text found in {}", name)))
    } else {
        Ok(text)
    }
}
