//! Tesseract OCR engine driven through its command-line interface.
//!
//! Tesseract's `tsv` output config reports one row per detected element; rows at level 5 are
//! words, with pixel boxes and a 0-100 confidence (-1 for non-word rows).

use std::io::Write;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{BoundingBox, OcrEngine, OcrError, RecognizedWord};
use crate::system::Frame;

const WORD_LEVEL: &str = "5";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesseractConfig {
    /// Binary name or path
    pub binary: String,
    /// Tesseract language code(s), e.g. "eng" or "eng+deu"
    pub language: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    /// Verifies the binary runs before handing out an engine.
    pub fn new(config: TesseractConfig) -> Result<Self, OcrError> {
        let output = Command::new(&config.binary)
            .arg("--version")
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::NotReady(format!(
                    "{} not found (install tesseract-ocr)",
                    config.binary
                )),
                _ => OcrError::Io(e),
            })?;
        if !output.status.success() {
            return Err(OcrError::NotReady(format!(
                "{} --version exited with {}",
                config.binary, output.status
            )));
        }
        let version = String::from_utf8_lossy(&output.stdout);
        info!(
            binary = %config.binary,
            language = %config.language,
            version = %version.lines().next().unwrap_or_default(),
            "Tesseract engine ready"
        );
        Ok(Self { config })
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&mut self, frame: &Frame) -> Result<Vec<RecognizedWord>, OcrError> {
        let mut image = tempfile::Builder::new()
            .prefix("insight-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.write_all(frame.png())?;
        image.flush()?;
        debug!(path = %image.path().display(), bytes = frame.png().len(), "Wrote frame for tesseract");

        let output = Command::new(&self.config.binary)
            .arg(image.path())
            .arg("stdout")
            .args(["-l", &self.config.language])
            .arg("tsv")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(status = %output.status, stderr = %stderr.trim(), "Tesseract failed");
            return Err(OcrError::Engine(format!("tesseract failed: {}", stderr.trim())));
        }

        let words = parse_tsv(&String::from_utf8_lossy(&output.stdout))?;
        debug!(words = words.len(), "Tesseract recognition finished");
        Ok(words)
    }
}

fn column(header: &[&str], name: &str) -> Result<usize, OcrError> {
    header
        .iter()
        .position(|h| *h == name)
        .ok_or_else(|| OcrError::Parse(format!("missing '{name}' column")))
}

fn number(field: Option<&&str>, name: &str, line: usize) -> Result<f64, OcrError> {
    field
        .and_then(|v| v.trim().parse::<f64>().ok())
        .ok_or_else(|| OcrError::Parse(format!("bad '{name}' on line {line}")))
}

/// Parses tesseract TSV output into word-level detections.
pub(crate) fn parse_tsv(tsv: &str) -> Result<Vec<RecognizedWord>, OcrError> {
    let mut lines = tsv.lines();
    let Some(header_line) = lines.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<&str> = header_line.split('\t').collect();
    let level = column(&header, "level")?;
    let left = column(&header, "left")?;
    let top = column(&header, "top")?;
    let width = column(&header, "width")?;
    let height = column(&header, "height")?;
    let conf = column(&header, "conf")?;
    let text = column(&header, "text")?;

    let mut words = Vec::new();
    for (index, line) in lines.enumerate() {
        let line_no = index + 2;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.get(level) != Some(&WORD_LEVEL) {
            continue;
        }
        let confidence = number(fields.get(conf), "conf", line_no)?;
        if confidence < 0.0 {
            continue;
        }
        let x0 = number(fields.get(left), "left", line_no)?;
        let y0 = number(fields.get(top), "top", line_no)?;
        let w = number(fields.get(width), "width", line_no)?;
        let h = number(fields.get(height), "height", line_no)?;
        words.push(RecognizedWord {
            text: fields.get(text).copied().unwrap_or_default().to_string(),
            confidence,
            bbox: BoundingBox {
                x0,
                y0,
                x1: x0 + w.max(0.0),
                y1: y0 + h.max(0.0),
            },
        });
    }
    Ok(words)
}
