//! OCR (Optical Character Recognition) functionality

mod tesseract;
mod worker;

pub use tesseract::{TesseractConfig, TesseractEngine};
pub use worker::{spawn_ocr_worker, OcrHandle, OcrRequest};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::system::Frame;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine not ready: {0}")]
    NotReady(String),
    #[error("OCR engine failed: {0}")]
    Engine(String),
    #[error("Failed to parse OCR output: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounding box in pixel coordinates (origin at top-left)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64, // left
    pub y0: f64, // top
    pub x1: f64, // right
    pub y1: f64, // bottom
}

/// A word as reported by the OCR engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedWord {
    pub text: String,
    /// Engine confidence on a 0-100 scale
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl RecognizedWord {
    /// Confidence mapped onto 0-1.
    pub fn normalized_confidence(&self) -> f64 {
        (self.confidence / 100.0).clamp(0.0, 1.0)
    }
}

/// Something that turns a bitmap into words. Owned by the OCR worker thread.
pub trait OcrEngine {
    fn recognize(&mut self, frame: &Frame) -> Result<Vec<RecognizedWord>, OcrError>;
}
