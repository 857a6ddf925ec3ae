//! System interactions (screenshot, OCR, remote cleanup)

mod ocr;
mod screenshot;
pub mod text_cleanup;

pub use ocr::{
    spawn_ocr_worker, BoundingBox, OcrEngine, OcrError, OcrHandle, OcrRequest, RecognizedWord,
    TesseractConfig, TesseractEngine,
};
pub use screenshot::{
    CaptureError, CaptureRegion, Frame, FrameSource, ImageFileSource, ScreenshotSource,
};
pub use text_cleanup::{
    cleanup_with_fallback, CleanupError, RemoteTextGenerator, TextGenerator, DEFAULT_CLEANUP_URL,
};
