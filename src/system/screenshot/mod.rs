//! Screenshot capture functionality
//!
//! Frames come from a `FrameSource`: the platform screenshot tool for live captures, or image
//! files for offline runs. Every frame is stored as PNG bytes, which is what OCR engines read.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

use std::collections::VecDeque;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Screenshot selection cancelled by user")]
    Cancelled,
    #[error("Screen capture permission denied: {0}")]
    PermissionDenied(String),
    #[error("Screen capture unavailable: {0}")]
    Unavailable(String),
    #[error("Screenshot command failed: {0}")]
    Command(String),
    #[error("No more frames available")]
    Exhausted,
    #[error("Capture region lies outside the {width}x{height} frame")]
    EmptyRegion { width: u32, height: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Screen rectangle to capture, in pixels.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One still image, PNG encoded.
#[derive(Clone)]
pub struct Frame {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    pub fn from_image(image: &DynamicImage) -> Result<Self, CaptureError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            png,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Decodes any format the `image` crate understands and re-encodes it as PNG.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CaptureError> {
        let image = image::load_from_memory(bytes)?;
        Self::from_image(&image)
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cuts `region` out of the frame, clamped to the frame's bounds.
    pub fn crop(&self, region: CaptureRegion) -> Result<Self, CaptureError> {
        let x = region.x.max(0) as u32;
        let y = region.y.max(0) as u32;
        let right = (i64::from(region.x) + i64::from(region.width))
            .clamp(0, i64::from(self.width)) as u32;
        let bottom = (i64::from(region.y) + i64::from(region.height))
            .clamp(0, i64::from(self.height)) as u32;
        if x >= right || y >= bottom {
            return Err(CaptureError::EmptyRegion {
                width: self.width,
                height: self.height,
            });
        }
        let image = image::load_from_memory_with_format(&self.png, ImageFormat::Png)?;
        Self::from_image(&image.crop_imm(x, y, right - x, bottom - y))
    }

    #[cfg(test)]
    pub(crate) fn blank(width: u32, height: u32) -> Self {
        Self::from_image(&DynamicImage::new_rgb8(width, height)).expect("encode blank frame")
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

/// Yields frames on request. Calls block, so async callers run them on the blocking pool.
pub trait FrameSource: Send {
    /// Checks the source can deliver frames (tool installed, permission granted).
    fn prepare(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Live capture through the platform screenshot tool.
#[derive(Debug, Clone, Default)]
pub struct ScreenshotSource {
    /// Fixed region; `None` lets the user drag one out.
    pub region: Option<CaptureRegion>,
}

impl ScreenshotSource {
    pub fn new(region: Option<CaptureRegion>) -> Self {
        Self { region }
    }
}

impl FrameSource for ScreenshotSource {
    fn prepare(&mut self) -> Result<(), CaptureError> {
        check_capture_tool()
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let bytes = capture_screenshot(self.region)?;
        let frame = Frame::from_bytes(&bytes)?;
        info!(
            width = frame.width(),
            height = frame.height(),
            "Screenshot captured successfully"
        );
        Ok(frame)
    }
}

/// Frames read from image files, one per call, in the given order.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    paths: VecDeque<PathBuf>,
    region: Option<CaptureRegion>,
}

impl ImageFileSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>, region: Option<CaptureRegion>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
            region,
        }
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageFileSource {
    fn prepare(&mut self) -> Result<(), CaptureError> {
        match self.paths.iter().find(|p| !p.is_file()) {
            Some(missing) => Err(CaptureError::Unavailable(format!(
                "image file not found: {}",
                missing.display()
            ))),
            None => Ok(()),
        }
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let path = self.paths.pop_front().ok_or(CaptureError::Exhausted)?;
        debug!(path = %path.display(), "Loading frame from file");
        let frame = Frame::from_bytes(&std::fs::read(&path)?)?;
        match self.region {
            Some(region) => frame.crop(region),
            None => Ok(frame),
        }
    }
}

#[cfg(target_os = "macos")]
use macos::{capture_screenshot, check_capture_tool};

#[cfg(target_os = "linux")]
use linux::{capture_screenshot, check_capture_tool};

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn check_capture_tool() -> Result<(), CaptureError> {
    Err(CaptureError::Unavailable(
        "screen capture not implemented for this platform".to_string(),
    ))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn capture_screenshot(_region: Option<CaptureRegion>) -> Result<Vec<u8>, CaptureError> {
    Err(CaptureError::Unavailable(
        "screen capture not implemented for this platform".to_string(),
    ))
}
