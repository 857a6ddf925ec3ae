//! macOS-specific screenshot implementation using screencapture command

use std::fs;
use std::process::Command;

use tracing::{debug, error, info};

use super::{CaptureError, CaptureRegion};

const SCREENCAPTURE: &str = "/usr/sbin/screencapture";

pub(super) fn check_capture_tool() -> Result<(), CaptureError> {
    if std::path::Path::new(SCREENCAPTURE).exists() {
        Ok(())
    } else {
        Err(CaptureError::Unavailable(format!("{SCREENCAPTURE} not found")))
    }
}

/// Captures a screen region on macOS and returns PNG bytes.
/// With no region, shows a crosshair cursor for the user to select one.
pub(super) fn capture_screenshot(region: Option<CaptureRegion>) -> Result<Vec<u8>, CaptureError> {
    let temp = tempfile::Builder::new()
        .prefix("insight-ocr-screenshot-")
        .suffix(".png")
        .tempfile()?;
    let temp_path = temp.path().to_path_buf();
    debug!(path = %temp_path.display(), ?region, "Screenshot will be saved to temp file");

    // -x: disable sound; -i: interactive selection (Escape cancels); -R: fixed rectangle
    let mut cmd = Command::new(SCREENCAPTURE);
    cmd.arg("-x");
    match region {
        Some(r) => {
            cmd.arg("-R")
                .arg(format!("{},{},{},{}", r.x, r.y, r.width, r.height));
        }
        None => {
            cmd.arg("-i");
        }
    }
    let output = cmd.arg(&temp_path).output().map_err(|e| {
        CaptureError::Command(format!("Failed to execute screencapture: {}", e))
    })?;

    if !output.status.success() {
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Exit code 1 typically means user cancelled (Escape key)
        if exit_code == 1 && region.is_none() {
            debug!("User cancelled screenshot selection");
            return Err(CaptureError::Cancelled);
        }
        if stderr.contains("not authorized") || stderr.contains("permission") {
            return Err(CaptureError::PermissionDenied(stderr.trim().to_string()));
        }

        let error_msg = if stderr.trim().is_empty() {
            format!("screencapture failed with exit code {}", exit_code)
        } else {
            format!("screencapture failed: {}", stderr.trim())
        };
        error!(error = %error_msg, "Screenshot capture failed");
        return Err(CaptureError::Command(error_msg));
    }

    // Interactive mode exits 0 without writing a file when the selection is dismissed.
    let image_bytes = fs::read(&temp_path)?;
    if image_bytes.is_empty() {
        debug!("Screenshot file is empty, treating as cancelled");
        return Err(CaptureError::Cancelled);
    }

    info!(bytes = image_bytes.len(), "Screenshot captured");
    Ok(image_bytes)
}
