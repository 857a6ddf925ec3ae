//! Linux-specific screenshot implementation using grim (and slurp for interactive selection)

use std::fs;
use std::process::Command;

use tracing::{debug, error, info};

use super::{CaptureError, CaptureRegion};

fn command_exists(name: &str) -> bool {
    Command::new(name)
        .arg("-h")
        .output()
        .map(|_| true)
        .unwrap_or(false)
}

pub(super) fn check_capture_tool() -> Result<(), CaptureError> {
    if std::env::var_os("WAYLAND_DISPLAY").is_none() {
        return Err(CaptureError::Unavailable(
            "grim needs a Wayland session (WAYLAND_DISPLAY is not set)".to_string(),
        ));
    }
    if !command_exists("grim") {
        return Err(CaptureError::Unavailable("grim not found".to_string()));
    }
    Ok(())
}

/// Asks the user to drag out a region with slurp. Returns grim's `-g` geometry string.
fn select_region() -> Result<String, CaptureError> {
    let output = Command::new("slurp")
        .output()
        .map_err(|e| CaptureError::Unavailable(format!("slurp not available: {e}")))?;
    if !output.status.success() {
        debug!("User cancelled region selection");
        return Err(CaptureError::Cancelled);
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn geometry(region: CaptureRegion) -> String {
    format!("{},{} {}x{}", region.x, region.y, region.width, region.height)
}

/// Captures a screen region with grim and returns PNG bytes.
pub(super) fn capture_screenshot(region: Option<CaptureRegion>) -> Result<Vec<u8>, CaptureError> {
    let geometry = match region {
        Some(r) => geometry(r),
        None => select_region()?,
    };
    let temp = tempfile::Builder::new()
        .prefix("insight-ocr-screenshot-")
        .suffix(".png")
        .tempfile()?;
    debug!(path = %temp.path().display(), geometry = %geometry, "Running grim");

    let output = Command::new("grim")
        .args(["-t", "png", "-g", &geometry])
        .arg(temp.path())
        .output()
        .map_err(|e| CaptureError::Command(format!("Failed to execute grim: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("compositor doesn't support") {
            return Err(CaptureError::PermissionDenied(stderr.trim().to_string()));
        }
        error!(status = %output.status, stderr = %stderr.trim(), "grim failed");
        return Err(CaptureError::Command(format!("grim failed: {}", stderr.trim())));
    }

    let image_bytes = fs::read(temp.path())?;
    info!(bytes = image_bytes.len(), "Screenshot captured");
    Ok(image_bytes)
}
