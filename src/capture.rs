//! Capture adapter: screenshot the display, run OCR, hand back text.
//!
//! Both steps shell out to external tools (the platform screenshot utility
//! and `tesseract`); any failure surfaces as one capture error, no retry.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use uuid::Uuid;

use crate::core::errors::ApiError;

/// Screen rectangle to capture; full screen when absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Capture the screen (or `region`) and return the OCR'd text, which
    /// may be empty.
    async fn capture_text(&self, region: Option<CaptureRegion>) -> Result<String, ApiError>;
}

/// Which screenshot utility is available on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenshotTool {
    /// macOS `screencapture`
    ScreenCapture,
    /// Wayland `grim`
    Grim,
    /// ImageMagick `import` (X11)
    Import,
    /// `gnome-screenshot`; full screen only
    GnomeScreenshot,
}

pub struct OcrCapture {
    tool: ScreenshotTool,
    screenshot_bin: PathBuf,
    tesseract_bin: PathBuf,
}

impl OcrCapture {
    /// Locate the screenshot utility and `tesseract` on PATH.
    pub fn detect() -> Result<Self, ApiError> {
        let tesseract_bin = which::which("tesseract")
            .map_err(|_| ApiError::Upstream("tesseract not found on PATH".to_string()))?;

        let candidates = [
            ("screencapture", ScreenshotTool::ScreenCapture),
            ("grim", ScreenshotTool::Grim),
            ("import", ScreenshotTool::Import),
            ("gnome-screenshot", ScreenshotTool::GnomeScreenshot),
        ];
        let (screenshot_bin, tool) = candidates
            .iter()
            .find_map(|(name, tool)| which::which(name).ok().map(|path| (path, *tool)))
            .ok_or_else(|| {
                ApiError::Upstream("no screenshot utility found on PATH".to_string())
            })?;

        tracing::info!(
            "Capture adapter ready: {} + {}",
            screenshot_bin.display(),
            tesseract_bin.display()
        );

        Ok(Self {
            tool,
            screenshot_bin,
            tesseract_bin,
        })
    }

    async fn take_screenshot(
        &self,
        region: Option<CaptureRegion>,
        out_path: &Path,
    ) -> Result<(), ApiError> {
        let args = screenshot_args(self.tool, region, out_path)?;
        let output = Command::new(&self.screenshot_bin)
            .args(&args)
            .output()
            .await
            .map_err(|e| ApiError::Upstream(format!("screenshot command failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::Upstream(format!(
                "screenshot command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    async fn run_ocr(&self, image_path: &Path) -> Result<String, ApiError> {
        let output = Command::new(&self.tesseract_bin)
            .arg(image_path)
            .arg("stdout")
            .output()
            .await
            .map_err(|e| ApiError::Upstream(format!("tesseract failed to start: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::Upstream(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl CaptureSource for OcrCapture {
    async fn capture_text(&self, region: Option<CaptureRegion>) -> Result<String, ApiError> {
        let image_path =
            std::env::temp_dir().join(format!("second-brain-{}.png", Uuid::new_v4()));

        let result = async {
            self.take_screenshot(region, &image_path).await?;
            self.run_ocr(&image_path).await
        }
        .await;

        let _ = std::fs::remove_file(&image_path);
        result
    }
}

/// Argument list for each supported screenshot tool.
fn screenshot_args(
    tool: ScreenshotTool,
    region: Option<CaptureRegion>,
    out_path: &Path,
) -> Result<Vec<String>, ApiError> {
    let path = out_path.to_string_lossy().into_owned();
    let args = match (tool, region) {
        (ScreenshotTool::ScreenCapture, None) => vec!["-x".into(), path],
        (ScreenshotTool::ScreenCapture, Some(r)) => vec![
            "-x".into(),
            "-R".into(),
            format!("{},{},{},{}", r.x, r.y, r.width, r.height),
            path,
        ],
        (ScreenshotTool::Grim, None) => vec![path],
        (ScreenshotTool::Grim, Some(r)) => vec![
            "-g".into(),
            format!("{},{} {}x{}", r.x, r.y, r.width, r.height),
            path,
        ],
        (ScreenshotTool::Import, None) => {
            vec!["-window".into(), "root".into(), path]
        }
        (ScreenshotTool::Import, Some(r)) => vec![
            "-window".into(),
            "root".into(),
            "-crop".into(),
            format!("{}x{}+{}+{}", r.width, r.height, r.x, r.y),
            path,
        ],
        (ScreenshotTool::GnomeScreenshot, None) => vec!["-f".into(), path],
        (ScreenshotTool::GnomeScreenshot, Some(_)) => {
            return Err(ApiError::BadRequest(
                "region capture is not supported with gnome-screenshot".to_string(),
            ))
        }
    };
    Ok(args)
}
