use async_trait::async_trait;
use base64::Engine as _;
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::config::CaptureConfig;
use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::perception::grid::draw_alignment_grid;
use crate::perception::traits::ScreenCapturer;
use crate::perception::types::{CapturedFrame, MonitorGeometry, ScreenRect};

/// Decide which part of the monitor to capture.
///
/// The target is used only when both of its edges exceed `min_logical` logical
/// pixels; it is always clamped to the monitor. Anything else falls back to the
/// full monitor.
pub fn plan_capture_region(
    monitor: &MonitorGeometry,
    target: Option<&ScreenRect>,
    min_logical: u32,
) -> ScreenRect {
    let Some(target) = target else {
        return monitor.rect;
    };
    let scale = if monitor.scale_factor > 0.0 { monitor.scale_factor } else { 1.0 };
    let logical_w = target.width as f64 / scale;
    let logical_h = target.height as f64 / scale;
    if logical_w <= min_logical as f64 || logical_h <= min_logical as f64 {
        tracing::debug!(?target, "target region too small; capturing full monitor");
        return monitor.rect;
    }
    match monitor.rect.intersect(target) {
        Some(region) => region,
        None => {
            tracing::debug!(?target, "target region off-monitor; capturing full monitor");
            monitor.rect
        }
    }
}

/// Crop `screen` (a full-monitor capture) to `region`, draw the grid, and
/// downscale to `max_width` if needed.
pub fn prepare_frame(
    screen: &RgbImage,
    monitor: &MonitorGeometry,
    region: ScreenRect,
    cfg: &CaptureConfig,
    window_name: Option<String>,
) -> DeskPilotResult<CapturedFrame> {
    let region = monitor.rect.intersect(&region).ok_or_else(|| {
        DeskPilotError::Perception(format!("capture region {region:?} outside monitor"))
    })?;
    let off_x = (region.left - monitor.rect.left) as u32;
    let off_y = (region.top - monitor.rect.top) as u32;
    let (sw, sh) = screen.dimensions();
    if off_x >= sw || off_y >= sh {
        return Err(DeskPilotError::Perception("capture region outside image".into()));
    }
    let crop_w = region.width.min(sw - off_x);
    let crop_h = region.height.min(sh - off_y);

    let mut image = if (off_x, off_y, crop_w, crop_h) == (0, 0, sw, sh) {
        screen.clone()
    } else {
        imageops::crop_imm(screen, off_x, off_y, crop_w, crop_h).to_image()
    };

    draw_alignment_grid(&mut image, cfg.grid_divisions);

    if cfg.max_width > 0 && image.width() > cfg.max_width {
        let ratio = cfg.max_width as f64 / image.width() as f64;
        let new_h = ((image.height() as f64 * ratio).round() as u32).max(1);
        image = imageops::resize(&image, cfg.max_width, new_h, FilterType::Triangle);
    }

    let cropped = region != monitor.rect;
    Ok(CapturedFrame {
        image,
        region,
        monitor: monitor.rect,
        logical_size: monitor.logical_size(),
        window_name: if cropped { window_name } else { None },
    })
}

/// JPEG-encode an image as a `data:` URI for the chat API.
pub fn encode_jpeg_data_uri(image: &RgbImage, quality: u8) -> DeskPilotResult<String> {
    let mut bytes = Vec::new();
    {
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        encoder
            .encode_image(image)
            .map_err(|e| DeskPilotError::Perception(format!("JPEG encode: {e}")))?;
    }
    let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:image/jpeg;base64,{b64}"))
}

/// Primary-monitor capture through `xcap`.
pub struct XcapCapturer {
    cfg: CaptureConfig,
}

impl XcapCapturer {
    pub fn new(cfg: CaptureConfig) -> Self {
        Self { cfg }
    }
}

fn grab_primary() -> DeskPilotResult<(RgbImage, MonitorGeometry)> {
    let monitors = xcap::Monitor::all()
        .map_err(|e| DeskPilotError::Perception(format!("enumerate monitors: {e}")))?;
    let monitor = monitors
        .iter()
        .find(|m| m.is_primary())
        .or_else(|| monitors.first())
        .ok_or_else(|| DeskPilotError::Perception("no monitors found".into()))?;

    let raw = monitor
        .capture_image()
        .map_err(|e| DeskPilotError::Perception(format!("screen capture failed: {e}")))?;
    let image = image::DynamicImage::ImageRgba8(raw).to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(DeskPilotError::Perception(
            "captured empty screenshot (missing permission or no display?)".into(),
        ));
    }

    let geometry = MonitorGeometry {
        rect: ScreenRect::new(monitor.x(), monitor.y(), image.width(), image.height()),
        scale_factor: monitor.scale_factor() as f64,
    };
    Ok((image, geometry))
}

#[async_trait]
impl ScreenCapturer for XcapCapturer {
    async fn capture(
        &self,
        target: Option<(ScreenRect, String)>,
    ) -> DeskPilotResult<CapturedFrame> {
        let cfg = self.cfg.clone();
        tokio::task::spawn_blocking(move || {
            let (screen, monitor) = grab_primary()?;
            let (target_rect, window_name) = match target {
                Some((rect, name)) => (Some(rect), Some(name)),
                None => (None, None),
            };
            let region = plan_capture_region(&monitor, target_rect.as_ref(), cfg.min_region_logical);
            let frame = prepare_frame(&screen, &monitor, region, &cfg, window_name)?;
            tracing::debug!(
                region = ?frame.region,
                sent = %format!("{}x{}", frame.image.width(), frame.image.height()),
                scale = monitor.scale_factor,
                "frame captured"
            );
            Ok(frame)
        })
        .await
        .map_err(|e| DeskPilotError::join("capture", e))?
    }
}
