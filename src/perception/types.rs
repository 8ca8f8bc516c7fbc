use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in physical screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    /// Overlapping part of both rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(ScreenRect::new(left, top, (right - left) as u32, (bottom - top) as u32))
    }
}

/// Physical geometry of the monitor a frame was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorGeometry {
    pub rect: ScreenRect,
    pub scale_factor: f64,
}

impl MonitorGeometry {
    /// DPI-corrected monitor size.
    pub fn logical_size(&self) -> (u32, u32) {
        let scale = if self.scale_factor > 0.0 { self.scale_factor } else { 1.0 };
        (
            ((self.rect.width as f64 / scale).round() as u32).max(1),
            ((self.rect.height as f64 / scale).round() as u32).max(1),
        )
    }
}

/// An image ready for the model plus the screen area it shows.
///
/// `image` already carries the alignment grid and may be downscaled; `region`
/// and `monitor` always describe the pre-downscale physical geometry.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub image: image::RgbImage,
    pub region: ScreenRect,
    pub monitor: ScreenRect,
    pub logical_size: (u32, u32),
    /// Set when the capture was clipped to the foreground window.
    pub window_name: Option<String>,
}

impl CapturedFrame {
    pub fn is_cropped(&self) -> bool {
        self.region != self.monitor
    }
}

/// Mapping parameters from a captured image back to the full screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureContext {
    pub region: ScreenRect,
    pub monitor: ScreenRect,
    pub logical_width: u32,
    pub logical_height: u32,
}

impl From<&CapturedFrame> for CaptureContext {
    fn from(frame: &CapturedFrame) -> Self {
        Self {
            region: frame.region,
            monitor: frame.monitor,
            logical_width: frame.logical_size.0,
            logical_height: frame.logical_size.1,
        }
    }
}

/// Foreground window as reported by the OS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForegroundWindow {
    pub name: String,
    pub rect: ScreenRect,
    pub process_name: Option<String>,
}

/// An interactive control found in the foreground window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    pub label: String,
    pub kind: String,
    /// Centre, normalized 0–1000 against the full screen.
    pub screen_x: u32,
    pub screen_y: u32,
    /// Centre, normalized 0–1000 against the window (when the window rect is usable).
    pub window_pos: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSnapshot {
    pub window_name: Option<String>,
    pub elements: Vec<UiElement>,
}
