use async_trait::async_trait;

use crate::errors::DeskPilotResult;
use crate::perception::types::{CapturedFrame, ScreenRect, UiSnapshot};

/// Produces model-ready frames of the primary monitor.
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    /// Capture the primary monitor, clipped to `target` when it is usable.
    async fn capture(
        &self,
        target: Option<(ScreenRect, String)>,
    ) -> DeskPilotResult<CapturedFrame>;
}

/// Accessibility-tree view of the foreground window.
#[async_trait]
pub trait UiInspector: Send + Sync {
    async fn snapshot(&self, screen: ScreenRect, max_elements: usize) -> DeskPilotResult<UiSnapshot>;
}
