//! Foreground-window UI element collection.
//!
//! On Windows this walks the UI Automation control view of the foreground window
//! and reports interactive controls with both screen- and window-normalized
//! centres. On other platforms the inspector returns an empty snapshot.
use async_trait::async_trait;

use crate::errors::DeskPilotResult;
use crate::perception::traits::UiInspector;
use crate::perception::types::{ScreenRect, UiElement, UiSnapshot};

/// Normalized centres closer than this (per axis) with the same label and kind
/// are treated as one element.
const DUPLICATE_RADIUS: u32 = 5;

/// Centre of `rect` normalized to 0–1000 against `frame`, clamped.
pub fn normalized_center(rect: &ScreenRect, frame: &ScreenRect) -> (u32, u32) {
    let cx = rect.left as f64 + rect.width as f64 / 2.0;
    let cy = rect.top as f64 + rect.height as f64 / 2.0;
    let nx = (cx - frame.left as f64) / frame.width.max(1) as f64 * 1000.0;
    let ny = (cy - frame.top as f64) / frame.height.max(1) as f64 * 1000.0;
    (nx.clamp(0.0, 1000.0) as u32, ny.clamp(0.0, 1000.0) as u32)
}

/// Append `element` unless an equivalent one is already present.
pub fn push_unique(elements: &mut Vec<UiElement>, element: UiElement) -> bool {
    let duplicate = elements.iter().any(|e| {
        e.label == element.label
            && e.kind == element.kind
            && e.screen_x.abs_diff(element.screen_x) < DUPLICATE_RADIUS
            && e.screen_y.abs_diff(element.screen_y) < DUPLICATE_RADIUS
    });
    if !duplicate {
        elements.push(element);
    }
    !duplicate
}

/// Text block handed to the model alongside the screenshot.
pub fn format_ui_summary(snapshot: &UiSnapshot) -> String {
    let Some(window) = snapshot.window_name.as_deref() else {
        return "No foreground window detected.".to_string();
    };
    if snapshot.elements.is_empty() {
        return format!("Window: {window}\nNo interactive UI elements detected.");
    }

    let mut elements: Vec<&UiElement> = snapshot.elements.iter().collect();
    elements.sort_by_key(|e| (e.screen_y, e.screen_x));

    let mut lines = vec![
        format!("Foreground Window: {window}"),
        "Detected UI Elements:".to_string(),
    ];
    for el in elements {
        let label = if el.label.is_empty() {
            "Unnamed".to_string()
        } else {
            format!("\"{}\"", el.label)
        };
        match el.window_pos {
            Some((wx, wy)) => lines.push(format!(
                "- {}: {} at screen=({}, {}), window=({}, {})",
                el.kind, label, el.screen_x, el.screen_y, wx, wy
            )),
            None => lines.push(format!(
                "- {}: {} at screen=({}, {})",
                el.kind, label, el.screen_x, el.screen_y
            )),
        }
    }
    lines.join("\n")
}

// ── Windows implementation ──────────────────────────────────────────────────

#[cfg(target_os = "windows")]
mod win {
    use super::*;
    use crate::errors::DeskPilotError;
    use windows::Win32::Foundation::RECT;
    use windows::Win32::System::Com::{
        CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_MULTITHREADED,
    };
    use windows::Win32::UI::Accessibility::{
        CUIAutomation, IUIAutomation, IUIAutomationElement, IUIAutomationTreeWalker,
        UIA_CONTROLTYPE_ID,
    };
    use windows::Win32::UI::WindowsAndMessaging::GetForegroundWindow;

    const MAX_DEPTH: u32 = 6;

    /// RAII guard for COM initialization on the current thread.
    struct ComGuard;
    impl ComGuard {
        fn new() -> Result<Self, DeskPilotError> {
            unsafe {
                CoInitializeEx(None, COINIT_MULTITHREADED)
                    .ok()
                    .map_err(|e| DeskPilotError::Perception(format!("CoInitializeEx: {e}")))?;
            }
            Ok(Self)
        }
    }
    impl Drop for ComGuard {
        fn drop(&mut self) {
            unsafe { CoUninitialize() };
        }
    }

    /// Always-reported control kinds.
    fn priority_kind(ct: i32) -> Option<&'static str> {
        match ct {
            50000 => Some("Button"),
            50004 => Some("Edit"),
            50011 => Some("MenuItem"),
            50005 => Some("Hyperlink"),
            50003 => Some("ComboBox"),
            50019 => Some("TabItem"),
            _ => None,
        }
    }

    /// Kinds reported only when they carry a meaningful name.
    fn info_kind(ct: i32) -> Option<&'static str> {
        match ct {
            50007 => Some("ListItem"),
            50020 => Some("Text"),
            50024 => Some("TreeItem"),
            50010 => Some("MenuBar"),
            _ => None,
        }
    }

    struct Walk<'a> {
        walker: &'a IUIAutomationTreeWalker,
        screen: ScreenRect,
        window: ScreenRect,
        max_elements: usize,
        out: Vec<UiElement>,
    }

    /// Must be called from a blocking thread (COM is not async-safe).
    pub fn collect_sync(screen: ScreenRect, max_elements: usize) -> DeskPilotResult<UiSnapshot> {
        let _com = ComGuard::new()?;

        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            return Ok(UiSnapshot::default());
        }

        let automation: IUIAutomation = unsafe {
            CoCreateInstance(&CUIAutomation, None, CLSCTX_ALL)
                .map_err(|e| DeskPilotError::Perception(format!("CoCreateInstance UIA: {e}")))?
        };
        let root = unsafe {
            automation
                .ElementFromHandle(hwnd)
                .map_err(|e| DeskPilotError::Perception(format!("ElementFromHandle: {e}")))?
        };
        let walker = unsafe {
            automation
                .ControlViewWalker()
                .map_err(|e| DeskPilotError::Perception(format!("ControlViewWalker: {e}")))?
        };

        let window_name = unsafe { root.CurrentName().map(|n| n.to_string()).unwrap_or_default() };
        let window = unsafe { root.CurrentBoundingRectangle() }
            .map(rect_of)
            .unwrap_or(screen);

        let mut walk = Walk {
            walker: &walker,
            screen,
            window,
            max_elements,
            out: Vec::new(),
        };
        walk_tree(&mut walk, &root, 0);

        tracing::debug!(count = walk.out.len(), window = %window_name, "UIA elements collected");
        Ok(UiSnapshot {
            window_name: Some(if window_name.is_empty() { "Unknown".into() } else { window_name }),
            elements: walk.out,
        })
    }

    fn rect_of(r: RECT) -> ScreenRect {
        ScreenRect::new(
            r.left,
            r.top,
            (r.right - r.left).max(0) as u32,
            (r.bottom - r.top).max(0) as u32,
        )
    }

    fn walk_tree(walk: &mut Walk<'_>, element: &IUIAutomationElement, depth: u32) {
        if depth > MAX_DEPTH || walk.out.len() >= walk.max_elements {
            return;
        }

        // Ignore errors: some elements are inaccessible.
        if let Some(found) = extract_element(walk, element) {
            push_unique(&mut walk.out, found);
        }

        let Ok(mut child) = (unsafe { walk.walker.GetFirstChildElement(element) }) else {
            return;
        };
        loop {
            walk_tree(walk, &child, depth + 1);
            if walk.out.len() >= walk.max_elements {
                return;
            }
            match unsafe { walk.walker.GetNextSiblingElement(&child) } {
                Ok(next) => child = next,
                Err(_) => break,
            }
        }
    }

    fn extract_element(walk: &Walk<'_>, element: &IUIAutomationElement) -> Option<UiElement> {
        let ct = unsafe { element.CurrentControlType().unwrap_or(UIA_CONTROLTYPE_ID(0)) }.0;
        let name = unsafe { element.CurrentName().map(|n| n.to_string()).unwrap_or_default() };

        let kind = match (priority_kind(ct), info_kind(ct)) {
            (Some(kind), _) => kind,
            (None, Some(kind)) if name.trim().chars().count() > 1 => kind,
            _ => return None,
        };

        let rect = rect_of(unsafe { element.CurrentBoundingRectangle() }.ok()?);
        if rect.width <= 2 || rect.height <= 2 {
            return None;
        }

        let (screen_x, screen_y) = normalized_center(&rect, &walk.screen);
        let window_pos = (walk.window.width > 10 && walk.window.height > 10)
            .then(|| normalized_center(&rect, &walk.window));

        Some(UiElement {
            label: name,
            kind: kind.to_string(),
            screen_x,
            screen_y,
            window_pos,
        })
    }
}

/// UI Automation backed inspector (empty on non-Windows platforms).
#[derive(Debug, Default)]
pub struct UiaInspector;

#[async_trait]
impl UiInspector for UiaInspector {
    #[cfg(target_os = "windows")]
    async fn snapshot(&self, screen: ScreenRect, max_elements: usize) -> DeskPilotResult<UiSnapshot> {
        tokio::task::spawn_blocking(move || win::collect_sync(screen, max_elements))
            .await
            .map_err(|e| crate::errors::DeskPilotError::join("ui inspection", e))?
    }

    #[cfg(not(target_os = "windows"))]
    async fn snapshot(&self, _screen: ScreenRect, _max_elements: usize) -> DeskPilotResult<UiSnapshot> {
        Ok(UiSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(label: &str, kind: &str, x: u32, y: u32) -> UiElement {
        UiElement {
            label: label.into(),
            kind: kind.into(),
            screen_x: x,
            screen_y: y,
            window_pos: None,
        }
    }

    #[test]
    fn center_is_normalized_and_clamped() {
        let screen = ScreenRect::new(0, 0, 2000, 1000);
        assert_eq!(normalized_center(&ScreenRect::new(900, 400, 200, 200), &screen), (500, 500));
        assert_eq!(normalized_center(&ScreenRect::new(-500, -500, 10, 10), &screen), (0, 0));
        assert_eq!(normalized_center(&ScreenRect::new(4000, 0, 10, 10), &screen).0, 1000);
    }

    #[test]
    fn near_duplicates_are_dropped() {
        let mut out = Vec::new();
        assert!(push_unique(&mut out, element("OK", "Button", 100, 100)));
        assert!(!push_unique(&mut out, element("OK", "Button", 103, 98)));
        assert!(push_unique(&mut out, element("OK", "Button", 200, 100)));
        assert!(push_unique(&mut out, element("OK", "Edit", 100, 100)));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn summary_is_sorted_by_row_then_column() {
        let mut save = element("Save", "Button", 300, 50);
        save.window_pos = Some((400, 80));
        let snapshot = UiSnapshot {
            window_name: Some("Untitled - Notepad".into()),
            elements: vec![element("", "Edit", 500, 500), save, element("File", "MenuItem", 20, 50)],
        };
        let text = format_ui_summary(&snapshot);
        assert_eq!(
            text,
            "Foreground Window: Untitled - Notepad\n\
             Detected UI Elements:\n\
             - MenuItem: \"File\" at screen=(20, 50)\n\
             - Button: \"Save\" at screen=(300, 50), window=(400, 80)\n\
             - Edit: Unnamed at screen=(500, 500)"
        );
    }

    #[test]
    fn summary_without_window_or_elements() {
        assert_eq!(format_ui_summary(&UiSnapshot::default()), "No foreground window detected.");
        let empty = UiSnapshot {
            window_name: Some("Desktop".into()),
            elements: Vec::new(),
        };
        assert_eq!(
            format_ui_summary(&empty),
            "Window: Desktop\nNo interactive UI elements detected."
        );
    }
}
