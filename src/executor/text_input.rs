// Clipboard access and clipboard-routed text entry.
// Unicode / CJK text goes through clipboard + paste; plain text is typed directly.
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::executor::input::InputDriver;

#[cfg(target_os = "macos")]
pub const PASTE_MODIFIER: &str = "cmd";
#[cfg(not(target_os = "macos"))]
pub const PASTE_MODIFIER: &str = "ctrl";

/// Plain-text clipboard primitives.
#[async_trait]
pub trait ClipboardAccess: Send + Sync {
    /// Current text content; `None` when the clipboard holds no text.
    async fn get_text(&self) -> DeskPilotResult<Option<String>>;
    async fn set_text(&self, text: &str) -> DeskPilotResult<()>;
}

/// System clipboard through `arboard`.
#[derive(Debug, Default)]
pub struct ArboardClipboard;

#[async_trait]
impl ClipboardAccess for ArboardClipboard {
    async fn get_text(&self) -> DeskPilotResult<Option<String>> {
        tokio::task::spawn_blocking(|| {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| DeskPilotError::Executor(format!("clipboard unavailable: {e}")))?;
            match clipboard.get_text() {
                Ok(text) => Ok(Some(text)),
                Err(arboard::Error::ContentNotAvailable) => Ok(None),
                Err(e) => Err(DeskPilotError::Executor(format!("clipboard read: {e}"))),
            }
        })
        .await
        .map_err(|e| DeskPilotError::join("clipboard read", e))?
    }

    async fn set_text(&self, text: &str) -> DeskPilotResult<()> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| DeskPilotError::Executor(format!("clipboard unavailable: {e}")))?;
            clipboard
                .set_text(text)
                .map_err(|e| DeskPilotError::Executor(format!("clipboard write: {e}")))
        })
        .await
        .map_err(|e| DeskPilotError::join("clipboard write", e))?
    }
}

/// Returns true if the text contains CJK (Chinese/Japanese/Korean) characters.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        ('\u{4e00}'..='\u{9fff}').contains(&c)
            || ('\u{3040}'..='\u{309f}').contains(&c)
            || ('\u{30a0}'..='\u{30ff}').contains(&c)
            || ('\u{ac00}'..='\u{d7af}').contains(&c)
    })
}

/// Paste `text` through the clipboard, restoring the previous text content afterwards.
pub async fn paste_text(
    input: &dyn InputDriver,
    clipboard: &dyn ClipboardAccess,
    text: &str,
    settle: Duration,
) -> DeskPilotResult<()> {
    let saved = match clipboard.get_text().await {
        Ok(saved) => saved,
        Err(e) => {
            tracing::debug!(error = %e, "could not save clipboard before paste");
            None
        }
    };

    clipboard.set_text(text).await?;
    let pasted = input
        .hotkey(&[PASTE_MODIFIER.to_string(), "v".to_string()])
        .await;
    tokio::time::sleep(settle).await;

    if let Some(previous) = saved {
        if let Err(e) = clipboard.set_text(&previous).await {
            tracing::warn!(error = %e, "failed to restore clipboard");
        }
    }
    pasted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryClipboard, RecordingInput};

    #[test]
    fn detects_cjk() {
        assert!(contains_cjk("你好"));
        assert!(contains_cjk("abc カタカナ"));
        assert!(contains_cjk("안녕"));
        assert!(!contains_cjk("hello, café"));
    }

    #[tokio::test]
    async fn paste_restores_previous_clipboard() {
        let input = RecordingInput::default();
        let clipboard = MemoryClipboard::with_text("previous");
        paste_text(&input, &clipboard, "héllo ✓", Duration::ZERO).await.unwrap();

        assert_eq!(clipboard.writes(), vec!["héllo ✓".to_string(), "previous".to_string()]);
        assert_eq!(clipboard.current().as_deref(), Some("previous"));
        assert_eq!(input.calls(), vec![format!("hotkey {PASTE_MODIFIER}+v")]);
    }

    #[tokio::test]
    async fn empty_clipboard_is_left_with_pasted_text() {
        let input = RecordingInput::default();
        let clipboard = MemoryClipboard::default();
        paste_text(&input, &clipboard, "x", Duration::ZERO).await.unwrap();
        assert_eq!(clipboard.current().as_deref(), Some("x"));
    }
}
