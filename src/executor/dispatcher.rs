// Action dispatcher: one parsed command → one primitive call.
//
// Dispatch never fails. Parse errors, unknown names and handler failures all come
// back as diagnostic text for the model; `None` means there is nothing to report.
use std::sync::Arc;
use std::time::Duration;

use crate::config::{SafetyConfig, TimingConfig};
use crate::errors::DeskPilotResult;
use crate::executor::action::{parse_action_line, ActionCommand, ClickKind, ParsedAction};
use crate::executor::coordinator::CoordinateMapper;
use crate::executor::input::InputDriver;
use crate::executor::safety::check_shell_command;
use crate::executor::shell::ShellRunner;
use crate::executor::text_input::{contains_cjk, paste_text, ClipboardAccess, PASTE_MODIFIER};
use crate::executor::window::{OpenAppOutcome, WindowControl};

const PASTE_SETTLE: Duration = Duration::from_millis(50);
const CLEAR_FOCUS_PAUSE: Duration = Duration::from_millis(200);
const CLEAR_KEY_PAUSE: Duration = Duration::from_millis(100);

pub struct Dispatcher {
    input: Arc<dyn InputDriver>,
    clipboard: Arc<dyn ClipboardAccess>,
    windows: Arc<dyn WindowControl>,
    shell: Arc<dyn ShellRunner>,
    safety: SafetyConfig,
    max_wait_secs: f64,
}

impl Dispatcher {
    pub fn new(
        input: Arc<dyn InputDriver>,
        clipboard: Arc<dyn ClipboardAccess>,
        windows: Arc<dyn WindowControl>,
        shell: Arc<dyn ShellRunner>,
        safety: SafetyConfig,
        timing: &TimingConfig,
    ) -> Self {
        Self {
            input,
            clipboard,
            windows,
            shell,
            safety,
            max_wait_secs: timing.max_wait_secs,
        }
    }

    /// Parse and execute one `ACTION:` line.
    pub async fn execute_line(&self, line: &str, mapper: &CoordinateMapper) -> Option<String> {
        match parse_action_line(line) {
            Ok(action) => self.dispatch(&action, mapper).await,
            Err(e) => {
                tracing::warn!(line, error = %e, "action not parsed");
                Some(e.to_string())
            }
        }
    }

    pub async fn dispatch(&self, action: &ParsedAction, mapper: &CoordinateMapper) -> Option<String> {
        match self.run(&action.command, mapper).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(action = %action.name, error = %e, "action failed");
                Some(format!("Error executing action {}: {e}", action.name))
            }
        }
    }

    async fn run(
        &self,
        command: &ActionCommand,
        mapper: &CoordinateMapper,
    ) -> DeskPilotResult<Option<String>> {
        match command {
            ActionCommand::Click { at, kind } => {
                self.input.click(mapper.resolve(at), *kind).await?;
            }
            ActionCommand::MoveMouse { at } => {
                self.input.move_to(mapper.resolve(at)).await?;
            }
            ActionCommand::ClickAndHold { at, seconds } => {
                self.input.press_and_hold(mapper.resolve(at), *seconds).await?;
            }
            ActionCommand::Drag { from, to } => {
                self.input.drag(mapper.resolve(from), mapper.resolve(to)).await?;
            }
            ActionCommand::Scroll { amount } => {
                self.input.scroll(*amount, false).await?;
            }
            ActionCommand::ScrollAt { at, amount } => {
                self.input.move_to(mapper.resolve(at)).await?;
                self.input.scroll(*amount, false).await?;
            }
            ActionCommand::HorizontalScroll { amount } => {
                self.input.scroll(*amount, true).await?;
            }
            ActionCommand::Type { text } => {
                if contains_cjk(text) {
                    paste_text(self.input.as_ref(), self.clipboard.as_ref(), text, PASTE_SETTLE).await?;
                } else {
                    self.input.type_text(text).await?;
                }
            }
            ActionCommand::TypeUnicode { text } => {
                paste_text(self.input.as_ref(), self.clipboard.as_ref(), text, PASTE_SETTLE).await?;
            }
            ActionCommand::Press { key } => {
                self.input.press_key(key).await?;
            }
            ActionCommand::Hotkey { keys } => {
                self.input.hotkey(keys).await?;
            }
            ActionCommand::HoldKey { key, seconds } => {
                self.input.hold_key(key, *seconds).await?;
            }
            ActionCommand::ClearField { at } => {
                self.input.click(mapper.resolve(at), ClickKind::Left).await?;
                tokio::time::sleep(CLEAR_FOCUS_PAUSE).await;
                self.input.hotkey(&modified("a")).await?;
                tokio::time::sleep(CLEAR_KEY_PAUSE).await;
                self.input.press_key("backspace").await?;
                tokio::time::sleep(CLEAR_KEY_PAUSE).await;
            }
            ActionCommand::Copy => {
                self.input.hotkey(&modified("c")).await?;
            }
            ActionCommand::Paste => {
                self.input.hotkey(&modified("v")).await?;
            }
            ActionCommand::SetClipboard { text } => {
                self.clipboard.set_text(text).await?;
            }
            ActionCommand::OpenApp { name } => {
                let result = match self.windows.open_app(name).await? {
                    OpenAppOutcome::Focused => format!("App {name} focused successfully."),
                    OpenAppOutcome::Launched => format!("App {name} launched successfully."),
                    OpenAppOutcome::Failed => format!("Failed to open app {name}"),
                };
                return Ok(Some(result));
            }
            ActionCommand::MaximizeWindow => {
                let outcome = self.windows.maximize_foreground().await?;
                tracing::debug!(?outcome, "maximize");
                return Ok(outcome
                    .failure_reason()
                    .map(|reason| format!("Maximize window: {reason}")));
            }
            ActionCommand::Shell { command } => {
                if let Err(refusal) = check_shell_command(command, &self.safety) {
                    tracing::warn!(command = %command, reason = %refusal, "shell command refused");
                    return Ok(Some(refusal.to_string()));
                }
                let output = self.shell.run(command).await;
                return Ok((!output.trim().is_empty()).then_some(output));
            }
            ActionCommand::Wait { seconds } => {
                let capped = seconds.clamp(0.0, self.max_wait_secs.max(0.0));
                tokio::time::sleep(Duration::from_secs_f64(capped)).await;
            }
            ActionCommand::Done => {}
            ActionCommand::Unrecognized { name, .. } => {
                return Ok(Some(format!("Unknown action: {name}")));
            }
        }
        Ok(None)
    }
}

fn modified(key: &str) -> Vec<String> {
    vec![PASTE_MODIFIER.to_string(), key.to_string()]
}
