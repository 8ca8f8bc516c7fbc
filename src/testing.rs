//! Recording and scripted collaborators for unit tests. Nothing here touches a
//! display, an input device or the network.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use crate::agent_engine::state::StopFlag;
use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::executor::action::ClickKind;
use crate::executor::input::{InputDriver, NormPoint};
use crate::executor::shell::ShellRunner;
use crate::executor::text_input::ClipboardAccess;
use crate::executor::window::{MaximizeOutcome, OpenAppOutcome, WindowControl};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, TokenUsage};
use crate::perception::traits::{ScreenCapturer, UiInspector};
use crate::perception::types::{CapturedFrame, ForegroundWindow, ScreenRect, UiSnapshot};

// ── Input ──────────────────────────────────────────────────────────────────

/// Records every primitive as a short string, e.g. `click Left 250,250`.
#[derive(Debug, Default)]
pub struct RecordingInput {
    calls: Mutex<Vec<String>>,
    fail_next: Mutex<Option<String>>,
    stop_after_next: Mutex<Option<StopFlag>>,
}

impl RecordingInput {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make the next primitive fail with `message`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    /// Raise `flag` once the next primitive has been recorded.
    pub fn stop_after_next(&self, flag: &StopFlag) {
        *self.stop_after_next.lock().unwrap() = Some(flag.clone());
    }

    fn record(&self, call: String) -> DeskPilotResult<()> {
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(DeskPilotError::Executor(message));
        }
        self.calls.lock().unwrap().push(call);
        if let Some(flag) = self.stop_after_next.lock().unwrap().take() {
            flag.request_stop();
        }
        Ok(())
    }
}

#[async_trait]
impl InputDriver for RecordingInput {
    async fn click(&self, at: NormPoint, kind: ClickKind) -> DeskPilotResult<()> {
        self.record(format!("click {kind:?} {},{}", at.0, at.1))
    }

    async fn move_to(&self, at: NormPoint) -> DeskPilotResult<()> {
        self.record(format!("move {},{}", at.0, at.1))
    }

    async fn press_and_hold(&self, at: NormPoint, seconds: f64) -> DeskPilotResult<()> {
        self.record(format!("hold {},{} {seconds}", at.0, at.1))
    }

    async fn drag(&self, from: NormPoint, to: NormPoint) -> DeskPilotResult<()> {
        self.record(format!("drag {},{} {},{}", from.0, from.1, to.0, to.1))
    }

    async fn scroll(&self, amount: i32, horizontal: bool) -> DeskPilotResult<()> {
        if horizontal {
            self.record(format!("hscroll {amount}"))
        } else {
            self.record(format!("scroll {amount}"))
        }
    }

    async fn type_text(&self, text: &str) -> DeskPilotResult<()> {
        self.record(format!("type {text}"))
    }

    async fn press_key(&self, key: &str) -> DeskPilotResult<()> {
        self.record(format!("press {key}"))
    }

    async fn hotkey(&self, keys: &[String]) -> DeskPilotResult<()> {
        self.record(format!("hotkey {}", keys.join("+")))
    }

    async fn hold_key(&self, key: &str, seconds: f64) -> DeskPilotResult<()> {
        self.record(format!("hold_key {key} {seconds}"))
    }
}

// ── Clipboard ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryClipboard {
    current: Mutex<Option<String>>,
    writes: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            current: Mutex::new(Some(text.to_string())),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn current(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClipboardAccess for MemoryClipboard {
    async fn get_text(&self) -> DeskPilotResult<Option<String>> {
        Ok(self.current())
    }

    async fn set_text(&self, text: &str) -> DeskPilotResult<()> {
        self.writes.lock().unwrap().push(text.to_string());
        *self.current.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

// ── Windows ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockWindows {
    foreground: Mutex<Option<ForegroundWindow>>,
    open_outcome: Mutex<OpenAppOutcome>,
    maximize_outcome: Mutex<MaximizeOutcome>,
    opened: Mutex<Vec<String>>,
}

impl Default for MockWindows {
    fn default() -> Self {
        Self {
            foreground: Mutex::new(None),
            open_outcome: Mutex::new(OpenAppOutcome::Launched),
            maximize_outcome: Mutex::new(MaximizeOutcome::Maximized),
            opened: Mutex::new(Vec::new()),
        }
    }
}

impl MockWindows {
    pub fn set_foreground(&self, window: Option<ForegroundWindow>) {
        *self.foreground.lock().unwrap() = window;
    }

    pub fn set_open_outcome(&self, outcome: OpenAppOutcome) {
        *self.open_outcome.lock().unwrap() = outcome;
    }

    pub fn set_maximize_outcome(&self, outcome: MaximizeOutcome) {
        *self.maximize_outcome.lock().unwrap() = outcome;
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl WindowControl for MockWindows {
    async fn foreground_window(&self) -> DeskPilotResult<Option<ForegroundWindow>> {
        Ok(self.foreground.lock().unwrap().clone())
    }

    async fn maximize_foreground(&self) -> DeskPilotResult<MaximizeOutcome> {
        Ok(*self.maximize_outcome.lock().unwrap())
    }

    async fn open_app(&self, name: &str) -> DeskPilotResult<OpenAppOutcome> {
        self.opened.lock().unwrap().push(name.to_string());
        Ok(*self.open_outcome.lock().unwrap())
    }
}

// ── Shell ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockShell {
    output: String,
    commands: Mutex<Vec<String>>,
}

impl MockShell {
    pub fn with_output(output: &str) -> Self {
        Self {
            output: output.to_string(),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShellRunner for MockShell {
    async fn run(&self, command: &str) -> String {
        self.commands.lock().unwrap().push(command.to_string());
        self.output.clone()
    }
}

// ── Model ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(String),
    /// Fails with `ModelUnavailable`.
    Unavailable,
    /// Never answers.
    Hang,
}

/// One model call as seen by [`ScriptedModel`].
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Plays back a fixed script of replies, one per call.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<ModelCall>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Scripted::Reply(r.to_string())).collect())
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[ChatMessage], cfg: &CallConfig) -> DeskPilotResult<LlmResponse> {
        self.calls.lock().unwrap().push(ModelCall {
            model: cfg.model.clone(),
            messages: messages.to_vec(),
        });
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(content)) => Ok(LlmResponse {
                content,
                reasoning: String::new(),
                usage: Some(TokenUsage { input_tokens: 1000, output_tokens: 20 }),
            }),
            Some(Scripted::Unavailable) => Err(DeskPilotError::ModelUnavailable(format!(
                "404: model {} not found",
                cfg.model
            ))),
            Some(Scripted::Hang) => std::future::pending::<DeskPilotResult<LlmResponse>>().await,
            None => Err(DeskPilotError::LlmProvider("script exhausted".into())),
        }
    }
}

// ── Perception ─────────────────────────────────────────────────────────────

/// Returns the same uniform frame of a `width`×`height` monitor every time.
#[derive(Debug)]
pub struct FakeCapturer {
    width: u32,
    height: u32,
    fail: bool,
    targets: Mutex<Vec<Option<ScreenRect>>>,
}

impl FakeCapturer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail: false,
            targets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::new(1, 1) }
    }

    /// Foreground rectangles passed in, one entry per capture.
    pub fn targets(&self) -> Vec<Option<ScreenRect>> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScreenCapturer for FakeCapturer {
    async fn capture(&self, target: Option<(ScreenRect, String)>) -> DeskPilotResult<CapturedFrame> {
        self.targets.lock().unwrap().push(target.as_ref().map(|(rect, _)| *rect));
        if self.fail {
            return Err(DeskPilotError::Perception("no display".into()));
        }
        let monitor = ScreenRect::new(0, 0, self.width, self.height);
        Ok(CapturedFrame {
            image: RgbImage::from_pixel(self.width, self.height, Rgb([200, 200, 200])),
            region: monitor,
            monitor,
            logical_size: (self.width, self.height),
            window_name: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct FakeInspector {
    snapshot: UiSnapshot,
    error: Option<String>,
}

impl FakeInspector {
    pub fn with_snapshot(snapshot: UiSnapshot) -> Self {
        Self { snapshot, error: None }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            snapshot: UiSnapshot::default(),
            error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl UiInspector for FakeInspector {
    async fn snapshot(&self, _screen: ScreenRect, _max_elements: usize) -> DeskPilotResult<UiSnapshot> {
        match &self.error {
            Some(message) => Err(DeskPilotError::Perception(message.clone())),
            None => Ok(self.snapshot.clone()),
        }
    }
}
