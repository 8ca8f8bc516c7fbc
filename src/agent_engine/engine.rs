use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::agent_engine::event_bus::{AgentEvent, EventBus};
use crate::agent_engine::state::{AgentRunState, AgentStatus, RunOutcome, StopFlag};
use crate::agent_engine::usage::{ledger_path, UsageLedger};
use crate::config::AppConfig;
use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::executor::action::{is_done_line, parse_action_line, ActionKind, ActionPlan};
use crate::executor::coordinator::CoordinateMapper;
use crate::executor::dispatcher::Dispatcher;
use crate::executor::input::InputDriver;
use crate::executor::shell::ShellRunner;
use crate::executor::text_input::ClipboardAccess;
use crate::executor::window::WindowControl;
use crate::llm::prompt::{stuck_hint, turn_prompt};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, TokenUsage};
use crate::perception::fingerprint::Fingerprint;
use crate::perception::screenshot::encode_jpeg_data_uri;
use crate::perception::traits::{ScreenCapturer, UiInspector};
use crate::perception::types::CaptureContext;
use crate::perception::ui_automation::format_ui_summary;

/// The model and how to call it.
pub struct ModelBinding {
    pub provider: Arc<dyn LlmProvider>,
    pub call: CallConfig,
    /// Tried once, for the rest of the run, when the configured model is unavailable.
    pub fallback_model: Option<String>,
}

/// OS-facing collaborators of the loop.
pub struct Collaborators {
    pub capturer: Arc<dyn ScreenCapturer>,
    pub inspector: Arc<dyn UiInspector>,
    pub windows: Arc<dyn WindowControl>,
    pub input: Arc<dyn InputDriver>,
    pub clipboard: Arc<dyn ClipboardAccess>,
    pub shell: Arc<dyn ShellRunner>,
}

/// Result of one turn.
enum Step {
    Continue,
    Finished(RunOutcome),
}

/// Perceive → decide → act loop for one instruction at a time.
pub struct AgentEngine {
    config: AppConfig,
    model: ModelBinding,
    capturer: Arc<dyn ScreenCapturer>,
    inspector: Arc<dyn UiInspector>,
    windows: Arc<dyn WindowControl>,
    dispatcher: Dispatcher,
    events: EventBus,
    ledger: UsageLedger,
    ledger_path: PathBuf,
}

impl AgentEngine {
    pub fn new(config: AppConfig, model: ModelBinding, parts: Collaborators) -> Self {
        let dispatcher = Dispatcher::new(
            parts.input,
            parts.clipboard,
            parts.windows.clone(),
            parts.shell,
            config.safety.clone(),
            &config.timing,
        );
        let ledger_path = ledger_path(&config.usage);
        let ledger = UsageLedger::load(&ledger_path);
        tracing::debug!(
            path = %ledger_path.display(),
            total_cost = ledger.total_cost,
            "usage ledger loaded"
        );
        Self {
            config,
            model,
            capturer: parts.capturer,
            inspector: parts.inspector,
            windows: parts.windows,
            dispatcher,
            events: EventBus::default(),
            ledger,
            ledger_path,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Drive the loop until the model says DONE, `stop` is raised, a limit is hit,
    /// or a fatal error occurs.
    pub async fn run_task(&mut self, instruction: &str, stop: &StopFlag) -> DeskPilotResult<RunOutcome> {
        let mut run = AgentRunState::new(instruction, self.model.call.model.clone(), &self.config);
        tracing::info!(
            run_id = %run.run_id,
            model = %run.model,
            instruction = %run.instruction,
            "task started"
        );

        let result = self.run_loop(&mut run, stop).await;
        match &result {
            Ok(outcome) => {
                let status = match outcome {
                    RunOutcome::Completed { .. } => AgentStatus::Done,
                    _ => AgentStatus::Stopped,
                };
                self.events.status(status);
                self.events.emit(AgentEvent::RunFinished { outcome: *outcome });
                tracing::info!(
                    run_id = %run.run_id,
                    ?outcome,
                    elapsed_secs = run.limits.elapsed().as_secs(),
                    "task finished"
                );
            }
            Err(e) => {
                self.events.status(AgentStatus::Stopped);
                tracing::error!(run_id = %run.run_id, turn = run.turn, error = %e, "task aborted");
            }
        }
        result
    }

    async fn run_loop(&mut self, run: &mut AgentRunState, stop: &StopFlag) -> DeskPilotResult<RunOutcome> {
        loop {
            if stop.is_stopped() {
                tracing::info!(turn = run.turn, "stop requested");
                return Ok(RunOutcome::Cancelled { turns: run.turn });
            }
            if run.limits.exhausted(run.turn) {
                tracing::warn!(turn = run.turn, "run limit reached");
                return Ok(RunOutcome::LimitReached { turns: run.turn });
            }
            match self.step(run, stop).await? {
                Step::Continue => {}
                Step::Finished(outcome) => return Ok(outcome),
            }
        }
    }

    async fn step(&mut self, run: &mut AgentRunState, stop: &StopFlag) -> DeskPilotResult<Step> {
        run.turn += 1;
        let turn = run.turn;
        self.events.emit(AgentEvent::TurnStarted { turn });

        // ── Perceive ────────────────────────────────────────────────────────
        self.events.status(AgentStatus::Looking);
        let target = if self.config.capture.crop_to_foreground {
            match self.windows.foreground_window().await {
                Ok(window) => window.map(|w| (w.rect, w.name)),
                Err(e) => {
                    tracing::warn!(error = %e, "foreground window lookup failed; capturing full screen");
                    None
                }
            }
        } else {
            None
        };
        let frame = self.capturer.capture(target).await?;
        run.guard.observe_screen(Some(Fingerprint::of(&frame.image)));
        run.capture = Some(CaptureContext::from(&frame));

        let ui_summary = match self.inspector.snapshot(frame.monitor, self.config.ui.max_elements).await {
            Ok(snapshot) => format_ui_summary(&snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "UI metadata unavailable");
                format!("Metadata error: {e}")
            }
        };

        let crop_window = frame.window_name.as_deref().filter(|_| frame.is_cropped());
        let prompt = turn_prompt(&run.instruction, &ui_summary, crop_window);
        let image = encode_jpeg_data_uri(&frame.image, self.config.capture.jpeg_quality)?;
        run.history.push(ChatMessage::user_with_image(prompt, image));
        run.history.prune();

        // ── Decide ──────────────────────────────────────────────────────────
        self.events.status(AgentStatus::Thinking);
        let response = self.call_model(run).await?;
        if let Some(usage) = response.usage {
            self.record_usage(usage);
        }
        let reply = response.content;
        tracing::info!(turn, reply_len = reply.len(), "model replied");
        tracing::debug!(turn, reply = %reply, "model reply");
        self.events.emit(AgentEvent::ModelReplied { turn, content: reply.clone() });
        run.history.push(ChatMessage::assistant(reply.clone()));

        let plan = ActionPlan::from_reply(&reply);
        let verdict = run.guard.evaluate(&plan.signature);
        if verdict.inject_hint {
            tracing::warn!(turn, reasons = ?verdict.reasons, "stuck loop detected; hint injected");
            run.history.push(ChatMessage::user(stuck_hint(&verdict.reasons)));
            self.events.emit(AgentEvent::HintInjected {
                reasons: verdict.reasons.iter().map(|r| r.to_string()).collect(),
                suppressed: verdict.suppress_actions,
            });
        }

        // ── Act ─────────────────────────────────────────────────────────────
        let mapper = CoordinateMapper::new(run.capture);
        let mut results = Vec::new();
        let mut executed = 0usize;
        let mut cancelled = false;
        let action_delay = Duration::from_millis(self.config.timing.action_delay_ms);

        if verdict.suppress_actions {
            tracing::warn!(turn, actions = plan.action_count(), "actions suppressed this turn");
        } else {
            for line in &plan.lines {
                if is_done_line(line) {
                    break;
                }
                if stop.is_stopped() {
                    cancelled = true;
                    break;
                }
                let kind = parse_action_line(line)
                    .map(|a| a.command.kind())
                    .unwrap_or(ActionKind::Other);
                self.events.status(status_for(kind));
                let result = self.dispatcher.execute_line(line, &mapper).await;
                executed += 1;
                tracing::info!(turn, action = %line, result = ?result, "action executed");
                self.events.emit(AgentEvent::ActionExecuted {
                    line: line.clone(),
                    result: result.clone(),
                });
                results.extend(result);
                if !action_delay.is_zero() {
                    tokio::time::sleep(action_delay).await;
                }
            }
        }

        if !results.is_empty() {
            run.history.push(ChatMessage::user(format!("Action results:\n{}", results.join("\n"))));
        }
        run.guard.record_executed(executed);

        if plan.done && !cancelled {
            tracing::info!(turn, "task reported done");
            return Ok(Step::Finished(RunOutcome::Completed { turns: turn }));
        }
        if cancelled || stop.is_stopped() {
            return Ok(Step::Finished(RunOutcome::Cancelled { turns: turn }));
        }

        let settle = Duration::from_millis(self.config.timing.turn_settle_ms);
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        Ok(Step::Continue)
    }

    /// One model call with the recovery rules: a timeout is retried once with the
    /// minimized context, an unavailable model once with the fallback model.
    async fn call_model(&self, run: &mut AgentRunState) -> DeskPilotResult<LlmResponse> {
        let timeout = Duration::from_secs(self.config.llm.request_timeout_secs.max(1));
        let call = CallConfig {
            model: run.model.clone(),
            ..self.model.call.clone()
        };

        match self.timed_chat(run.history.messages(), &call, timeout).await {
            Err(DeskPilotError::ModelTimeout(secs)) => {
                tracing::warn!(secs, "model call timed out; retrying with minimized context");
                let minimized = run.history.minimized();
                self.timed_chat(&minimized, &call, timeout).await
            }
            Err(DeskPilotError::ModelUnavailable(reason)) => {
                let fallback = self
                    .model
                    .fallback_model
                    .as_deref()
                    .filter(|f| !f.is_empty() && *f != run.model);
                let Some(fallback) = fallback else {
                    return Err(DeskPilotError::ModelUnavailable(reason));
                };
                tracing::warn!(
                    from = %run.model,
                    to = %fallback,
                    reason = %reason,
                    "model unavailable; switching to fallback"
                );
                run.model = fallback.to_string();
                let call = CallConfig {
                    model: run.model.clone(),
                    ..call
                };
                self.timed_chat(run.history.messages(), &call, timeout).await
            }
            other => other,
        }
    }

    async fn timed_chat(
        &self,
        messages: &[ChatMessage],
        call: &CallConfig,
        timeout: Duration,
    ) -> DeskPilotResult<LlmResponse> {
        match tokio::time::timeout(timeout, self.model.provider.chat(messages, call)).await {
            Ok(result) => result,
            Err(_) => Err(DeskPilotError::ModelTimeout(timeout.as_secs())),
        }
    }

    fn record_usage(&mut self, usage: TokenUsage) {
        let turn = self.ledger.record(usage, &self.config.usage);
        if let Err(e) = self.ledger.save(&self.ledger_path) {
            tracing::warn!(path = %self.ledger_path.display(), error = %e, "usage ledger not saved");
        }
        tracing::info!(
            input_tokens = turn.input_tokens,
            output_tokens = turn.output_tokens,
            cost = turn.cost,
            total_cost = self.ledger.total_cost,
            "usage recorded"
        );
        self.events.emit(AgentEvent::UsageRecorded {
            input_tokens: turn.input_tokens,
            output_tokens: turn.output_tokens,
            cost: turn.cost,
            total_cost: self.ledger.total_cost,
        });
    }
}

fn status_for(kind: ActionKind) -> AgentStatus {
    match kind {
        ActionKind::Pointer => AgentStatus::Clicking,
        ActionKind::Typing => AgentStatus::Typing,
        ActionKind::Scrolling => AgentStatus::Scrolling,
        ActionKind::Waiting => AgentStatus::Waiting,
        ActionKind::Other => AgentStatus::Acting,
    }
}
