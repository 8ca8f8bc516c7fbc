use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent_engine::history::ConversationHistory;
use crate::agent_engine::loop_control::{LoopGuard, RunLimits};
use crate::config::AppConfig;
use crate::perception::types::CaptureContext;

/// What the agent is doing right now, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Looking,
    Thinking,
    Clicking,
    Typing,
    Scrolling,
    Waiting,
    Acting,
    Done,
    Stopped,
}

impl AgentStatus {
    pub fn label(self) -> &'static str {
        match self {
            AgentStatus::Idle => "Idle",
            AgentStatus::Looking => "Looking",
            AgentStatus::Thinking => "Thinking",
            AgentStatus::Clicking => "Clicking",
            AgentStatus::Typing => "Typing",
            AgentStatus::Scrolling => "Scrolling",
            AgentStatus::Waiting => "Waiting",
            AgentStatus::Acting => "Acting",
            AgentStatus::Done => "Done",
            AgentStatus::Stopped => "Stopped",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a run ended. Fatal failures are returned as errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The model replied `ACTION: DONE`.
    Completed { turns: u32 },
    /// The stop flag was raised.
    Cancelled { turns: u32 },
    /// Turn or duration budget exhausted.
    LimitReached { turns: u32 },
}

impl RunOutcome {
    pub fn turns(self) -> u32 {
        match self {
            RunOutcome::Completed { turns }
            | RunOutcome::Cancelled { turns }
            | RunOutcome::LimitReached { turns } => turns,
        }
    }
}

/// Cooperative cancellation shared between the loop and whoever may stop it.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one task run owns. Dropped when the run ends.
#[derive(Debug)]
pub struct AgentRunState {
    pub run_id: String,
    pub instruction: String,
    pub guard: LoopGuard,
    pub history: ConversationHistory,
    /// Geometry of the latest capture; replaced every turn.
    pub capture: Option<CaptureContext>,
    pub turn: u32,
    pub limits: RunLimits,
    /// Model id used for calls; changes once if the fallback model is taken.
    pub model: String,
}

impl AgentRunState {
    pub fn new(instruction: impl Into<String>, model: impl Into<String>, config: &AppConfig) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            instruction: instruction.into(),
            guard: LoopGuard::new(config.guard.clone()),
            history: ConversationHistory::new(config.context.max_messages),
            capture: None,
            turn: 0,
            limits: RunLimits::new(&config.limits),
            model: model.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flag_is_shared_between_clones() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(!other.is_stopped());
        flag.request_stop();
        assert!(other.is_stopped());
    }

    #[test]
    fn outcome_serializes_tagged() {
        let json = serde_json::to_string(&RunOutcome::LimitReached { turns: 4 }).unwrap();
        assert_eq!(json, r#"{"outcome":"limit_reached","turns":4}"#);
        assert_eq!(RunOutcome::Cancelled { turns: 2 }.turns(), 2);
    }
}
