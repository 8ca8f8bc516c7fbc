use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::state::{AgentStatus, RunOutcome};

/// Progress notifications emitted by the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    StatusChanged { status: AgentStatus },
    TurnStarted { turn: u32 },
    ModelReplied { turn: u32, content: String },
    ActionExecuted { line: String, result: Option<String> },
    HintInjected { reasons: Vec<String>, suppressed: bool },
    UsageRecorded {
        input_tokens: u64,
        output_tokens: u64,
        cost: f64,
        total_cost: f64,
    },
    RunFinished { outcome: RunOutcome },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.tx.subscribe()
    }

    /// Fire and forget; having no subscriber is not an error.
    pub fn emit(&self, event: AgentEvent) {
        let _ = self.tx.send(event);
    }

    pub fn status(&self, status: AgentStatus) {
        tracing::debug!(%status, "status");
        self.emit(AgentEvent::StatusChanged { status });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.status(AgentStatus::Looking);
        bus.emit(AgentEvent::TurnStarted { turn: 1 });
        assert!(matches!(
            rx.recv().await.unwrap(),
            AgentEvent::StatusChanged { status: AgentStatus::Looking }
        ));
        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::TurnStarted { turn: 1 }));
    }

    #[test]
    fn emitting_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.emit(AgentEvent::RunFinished { outcome: RunOutcome::Completed { turns: 1 } });
    }
}
