// Loop control: stuck-loop detection and run limits.
use std::time::{Duration, Instant};

use crate::config::{GuardConfig, LimitsConfig};
use crate::perception::fingerprint::Fingerprint;

pub const REASON_REPEATED: &str = "repeated identical actions";
pub const REASON_UNCHANGED: &str = "screen unchanged after actions";
pub const REASON_NO_ACTIONS: &str = "no actions issued";

/// Decision for the current turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardVerdict {
    /// Append the corrective hint to the conversation.
    pub inject_hint: bool,
    /// Skip executing this turn's actions.
    pub suppress_actions: bool,
    /// Stuck conditions currently met, whether or not a hint is due.
    pub reasons: Vec<&'static str>,
}

impl GuardVerdict {
    pub fn is_stuck(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// Per-run stuck detector.
///
/// Call order per turn: [`observe_screen`](Self::observe_screen) at capture time,
/// [`evaluate`](Self::evaluate) once the model replied, and
/// [`record_executed`](Self::record_executed) after the actions ran.
#[derive(Debug, Clone)]
pub struct LoopGuard {
    cfg: GuardConfig,
    repeat_count: u32,
    unchanged_count: u32,
    no_action_count: u32,
    cooldown: u32,
    last_signature: Option<String>,
    last_fingerprint: Option<Fingerprint>,
    last_executed: usize,
}

impl LoopGuard {
    pub fn new(cfg: GuardConfig) -> Self {
        Self {
            cfg,
            repeat_count: 0,
            unchanged_count: 0,
            no_action_count: 0,
            cooldown: 0,
            last_signature: None,
            last_fingerprint: None,
            last_executed: 0,
        }
    }

    /// Compare the new frame with the previous one. The unchanged counter only
    /// advances when the previous turn actually executed something.
    pub fn observe_screen(&mut self, fingerprint: Option<Fingerprint>) {
        match (fingerprint, self.last_fingerprint) {
            (Some(current), Some(previous)) if self.last_executed > 0 => {
                if current.distance(&previous) <= self.cfg.unchanged_distance {
                    self.unchanged_count += 1;
                } else {
                    self.unchanged_count = 0;
                }
            }
            _ => self.unchanged_count = 0,
        }
        self.last_fingerprint = fingerprint;
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Update counters with this turn's action signature and decide on hint and
    /// suppression.
    pub fn evaluate(&mut self, signature: &str) -> GuardVerdict {
        let empty = signature.trim().is_empty();
        if empty {
            self.no_action_count += 1;
            self.repeat_count = 0;
            self.last_signature = None;
        } else {
            self.no_action_count = 0;
            if self.last_signature.as_deref() == Some(signature) {
                self.repeat_count += 1;
            } else {
                self.repeat_count = 0;
            }
            self.last_signature = Some(signature.to_string());
        }

        let repeated = self.repeat_count >= self.cfg.repeat_threshold;
        let unchanged = self.unchanged_count >= self.cfg.unchanged_threshold;
        let idle = empty && self.no_action_count >= self.cfg.no_action_threshold;

        let mut reasons = Vec::new();
        if repeated {
            reasons.push(REASON_REPEATED);
        }
        if unchanged {
            reasons.push(REASON_UNCHANGED);
        }
        if idle {
            reasons.push(REASON_NO_ACTIONS);
        }

        let inject_hint = !reasons.is_empty() && self.cooldown == 0;
        if inject_hint {
            self.cooldown = self.cfg.hint_cooldown_turns;
        }

        GuardVerdict {
            inject_hint,
            suppress_actions: repeated && unchanged,
            reasons,
        }
    }

    pub fn record_executed(&mut self, executed: usize) {
        self.last_executed = executed;
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn unchanged_count(&self) -> u32 {
        self.unchanged_count
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }
}

/// Optional turn and wall-clock budget for one run.
#[derive(Debug, Clone)]
pub struct RunLimits {
    max_turns: Option<u32>,
    max_duration: Option<Duration>,
    start_time: Instant,
}

impl RunLimits {
    pub fn new(cfg: &LimitsConfig) -> Self {
        Self {
            max_turns: cfg.max_turns,
            max_duration: cfg
                .max_duration_minutes
                .map(|m| Duration::from_secs(u64::from(m) * 60)),
            start_time: Instant::now(),
        }
    }

    /// True once `turns_done` turns have run or the duration budget is spent.
    pub fn exhausted(&self, turns_done: u32) -> bool {
        if self.max_turns.is_some_and(|max| turns_done >= max) {
            return true;
        }
        self.max_duration
            .is_some_and(|max| self.start_time.elapsed() >= max)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
