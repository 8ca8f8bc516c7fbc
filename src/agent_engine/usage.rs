use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::UsageConfig;
use crate::errors::DeskPilotResult;
use crate::llm::types::TokenUsage;

/// Cumulative token usage and estimated cost across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageLedger {
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Usage of one model call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

/// `<local data dir>/DeskPilot/api_usage.json`, or the working directory when the
/// platform has no data dir.
pub fn default_ledger_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("DeskPilot"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("api_usage.json")
}

pub fn ledger_path(cfg: &UsageConfig) -> PathBuf {
    cfg.ledger_path.clone().unwrap_or_else(default_ledger_path)
}

impl UsageLedger {
    /// Read the ledger; a missing or unreadable file starts from zero.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "usage ledger unreadable; starting from zero");
                return Self::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "usage ledger corrupt; starting from zero");
            Self::default()
        })
    }

    pub fn record(&mut self, usage: TokenUsage, pricing: &UsageConfig) -> TurnUsage {
        let cost = usage.input_tokens as f64 / 1_000_000.0 * pricing.input_cost_per_million
            + usage.output_tokens as f64 / 1_000_000.0 * pricing.output_cost_per_million;
        self.total_input_tokens += usage.input_tokens;
        self.total_output_tokens += usage.output_tokens;
        self.total_cost += cost;
        self.updated_at = Some(Utc::now());
        TurnUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cost,
        }
    }

    pub fn save(&self, path: &Path) -> DeskPilotResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), total_cost = self.total_cost, "usage ledger saved");
        Ok(())
    }
}
