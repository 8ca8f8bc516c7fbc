use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{DeskPilotError, DeskPilotResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub active_provider: String,
    /// Known-good model tried once when the active model is reported unavailable.
    #[serde(default)]
    pub fallback_model: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub providers: HashMap<String, ProviderEntry>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "gemini".to_string(),
            ProviderEntry {
                display_name: "Google Gemini".into(),
                api_base: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
                    .into(),
                model: "gemini-3-flash-preview".into(),
                temperature: 0.0,
                stream: false,
                api_key: None,
            },
        );
        Self {
            active_provider: "gemini".into(),
            fallback_model: Some("gemini-2.0-flash".into()),
            request_timeout_secs: default_request_timeout(),
            providers,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub display_name: String,
    /// Full chat-completions URL of an OpenAI-compatible endpoint.
    pub api_base: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Use SSE streaming.
    #[serde(default)]
    pub stream: bool,
    /// Optional API key stored in config.toml (falls back to env var DESKPILOT_<ID>_API_KEY).
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_temperature() -> f64 {
    0.0
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Clip captures to the foreground window when it is large enough.
    #[serde(default = "default_true")]
    pub crop_to_foreground: bool,
    /// Minimum foreground window edge, in logical pixels, for cropping to apply.
    #[serde(default = "default_min_region")]
    pub min_region_logical: u32,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_grid_divisions")]
    pub grid_divisions: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            crop_to_foreground: true,
            min_region_logical: default_min_region(),
            max_width: default_max_width(),
            grid_divisions: default_grid_divisions(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_min_region() -> u32 {
    50
}

fn default_max_width() -> u32 {
    2048
}

fn default_grid_divisions() -> u32 {
    10
}

fn default_jpeg_quality() -> u8 {
    80
}

/// Loop guard thresholds. These are tuning knobs without a derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_three")]
    pub repeat_threshold: u32,
    #[serde(default = "default_three")]
    pub unchanged_threshold: u32,
    /// Maximum fingerprint Hamming distance still counted as "unchanged".
    #[serde(default = "default_three")]
    pub unchanged_distance: u32,
    #[serde(default = "default_no_action_threshold")]
    pub no_action_threshold: u32,
    #[serde(default = "default_three")]
    pub hint_cooldown_turns: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            repeat_threshold: 3,
            unchanged_threshold: 3,
            unchanged_distance: 3,
            no_action_threshold: default_no_action_threshold(),
            hint_cooldown_turns: 3,
        }
    }
}

fn default_three() -> u32 {
    3
}

fn default_no_action_threshold() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Upper bound on messages sent to the model, leading system pair included.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

fn default_max_messages() -> usize {
    6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_action_delay")]
    pub action_delay_ms: u64,
    #[serde(default = "default_turn_settle")]
    pub turn_settle_ms: u64,
    /// Upper bound for a single WAIT action.
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            action_delay_ms: default_action_delay(),
            turn_settle_ms: default_turn_settle(),
            max_wait_secs: default_max_wait(),
        }
    }
}

fn default_action_delay() -> u64 {
    50
}

fn default_turn_settle() -> u64 {
    100
}

fn default_max_wait() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_true")]
    pub allow_terminal_commands: bool,
    /// Case-insensitive substrings that cause a SHELL command to be refused.
    #[serde(default)]
    pub blocked_commands: Vec<String>,
    #[serde(default = "default_shell_timeout")]
    pub shell_timeout_secs: u64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            allow_terminal_commands: true,
            blocked_commands: Vec::new(),
            shell_timeout_secs: default_shell_timeout(),
        }
    }
}

fn default_shell_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// Defaults to `<local data dir>/DeskPilot/api_usage.json`.
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
    #[serde(default = "default_input_cost")]
    pub input_cost_per_million: f64,
    #[serde(default = "default_output_cost")]
    pub output_cost_per_million: f64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            ledger_path: None,
            input_cost_per_million: default_input_cost(),
            output_cost_per_million: default_output_cost(),
        }
    }
}

fn default_input_cost() -> f64 {
    0.50
}

fn default_output_cost() -> f64 {
    3.00
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_elements: default_max_elements(),
        }
    }
}

fn default_max_elements() -> usize {
    70
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LimitsConfig {
    #[serde(default)]
    pub max_turns: Option<u32>,
    #[serde(default)]
    pub max_duration_minutes: Option<u32>,
}

fn default_true() -> bool {
    true
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    let candidate = std::env::current_dir().ok()?.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Some(candidate);
    }
    None
}

/// Load `config.toml` from `explicit`, or next to the executable, or from the
/// working directory. A missing file yields the defaults; an explicit path must exist.
pub fn load_config(explicit: Option<&Path>) -> DeskPilotResult<AppConfig> {
    let path = match explicit {
        Some(p) if p.exists() => p.to_path_buf(),
        Some(p) => {
            return Err(DeskPilotError::Config(format!(
                "config file {} does not exist",
                p.display()
            )))
        }
        None => match resolve_config_path() {
            Some(p) => p,
            None => {
                tracing::info!("no config.toml found; using built-in defaults");
                return Ok(AppConfig::default());
            }
        },
    };
    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), provider = %config.llm.active_provider, "config loaded");
    Ok(config)
}

pub fn parse_config(content: &str) -> DeskPilotResult<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    if config.context.max_messages < 3 {
        tracing::warn!(
            configured = config.context.max_messages,
            "context.max_messages below 3 is raised to 3"
        );
    }
    Ok(config)
}

pub fn save_config(config: &AppConfig, path: &Path) -> DeskPilotResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
