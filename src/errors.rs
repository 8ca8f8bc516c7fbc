use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskPilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    /// The provider rejected the model identifier (unknown or retired model).
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model call timed out after {0}s")]
    ModelTimeout(u64),

    #[error("SSE parsing error: {0}")]
    SseParsing(String),

    #[error("Perception error: {0}")]
    Perception(String),

    #[error("Executor error: {0}")]
    Executor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl DeskPilotError {
    /// Errors from a blocking OS task that panicked or was cancelled.
    pub fn join(context: &str, err: tokio::task::JoinError) -> Self {
        DeskPilotError::Agent(format!("{context}: {err}"))
    }
}

pub type DeskPilotResult<T> = Result<T, DeskPilotError>;
