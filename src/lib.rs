pub mod agent_engine;
pub mod config;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::agent_engine::engine::{AgentEngine, Collaborators, ModelBinding};
use crate::config::AppConfig;
use crate::errors::DeskPilotResult;
use crate::executor::input::{EnigoDriver, InputDriver};
use crate::executor::shell::SystemShell;
use crate::executor::text_input::ArboardClipboard;
use crate::executor::window::NativeWindowControl;
use crate::llm::registry::ProviderRegistry;
use crate::perception::screenshot::XcapCapturer;
use crate::perception::ui_automation::UiaInspector;

/// Install the global tracing subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Wire the loop to the real screen, input devices, clipboard, shell and the
/// configured model provider.
pub fn build_engine(config: AppConfig, model_override: Option<&str>) -> DeskPilotResult<AgentEngine> {
    let registry = ProviderRegistry::from_config(&config);
    let (provider, call) = registry.active_call_config(model_override)?;
    tracing::info!(
        provider = %provider.name(),
        model = %call.model,
        available = ?registry.list_names(),
        "model provider selected"
    );
    let model = ModelBinding {
        provider,
        call,
        fallback_model: registry.fallback_model().map(str::to_string),
    };

    let input: Arc<dyn InputDriver> = Arc::new(EnigoDriver::new());
    let parts = Collaborators {
        capturer: Arc::new(XcapCapturer::new(config.capture.clone())),
        inspector: Arc::new(UiaInspector),
        windows: Arc::new(NativeWindowControl::new(input.clone())),
        input,
        clipboard: Arc::new(ArboardClipboard),
        shell: Arc::new(SystemShell::new(config.safety.shell_timeout_secs)),
    };
    Ok(AgentEngine::new(config, model, parts))
}
