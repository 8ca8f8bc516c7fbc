use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AppConfig, LlmConfig};
use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::llm::provider::LlmProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;

/// Registry of all available LLM providers, keyed by their config.toml identifier.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    active: String,
    llm_config: LlmConfig,
}

/// Environment variable holding the API key for provider `id`.
pub fn api_key_env_var(id: &str) -> String {
    format!("DESKPILOT_{}_API_KEY", id.to_uppercase().replace('-', "_"))
}

impl ProviderRegistry {
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get_active(&self) -> DeskPilotResult<Arc<dyn LlmProvider>> {
        self.providers.get(&self.active).cloned().ok_or_else(|| {
            DeskPilotError::Config(format!("Active provider '{}' not found in registry", self.active))
        })
    }

    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Provider and call configuration for the active provider.
    ///
    /// `model_override` replaces the configured model id (the `--model` flag).
    pub fn active_call_config(
        &self,
        model_override: Option<&str>,
    ) -> DeskPilotResult<(Arc<dyn LlmProvider>, CallConfig)> {
        let provider = self.get_active()?;
        let entry = self.llm_config.providers.get(&self.active).ok_or_else(|| {
            DeskPilotError::Config(format!("No [llm.providers.{}] section", self.active))
        })?;
        let model = model_override
            .map(str::to_string)
            .unwrap_or_else(|| entry.model.clone());
        tracing::debug!(
            provider = %self.active,
            model = %model,
            stream = entry.stream,
            temperature = entry.temperature,
            "resolved call config"
        );
        Ok((
            provider,
            CallConfig {
                model,
                stream: entry.stream,
                temperature: entry.temperature,
            },
        ))
    }

    /// Model id to switch to when the primary model is unavailable.
    pub fn fallback_model(&self) -> Option<&str> {
        self.llm_config.fallback_model.as_deref().filter(|m| !m.is_empty())
    }

    /// Build a registry from the loaded app config.
    /// API keys are read from environment variables named `DESKPILOT_<ID>_API_KEY`,
    /// falling back to the `api_key` config value.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
            active: config.llm.active_provider.clone(),
            llm_config: config.llm.clone(),
        };
        for (id, entry) in &config.llm.providers {
            let api_key = std::env::var(api_key_env_var(id))
                .ok()
                .filter(|k| !k.is_empty())
                .or_else(|| entry.api_key.clone())
                .unwrap_or_default();
            if api_key.is_empty() {
                tracing::warn!(provider = %id, env = %api_key_env_var(id), "no API key configured");
            }
            let provider = OpenAiCompatibleProvider::new(id.clone(), entry.api_base.clone(), api_key);
            registry.register(Arc::new(provider));
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn env_var_names() {
        assert_eq!(api_key_env_var("gemini"), "DESKPILOT_GEMINI_API_KEY");
        assert_eq!(api_key_env_var("x-ai"), "DESKPILOT_X_AI_API_KEY");
    }

    #[test]
    fn default_config_resolves_active_provider() {
        let cfg = AppConfig::default();
        let registry = ProviderRegistry::from_config(&cfg);
        let (provider, call) = registry.active_call_config(None).unwrap();
        assert_eq!(provider.name(), cfg.llm.active_provider);
        assert_eq!(call.model, cfg.llm.providers[&cfg.llm.active_provider].model);
        assert!(registry.fallback_model().is_some());
    }

    #[test]
    fn model_override_and_provider_switch() {
        let cfg = parse_config(
            r#"
            [llm]
            active_provider = "xai"
            fallback_model = ""

            [llm.providers.xai]
            display_name = "xAI"
            api_base = "https://api.x.ai/v1/chat/completions"
            model = "grok-vision"
            stream = true
            "#,
        )
        .unwrap();
        let registry = ProviderRegistry::from_config(&cfg);
        let (_, call) = registry.active_call_config(Some("grok-other")).unwrap();
        assert_eq!(call.model, "grok-other");
        assert!(call.stream);
        assert_eq!(registry.fallback_model(), None);
        assert_eq!(registry.list_names(), vec!["xai".to_string()]);
    }

    #[test]
    fn missing_active_provider_is_config_error() {
        let mut cfg = AppConfig::default();
        cfg.llm.active_provider = "nothing".into();
        let registry = ProviderRegistry::from_config(&cfg);
        assert!(matches!(registry.get_active(), Err(DeskPilotError::Config(_))));
        assert!(registry.active_call_config(None).is_err());
    }
}
