//! Provider router — selects the backend based on config.

use crate::mock::MockProvider;
use crate::openai_compat::OpenAiCompatProvider;
use clawlet_config::AppConfig;
use clawlet_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Named backends plus the one used by default.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    pub fn default_name(&self) -> &str {
        &self.default_provider
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build every configured backend, plus the default one and `mock`.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    router.register("mock", Arc::new(MockProvider::demo()));

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();
        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));
        let model = provider_config
            .default_model
            .clone()
            .unwrap_or_else(|| config.default_model.clone());

        debug!(provider = %name, %base_url, %model, "Registering configured provider");
        router.register(
            name.clone(),
            Arc::new(
                OpenAiCompatProvider::new(name, base_url, api_key, model)
                    .with_temperature(config.default_temperature),
            ),
        );
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() {
        let name = &config.default_provider;
        router.register(
            name.clone(),
            Arc::new(
                OpenAiCompatProvider::new(
                    name,
                    default_base_url(name),
                    config.api_key.clone().unwrap_or_default(),
                    config.default_model.clone(),
                )
                .with_temperature(config.default_temperature),
            ),
        );
    }

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => "http://localhost:11434/v1".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawlet_config::ProviderConfig;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", Arc::new(OpenAiCompatProvider::openai("sk-test", "gpt-4o")));

        assert!(router.get("openai").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        let provider = router.default().unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(router.list(), vec!["mock", "ollama"]);
    }

    #[test]
    fn mock_is_selectable() {
        let config = AppConfig {
            default_provider: "mock".into(),
            ..AppConfig::default()
        };
        let router = build_from_config(&config);
        assert_eq!(router.default().unwrap().name(), "mock");
        assert_eq!(router.list(), vec!["mock"]);
    }

    #[test]
    fn configured_providers_registered() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-x".into()),
                default_model: Some("gpt-4o-mini".into()),
                ..ProviderConfig::default()
            },
        );
        let router = build_from_config(&config);
        assert!(router.get("openai").is_some());
        assert!(router.get("ollama").is_some());
    }
}
