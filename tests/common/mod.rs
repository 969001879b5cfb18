#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use promoter::{Backend, Provider, ProviderDescriptor, Registry};
use promoter::gallery::Gallery;
use promoter::server::AppState;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Path prefix each provider is mounted under on the mock server
pub fn prefix(provider: Provider) -> &'static str
{   match provider
    {   Provider::OpenAI => "/openai/v1"
      , Provider::OpenRouter => "/openrouter/api/v1"
      , Provider::Gemini => "/gemini/v1beta"
      , Provider::Cohere => "/cohere/v1"
      , Provider::HuggingFace => "/hf"
    }
}

/// Request path the adapter will hit for a provider with default models
pub fn endpoint(provider: Provider) -> String
{   let tail = match provider
    {   Provider::OpenAI | Provider::OpenRouter => "/chat/completions".to_string()
      , Provider::Gemini => "/models/gemini-pro:generateContent".to_string()
      , Provider::Cohere => "/generate".to_string()
      , Provider::HuggingFace => "/models/tiiuae/falcon-7b-instruct".to_string()
    };
    format!("{}{}", prefix(provider), tail)
}

/// Credential used for a configured provider
pub fn key(provider: Provider) -> String
{   format!("{}-test-key", provider.name())
}

/// Registry in default priority order, every provider pointed at `server`.
/// Only `configured` providers get a credential.
pub fn registry(server: &MockServer, configured: &[Provider]) -> Registry
{   Registry::new(
      Provider::ALL
        .iter()
        .map(|p| {
          let credential = configured.contains(p).then(|| key(*p));
          let mut descriptor = ProviderDescriptor::new(*p, credential)
            .with_base_url(format!("{}{}", server.uri(), prefix(*p)));
          if *p == Provider::OpenRouter
          {   descriptor = descriptor.with_header("X-Title", "Promoter Tests");
          }
          descriptor
        })
        .collect()
    )
}

pub fn http_client() -> reqwest::Client
{   reqwest::Client::builder()
      .timeout(Duration::from_secs(5))
      .build()
      .expect("client")
}

pub fn app_state(registry: Registry) -> AppState
{   AppState
    {   backend: Arc::new(Backend::new(http_client(), Arc::new(registry)))
      , gallery: Arc::new(Gallery::default())
    }
}

/// Successful 2xx payload carrying `text` in the provider's envelope
pub fn reply_body(provider: Provider, text: &str) -> Value
{   match provider
    {   Provider::OpenAI | Provider::OpenRouter => json!({
          "id": "chatcmpl-1",
          "choices": [
            {"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}
          ]
        })
      , Provider::Gemini => json!({
          "candidates": [
            {"content": {"parts": [{"text": text}], "role": "model"}, "finishReason": "STOP"}
          ]
        })
      , Provider::Cohere => json!({
          "id": "gen-1",
          "generations": [{"id": "g-1", "text": text}]
        })
      , Provider::HuggingFace => json!([{"generated_text": text}])
    }
}
