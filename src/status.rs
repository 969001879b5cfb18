//! Provider status reporting and key checks

use std::time::Instant;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::config::Registry;
use crate::request::PromptRequest;

/// Prompt sent by key checks
pub const PROBE_PROMPT: &str = "Say hello";
/// Creativity used by key checks
const PROBE_CREATIVITY: u8 = 0;

/// Configuration view of one provider, no network involved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus
{   pub name: String
  , pub configured: bool
  , pub model: String
}

/// Outcome of probing one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport
{   pub name: String
  , pub configured: bool
  , pub ok: bool
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>
}

pub fn configured_status(registry: &Registry) -> Vec<ProviderStatus>
{   registry
      .iter()
      .map(|d| ProviderStatus
      {   name: d.provider.name().to_string()
        , configured: d.is_configured()
        , model: d.model.clone()
      })
      .collect()
}

/// Probe every provider one at a time with the canned prompt.
/// Unconfigured providers are reported without a network call.
pub async fn check_keys(
  client: &reqwest::Client
, registry: &Registry
) -> Vec<ProbeReport>
{   let mut reports = Vec::with_capacity(registry.len());
    for descriptor in registry.iter()
    {   let name = descriptor.provider.name().to_string();
        if !descriptor.is_configured()
        {   debug!("Skipping key check for unconfigured {}", name);
            reports.push(ProbeReport
            {   name
              , configured: false
              , ok: false
              , error: Some("missing credential".to_string())
              , elapsed_ms: None
            });
            continue;
        }

        let request = PromptRequest::new(PROBE_PROMPT)
          .with_preference(descriptor.provider)
          .with_creativity(PROBE_CREATIVITY);
        let started = Instant::now();
        let result = crate::providers::send(client, descriptor, &request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
          "Key check {}: {}",
          name,
          if result.is_ok() { "ok" } else { "failed" }
        );
        reports.push(ProbeReport
        {   name
          , configured: true
          , ok: result.is_ok()
          , error: result.err().map(|e| e.to_string())
          , elapsed_ms: Some(elapsed_ms)
        });
    }
    reports
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::config::ProviderDescriptor;
    use crate::Provider;

    #[test]
    fn configured_status_lists_every_provider_in_order()
    {   let registry = Registry::new(vec![
          ProviderDescriptor::new(Provider::Cohere, Some("k".to_string()))
        , ProviderDescriptor::new(Provider::OpenAI, None)
        ]);
        let status = configured_status(&registry);
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].name, "cohere");
        assert!(status[0].configured);
        assert_eq!(status[1].name, "openai");
        assert!(!status[1].configured);
        assert_eq!(status[1].model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn unconfigured_providers_are_not_probed()
    {   let registry = Registry::new(vec![
          ProviderDescriptor::new(Provider::Gemini, None)
            .with_base_url("http://127.0.0.1:9")
        ]);
        let reports = check_keys(&reqwest::Client::new(), &registry).await;
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].configured);
        assert!(!reports[0].ok);
        assert_eq!(reports[0].elapsed_ms, None);
    }
}
