//! Ordered first-success dispatch over the provider registry

use std::time::Instant;
use log::{debug, info, warn};
use crate::config::{ProviderDescriptor, Registry};
use crate::request::{DispatchResult, PromptRequest};
use crate::Provider;

/// Providers to try for one request, in order
#[derive(Debug, Clone)]
pub struct FailoverSequence<'a>
{   pub providers: Vec<&'a ProviderDescriptor>
  , /// Single explicitly requested provider; its failure is final
    pub pinned: bool
  , pub current_index: usize
}

impl<'a> FailoverSequence<'a>
{   /// The provider a preference pins to, if it is registered and configured.
    pub fn pin_target(
      registry: &'a Registry
    , preference: Option<Provider>
    ) -> Option<&'a ProviderDescriptor>
    {   preference
          .and_then(|provider| registry.get(provider))
          .filter(|descriptor| descriptor.is_configured())
    }

    /// Plan the attempt order.
    ///
    /// A preference that is registered and configured pins the sequence to
    /// that one provider. Anything else falls back to every configured
    /// provider in registry order. Providers without a credential are
    /// never part of a plan.
    pub fn plan(
      registry: &'a Registry
    , preference: Option<Provider>
    ) -> Self
    {   match (Self::pin_target(registry, preference), preference)
        {   (Some(descriptor), _) => {
              debug!("Pinned to preferred provider {}", descriptor.provider);
              return FailoverSequence
              {   providers: vec![descriptor]
                , pinned: true
                , current_index: 0
              };
            }
          , (None, Some(provider)) => {
              warn!(
                "Preferred provider {} is not configured, using priority order",
                provider
              );
            }
          , (None, None) => {}
        }

        let providers: Vec<&ProviderDescriptor> = registry.configured().collect();
        debug!(
          "Creating failover sequence with {} providers",
          providers.len()
        );
        FailoverSequence
        {   providers
          , pinned: false
          , current_index: 0
        }
    }

    /// Get the current provider
    pub fn current(&self) -> Option<&'a ProviderDescriptor>
    {   self.providers.get(self.current_index).copied()
    }

    /// Move to the next provider
    pub fn next(&mut self) -> Option<&'a ProviderDescriptor>
    {   self.current_index += 1;
        self.current()
    }

    /// Check if we have more providers to try
    pub fn has_next(&self) -> bool
    {   self.current_index + 1 < self.providers.len()
    }

    pub fn names(&self) -> Vec<Provider>
    {   self.providers.iter().map(|d| d.provider).collect()
    }
}

/// Try providers in order until one returns non-empty text.
///
/// Per-provider errors are recorded and logged, never propagated until the
/// sequence is exhausted. A pinned provider's error is returned as is.
pub async fn dispatch(
  client: &reqwest::Client
, registry: &Registry
, request: &PromptRequest
) -> Result<DispatchResult, crate::error::Error>
{   let started = Instant::now();
    let mut sequence = FailoverSequence::plan(registry, request.preference);
    let mut failures: Vec<(Provider, crate::error::Error)> = Vec::new();

    let mut candidate = sequence.current();
    while let Some(descriptor) = candidate
    {   let provider = descriptor.provider;
        debug!("Attempting provider {}", provider);

        match crate::providers::send(client, descriptor, request).await
        {   Ok(reply) => {
              info!(
                "Reply from {} after {} failed attempt(s) in {:?}",
                provider, failures.len(), started.elapsed()
              );
              return Ok(DispatchResult
              {   reply
                , provider
                , elapsed: started.elapsed()
                , failures
              });
            }
          , Err(e) if sequence.pinned => {
              warn!("Preferred provider {} failed: {}", provider, e);
              return Err(e);
            }
          , Err(e) => {
              warn!("Provider {} failed: {}", provider, e);
              failures.push((provider, e));
            }
        }
        candidate = sequence.next();
    }

    warn!(
      "All providers failed ({} attempted) in {:?}",
      failures.len(), started.elapsed()
    );
    Err(crate::error::Error::AllProvidersExhausted(failures))
}
