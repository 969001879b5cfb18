//! Configuration for providers and the HTTP server

use std::fmt;
use std::path::PathBuf;
use log::{debug, info, warn};
use crate::Provider;

/// Default bind port when `PORT` is unset
pub const DEFAULT_PORT: u16 = 5000;
/// Default per-call provider timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// One external text-generation provider.
/// Built once at startup and never mutated.
#[derive(Clone, PartialEq)]
pub struct ProviderDescriptor
{   /// Provider tag
    pub provider: Provider
  , /// API base URL without trailing slash
    pub base_url: String
  , /// Opaque secret; `None` disables the provider
    pub credential: Option<String>
  , /// Default model identifier
    pub model: String
  , /// Extra headers sent with every request
    pub extra_headers: Vec<(String, String)>
}

impl ProviderDescriptor
{   /// Descriptor with the provider's default URL and model.
    pub fn new(
      provider: Provider
    , credential: Option<String>
    ) -> Self
    {   let (base_url, model) = match provider
        {   Provider::OpenAI => (
              "https://api.openai.com/v1"
            , "gpt-3.5-turbo"
            )
          , Provider::OpenRouter => (
              "https://openrouter.ai/api/v1"
            , "openai/gpt-3.5-turbo"
            )
          , Provider::Gemini => (
              "https://generativelanguage.googleapis.com/v1beta"
            , "gemini-pro"
            )
          , Provider::Cohere => (
              "https://api.cohere.ai/v1"
            , "command"
            )
          , Provider::HuggingFace => (
              "https://api-inference.huggingface.co"
            , "tiiuae/falcon-7b-instruct"
            )
        };
        ProviderDescriptor
        {   provider
          , base_url: base_url.to_string()
          , credential: credential.filter(|c| !c.trim().is_empty())
          , model: model.to_string()
          , extra_headers: vec![]
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self
    {   self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.model = model.into();
        self
    }

    pub fn with_header(
      mut self
    , name: impl Into<String>
    , value: impl Into<String>
    ) -> Self
    {   self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// True when a non-blank credential is present.
    pub fn is_configured(&self) -> bool
    {   self.credential.is_some()
    }
}

impl fmt::Debug for ProviderDescriptor
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ProviderDescriptor")
          .field("provider", &self.provider)
          .field("base_url", &self.base_url)
          .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
          .field("model", &self.model)
          .field("extra_headers", &self.extra_headers)
          .finish()
    }
}

/// Immutable provider registry in priority order.
#[derive(Debug, Clone, Default)]
pub struct Registry
{   descriptors: Vec<ProviderDescriptor>
}

impl Registry
{   /// Build a registry; the vector order is the fallback order.
    /// Later duplicates of a provider are dropped.
    pub fn new(descriptors: Vec<ProviderDescriptor>) -> Self
    {   let mut seen = Vec::with_capacity(descriptors.len());
        let descriptors = descriptors
          .into_iter()
          .filter(|d| {
            if seen.contains(&d.provider)
            {   warn!("Duplicate descriptor for {} ignored", d.provider);
                false
            } else
            {   seen.push(d.provider);
                true
            }
          })
          .collect();
        Registry { descriptors }
    }

    pub fn get(&self, provider: Provider) -> Option<&ProviderDescriptor>
    {   self.descriptors.iter().find(|d| d.provider == provider)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor>
    {   self.descriptors.iter()
    }

    /// Descriptors with a credential, in priority order.
    pub fn configured(&self) -> impl Iterator<Item = &ProviderDescriptor>
    {   self.descriptors.iter().filter(|d| d.is_configured())
    }

    pub fn order(&self) -> Vec<Provider>
    {   self.descriptors.iter().map(|d| d.provider).collect()
    }

    pub fn len(&self) -> usize
    {   self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.descriptors.is_empty()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig
{   /// Socket address to bind, e.g. "0.0.0.0:5000"
    pub bind: String
  , /// Per-call provider timeout in seconds
    pub timeout_secs: u64
  , /// Provider registry
    pub registry: Registry
  , /// Optional JSON gallery for /api/image
    pub gallery_path: Option<PathBuf>
}

impl ServerConfig
{   /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::error::Error>
    where
      F: Fn(&str) -> Option<String>
    {   let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT")
        {   Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
              crate::error::Error::InvalidConfiguration(
                format!("PORT is not a port number: {}", raw)
              )
            })?
          , None => DEFAULT_PORT
        };
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let timeout_secs = match get("PROVIDER_TIMEOUT_SECS")
        {   Some(raw) => match raw.trim().parse::<u64>()
            {   Ok(secs) if secs > 0 => secs
              , _ => {
                  return Err(crate::error::Error::InvalidConfiguration(
                    format!("PROVIDER_TIMEOUT_SECS must be a positive integer: {}", raw)
                  ));
                }
            }
          , None => DEFAULT_TIMEOUT_SECS
        };

        let order = priority_order(get("PROVIDER_ORDER").as_deref())?;
        let descriptors = order
          .into_iter()
          .map(|provider| {
            let prefix = provider.env_prefix();
            let mut descriptor = ProviderDescriptor::new(
              provider
            , get(format!("{}_KEY", prefix).as_str())
            );
            if let Some(url) = get(format!("{}_BASE_URL", prefix).as_str())
            {   descriptor = descriptor.with_base_url(url);
            }
            if let Some(model) = get(format!("{}_MODEL", prefix).as_str())
            {   descriptor = descriptor.with_model(model);
            }
            if provider == Provider::OpenRouter
            {   descriptor = descriptor
                  .with_header(
                    "HTTP-Referer"
                  , get("OPENROUTER_REFERER")
                      .unwrap_or_else(|| "http://localhost".to_string())
                  )
                  .with_header(
                    "X-Title"
                  , get("OPENROUTER_TITLE")
                      .unwrap_or_else(|| "AI Business Promoter".to_string())
                  );
            }
            debug!(
              "Provider {} configured={} model={}",
              provider, descriptor.is_configured(), descriptor.model
            );
            descriptor
          })
          .collect();
        let registry = Registry::new(descriptors);
        info!(
          "{} of {} providers have credentials",
          registry.configured().count(),
          registry.len()
        );

        Ok(ServerConfig
        {   bind: format!("{}:{}", host, port)
          , timeout_secs
          , registry
          , gallery_path: get("IMAGE_GALLERY_FILE").map(PathBuf::from)
        })
    }
}

/// Parse `PROVIDER_ORDER`; providers it omits follow in default order.
fn priority_order(raw: Option<&str>)
  -> Result<Vec<Provider>, crate::error::Error>
{   let mut order: Vec<Provider> = Vec::with_capacity(Provider::ALL.len());
    if let Some(raw) = raw
    {   for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty())
        {   let provider: Provider = name.parse()?;
            if !order.contains(&provider)
            {   order.push(provider);
            }
        }
    }
    for provider in Provider::ALL
    {   if !order.contains(&provider)
        {   order.push(provider);
        }
    }
    Ok(order)
}
