//! Provider adapters
//!
//! Every provider is driven by the same `send`: build the request from a
//! `Wire`, post it, check the status, unwrap the reply text. A `Wire`
//! only knows its endpoint, body and response envelope.

pub mod openai;
pub mod gemini;
pub mod cohere;
pub mod huggingface;

use log::{debug, error, trace};
use serde_json::Value;
use crate::config::ProviderDescriptor;
use crate::request::PromptRequest;
use crate::Provider;

pub use openai::OpenAiWire;
pub use gemini::GeminiWire;
pub use cohere::CohereWire;
pub use huggingface::HuggingFaceWire;

/// Request/response shape of one provider API
pub trait Wire: Send + Sync
{   /// Full request URL
    fn endpoint(&self, descriptor: &ProviderDescriptor) -> String;

    /// Attach the credential; bearer token unless overridden
    fn authorize(
      &self
    , builder: reqwest::RequestBuilder
    , credential: &str
    ) -> reqwest::RequestBuilder
    {   builder.bearer_auth(credential)
    }

    /// JSON request body
    fn body(
      &self
    , descriptor: &ProviderDescriptor
    , request: &PromptRequest
    ) -> Value;

    /// Pull the generated text out of a 2xx payload
    fn extract(&self, payload: Value)
      -> Result<String, crate::error::Error>;
}

static OPENAI: OpenAiWire = OpenAiWire;
static GEMINI: GeminiWire = GeminiWire;
static COHERE: CohereWire = CohereWire;
static HUGGINGFACE: HuggingFaceWire = HuggingFaceWire;

/// Wire shape for a provider tag
pub fn wire_for(provider: Provider) -> &'static dyn Wire
{   match provider
    {   Provider::OpenAI | Provider::OpenRouter => &OPENAI
      , Provider::Gemini => &GEMINI
      , Provider::Cohere => &COHERE
      , Provider::HuggingFace => &HUGGINGFACE
    }
}

/// One bounded attempt against one provider. Never retries.
pub async fn send(
  client: &reqwest::Client
, descriptor: &ProviderDescriptor
, request: &PromptRequest
) -> Result<String, crate::error::Error>
{   let provider = descriptor.provider;
    let credential = descriptor.credential.as_deref()
      .ok_or_else(|| {
        crate::error::Error::MissingCredential(provider.name().to_string())
      })?;
    let wire = wire_for(provider);

    let body = wire.body(descriptor, request);
    trace!("{} request body: {}", provider, body);

    let mut builder = client.post(wire.endpoint(descriptor));
    builder = wire.authorize(builder, credential);
    for (name, value) in &descriptor.extra_headers
    {   builder = builder.header(name.as_str(), value.as_str());
    }

    debug!("Sending prompt to {} (model {})", provider, descriptor.model);
    let response = builder
      .json(&body)
      .send()
      .await
      .map_err(|e| {
        error!("{} HTTP error: {}", provider, e);
        crate::error::Error::from_transport(&e)
      })?;

    let status = response.status();
    trace!("{} response status: {}", provider, status);

    if !status.is_success()
    {   let error_text = response.text().await
          .unwrap_or_else(|_|
            "Unknown error".to_string()
          );
        error!("{} API error {}: {}", provider, status, error_text);
        return Err(crate::error::Error::ApiError(
          status.as_u16()
        , error_text
        ));
    }

    let payload: Value = response.json().await.map_err(|e| {
      if e.is_timeout()
      {   crate::error::Error::Timeout
      } else
      {   error!("{} parse error: {}", provider, e);
          crate::error::Error::MalformedResponse(e.to_string())
      }
    })?;

    if let Some(err) = error_field(&payload)
    {   error!("{} reported error: {}", provider, err);
        return Err(crate::error::Error::ProviderError(err));
    }

    let text = wire.extract(payload)?;
    let text = text.trim();
    if text.is_empty()
    {   error!("{} returned empty text", provider);
        return Err(crate::error::Error::EmptyReply);
    }
    Ok(text.to_string())
}

/// Error payloads come as `{"error": "..."}` or `{"error": {"message": "..."}}`.
fn error_field(payload: &Value) -> Option<String>
{   let err = payload.get("error")?;
    match err
    {   Value::Null => None
      , Value::String(s) => Some(s.clone())
      , Value::Object(map) => Some(
          map.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string())
        )
      , other => Some(other.to_string())
    }
}

/// Deserialize a typed envelope, mapping failure to `MalformedResponse`.
pub(crate) fn decode<T>(payload: Value)
  -> Result<T, crate::error::Error>
where
  T: serde::de::DeserializeOwned
{   serde_json::from_value(payload).map_err(|e| {
      crate::error::Error::MalformedResponse(e.to_string())
    })
}
