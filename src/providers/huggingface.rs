use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::config::ProviderDescriptor;
use crate::request::PromptRequest;

/// The inference API rejects a temperature of exactly zero
const MIN_TEMPERATURE: f32 = 0.01;

#[derive(Debug, Clone, Serialize)]
pub struct Parameters
{   pub max_new_tokens: usize
  , pub temperature: f32
  , pub return_full_text: bool
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest
{   pub inputs: String
  , pub parameters: Parameters
}

#[derive(Debug, Clone, Deserialize)]
pub struct Generated
{   pub generated_text: Option<String>
}

/// `POST {base}/models/{model}`, bearer auth.
pub struct HuggingFaceWire;

impl super::Wire for HuggingFaceWire
{   fn endpoint(&self, descriptor: &ProviderDescriptor) -> String
    {   format!("{}/models/{}", descriptor.base_url, descriptor.model)
    }

    fn body(
      &self
    , _descriptor: &ProviderDescriptor
    , request: &PromptRequest
    ) -> Value
    {   let inference = InferenceRequest
        {   inputs: request.text()
          , parameters: Parameters
            {   max_new_tokens: request.max_tokens()
              , temperature: request.temperature().max(MIN_TEMPERATURE)
              , return_full_text: false
            }
        };
        serde_json::json!(inference)
    }

    fn extract(&self, payload: Value)
      -> Result<String, crate::error::Error>
    {   let generated: Vec<Generated> = super::decode(payload)?;
        generated
          .into_iter()
          .next()
          .and_then(|g| g.generated_text)
          .ok_or_else(|| {
            crate::error::Error::MalformedResponse(
              "[0].generated_text missing".to_string()
            )
          })
    }
}
