use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::config::ProviderDescriptor;
use crate::request::PromptRequest;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest
{   pub model: String
  , pub prompt: String
  , pub max_tokens: usize
  , pub temperature: f32
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse
{   pub generations: Vec<Generation>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Generation
{   pub text: Option<String>
}

/// `POST {base}/generate`, bearer auth.
pub struct CohereWire;

impl super::Wire for CohereWire
{   fn endpoint(&self, descriptor: &ProviderDescriptor) -> String
    {   format!("{}/generate", descriptor.base_url)
    }

    fn body(
      &self
    , descriptor: &ProviderDescriptor
    , request: &PromptRequest
    ) -> Value
    {   let generate = GenerateRequest
        {   model: descriptor.model.clone()
          , prompt: request.text()
          , max_tokens: request.max_tokens()
          , temperature: request.temperature()
        };
        serde_json::json!(generate)
    }

    fn extract(&self, payload: Value)
      -> Result<String, crate::error::Error>
    {   let response: GenerateResponse = super::decode(payload)?;
        response.generations
          .into_iter()
          .next()
          .and_then(|g| g.text)
          .ok_or_else(|| {
            crate::error::Error::MalformedResponse(
              "generations[0].text missing".to_string()
            )
          })
    }
}
