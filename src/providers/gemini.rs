use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::config::ProviderDescriptor;
use crate::request::PromptRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   #[serde(default)]
    pub text: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   #[serde(default)]
    pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub temperature: f32
  , pub max_output_tokens: usize
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest
{   pub contents: Vec<Content>
  , pub generation_config: GenerationConfig
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate
{   pub content: Option<Content>
  , pub finish_reason: Option<String>
}

/// `POST {base}/models/{model}:generateContent?key=...`
pub struct GeminiWire;

impl super::Wire for GeminiWire
{   fn endpoint(&self, descriptor: &ProviderDescriptor) -> String
    {   format!(
          "{}/models/{}:generateContent",
          descriptor.base_url, descriptor.model
        )
    }

    fn authorize(
      &self
    , builder: reqwest::RequestBuilder
    , credential: &str
    ) -> reqwest::RequestBuilder
    {   builder.query(&[("key", credential)])
    }

    fn body(
      &self
    , _descriptor: &ProviderDescriptor
    , request: &PromptRequest
    ) -> Value
    {   let generate = GenerateRequest
        {   contents: vec![
              Content
              {   parts: vec![Part { text: Some(request.text()) }]
              }
            ]
          , generation_config: GenerationConfig
            {   temperature: request.temperature()
              , max_output_tokens: request.max_tokens()
            }
        };
        serde_json::json!(generate)
    }

    fn extract(&self, payload: Value)
      -> Result<String, crate::error::Error>
    {   let response: GenerateResponse = super::decode(payload)?;
        response.candidates
          .into_iter()
          .next()
          .and_then(|c| c.content)
          .and_then(|c| c.parts.into_iter().next())
          .and_then(|p| p.text)
          .ok_or_else(|| {
            crate::error::Error::MalformedResponse(
              "candidates[0].content.parts[0].text missing".to_string()
            )
          })
    }
}
