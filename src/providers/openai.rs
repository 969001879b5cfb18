use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::config::ProviderDescriptor;
use crate::request::PromptRequest;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChatMessage
  , pub finish_reason: Option<String>
}

// ===== Wire =====

/// `POST {base}/chat/completions`, bearer auth.
/// Serves OpenAI and OpenRouter; OpenRouter's attribution headers
/// come from its descriptor.
pub struct OpenAiWire;

impl super::Wire for OpenAiWire
{   fn endpoint(&self, descriptor: &ProviderDescriptor) -> String
    {   format!("{}/chat/completions", descriptor.base_url)
    }

    fn body(
      &self
    , descriptor: &ProviderDescriptor
    , request: &PromptRequest
    ) -> Value
    {   let chat = ChatRequest
        {   model: descriptor.model.clone()
          , messages: vec![
              ChatMessage
              {   role: "user".to_string()
                , content: Some(request.text())
              }
            ]
          , max_tokens: Some(request.max_tokens())
          , temperature: Some(request.temperature())
        };
        serde_json::json!(chat)
    }

    fn extract(&self, payload: Value)
      -> Result<String, crate::error::Error>
    {   let response: ChatResponse = super::decode(payload)?;
        let choice = response.choices.into_iter().next()
          .ok_or_else(|| {
            crate::error::Error::MalformedResponse(
              "choices[0] missing".to_string()
            )
          })?;
        choice.message.content.ok_or_else(|| {
          crate::error::Error::MalformedResponse(
            "choices[0].message.content missing".to_string()
          )
        })
    }
}
