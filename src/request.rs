//! Request and response types for prompt dispatch

use std::time::Duration;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use crate::prompt::{self, Hints, Tool};
use crate::Provider;

/// Creativity used when the client sends none
pub const DEFAULT_CREATIVITY: u8 = 70;

/// Inbound `/api/prompt` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptBody
{   pub prompt: Option<String>
  , pub api_preference: Option<String>
  , #[serde(default, deserialize_with = "lenient_number")]
    pub creativity: Option<f64>
  , pub template: Option<String>
  , pub tone: Option<String>
  , pub length: Option<String>
  , pub business_type: Option<String>
  , pub tool: Option<String>
  , pub action: Option<String>
}

/// Number or numeric string; anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>
{   let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value
    {   Some(Value::Number(n)) => n.as_f64()
      , Some(Value::String(s)) => s.trim().parse::<f64>().ok()
      , _ => None
    }.filter(|n| n.is_finite()))
}

/// Normalised unit of work handed to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest
{   /// Raw prompt text as sent by the client
    pub prompt: String
  , /// Free-form generation hints
    pub hints: Hints
  , /// Tool transformation, replaces the hints when set
    pub tool: Option<Tool>
  , /// Explicit provider; `None` means priority order
    pub preference: Option<Provider>
  , /// 0..=100
    pub creativity: u8
}

impl PromptRequest
{   /// Plain prompt with default settings.
    pub fn new(prompt: impl Into<String>) -> Self
    {   PromptRequest
        {   prompt: prompt.into()
          , hints: Hints::default()
          , tool: None
          , preference: None
          , creativity: DEFAULT_CREATIVITY
        }
    }

    /// Validate an inbound body.
    pub fn from_body(body: &PromptBody)
      -> Result<Self, crate::error::Error>
    {   let prompt = body.prompt
          .as_deref()
          .filter(|p| !p.trim().is_empty())
          .ok_or_else(|| {
            crate::error::Error::InvalidRequest("Prompt missing".to_string())
          })?;

        let tool = match body.tool.as_deref().map(str::trim)
        {   Some(name) if !name.is_empty() => Some(name.parse::<Tool>()?)
          , _ => None
        };

        Ok(PromptRequest
        {   prompt: prompt.to_string()
          , hints: Hints
            {   template: body.template.clone()
              , tone: body.tone.clone()
              , length: body.length.clone()
              , business_type: body.business_type.clone()
            }
          , tool
          , preference: parse_preference(body.api_preference.as_deref())
          , creativity: clamp_creativity(body.creativity)
        })
    }

    pub fn with_preference(mut self, provider: Provider) -> Self
    {   self.preference = Some(provider);
        self
    }

    pub fn with_creativity(mut self, creativity: u8) -> Self
    {   self.creativity = creativity.min(100);
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self
    {   self.tool = Some(tool);
        self
    }

    /// Final prompt text sent to the provider.
    pub fn text(&self) -> String
    {   match self.tool
        {   Some(tool) => prompt::tool_prompt(tool, &self.prompt)
          , None => prompt::compose(&self.hints, &self.prompt)
        }
    }

    /// Sampling temperature in 0.0..=1.0
    pub fn temperature(&self) -> f32
    {   f32::from(self.creativity) / 100.0
    }

    /// Output length cap
    pub fn max_tokens(&self) -> usize
    {   if self.tool.is_some()
        {   prompt::TOOL_MAX_TOKENS
        } else
        {   prompt::DEFAULT_MAX_TOKENS
        }
    }
}

/// `"auto"`, blank and unknown names all mean priority order.
fn parse_preference(raw: Option<&str>) -> Option<Provider>
{   let raw = raw?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto")
    {   return None;
    }
    match raw.parse::<Provider>()
    {   Ok(provider) => Some(provider)
      , Err(_) => {
          log::warn!("Ignoring unknown apiPreference: {}", raw);
          None
        }
    }
}

fn clamp_creativity(raw: Option<f64>) -> u8
{   match raw
    {   Some(value) if value.is_finite() => value.round().clamp(0.0, 100.0) as u8
      , _ => DEFAULT_CREATIVITY
    }
}

/// Successful dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult
{   /// Extracted reply text
    pub reply: String
  , /// Provider whose reply was used
    pub provider: Provider
  , /// Wall time of the whole dispatch
    pub elapsed: Duration
  , /// Providers tried before the winner, with their errors
    pub failures: Vec<(Provider, crate::error::Error)>
}

/// Outbound `/api/prompt` body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptReply
{   pub reply: String
  , pub api_used: String
  , pub timestamp: String
}

impl PromptReply
{   pub fn new(reply: String, api_used: impl Into<String>) -> Self
    {   PromptReply
        {   reply
          , api_used: api_used.into()
          , timestamp: chrono::Utc::now().to_rfc3339()
        }
    }
}

impl From<DispatchResult> for PromptReply
{   fn from(result: DispatchResult) -> Self
    {   PromptReply::new(result.reply, result.provider.name())
    }
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReply
{   pub error: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub api_used: Option<String>
}
