//! Prompt construction: tool templates and hint composition

use std::str::FromStr;

/// Output cap for free-form generation
pub const DEFAULT_MAX_TOKENS: usize = 500;
/// Output cap for tool transformations
pub const TOOL_MAX_TOKENS: usize = 200;

/// Canned text transformations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool
{   Rephrase
  , Translate
  , Hashtags
  , Shorten
}

impl Tool
{   fn instruction(&self) -> &'static str
    {   match self
        {   Tool::Rephrase =>
              "Rephrase the following text so it reads clearly and \
               engagingly while keeping its meaning. Reply with the \
               rephrased text only."
          , Tool::Translate =>
              "Translate the following text into English. If it is \
               already English, translate it into Hindi. Reply with the \
               translation only."
          , Tool::Hashtags =>
              "Extract 5 to 10 relevant hashtags from the following text. \
               Reply with the hashtags only, separated by spaces."
          , Tool::Shorten =>
              "Shorten the following text to at most two sentences \
               without losing the key message. Reply with the shortened \
               text only."
        }
    }
}

impl FromStr for Tool
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "rephrase" => Ok(Tool::Rephrase)
          , "translate" => Ok(Tool::Translate)
          , "hashtags" | "extract-hashtags" | "hashtag" => Ok(Tool::Hashtags)
          , "shorten" => Ok(Tool::Shorten)
          , other => Err(crate::error::Error::InvalidRequest(
              format!("Unknown tool: {}", other)
            ))
        }
    }
}

/// Wrap `text` in the fixed template for `tool`.
pub fn tool_prompt(tool: Tool, text: &str) -> String
{   format!("{}\n\nText:\n{}", tool.instruction(), text.trim())
}

/// Optional free-form generation hints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints
{   pub template: Option<String>
  , pub tone: Option<String>
  , pub length: Option<String>
  , pub business_type: Option<String>
}

impl Hints
{   fn lines(&self) -> Vec<String>
    {   let mut lines = Vec::new();
        if let Some(template) = present(&self.template)
        {   if !template.eq_ignore_ascii_case("default")
            {   lines.push(format!("Write it as a {}.", template));
            }
        }
        if let Some(business) = present(&self.business_type)
        {   lines.push(format!("The business is a {}.", business));
        }
        if let Some(tone) = present(&self.tone)
        {   lines.push(format!("Use a {} tone.", tone));
        }
        if let Some(length) = present(&self.length)
        {   lines.push(format!("Keep the length {}.", length));
        }
        lines
    }
}

fn present(value: &Option<String>) -> Option<&str>
{   value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Put the hint block ahead of the raw prompt.
/// Without hints the prompt passes through untouched.
pub fn compose(hints: &Hints, prompt: &str) -> String
{   let lines = hints.lines();
    if lines.is_empty()
    {   return prompt.to_string();
    }
    format!(
      "You are a marketing copywriter. {}\n\nRequest: {}",
      lines.join(" "),
      prompt.trim()
    )
}
