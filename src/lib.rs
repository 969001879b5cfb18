pub mod error;
pub mod config;
pub mod providers;
pub mod prompt;
pub mod request;
pub mod failover;
pub mod status;
pub mod calc;
pub mod gallery;
pub mod client;
pub mod server;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/*

promoter: a small HTTP backend that takes a text prompt, forwards it to
one of several hosted text-generation APIs and returns the first reply
that comes back non-empty.

promoter/
├── src/
│   ├── lib.rs          # Provider tag and re-exports
│   ├── error.rs        # Error taxonomy
│   ├── config.rs       # Environment -> immutable provider registry
│   ├── prompt.rs       # Tool templates and hint composition
│   ├── request.rs      # PromptRequest / DispatchResult / JSON bodies
│   ├── providers/      # One generic adapter, one wire shape per API
│   ├── failover.rs     # Ordered first-success dispatch
│   ├── status.rs       # Per-provider key checks
│   ├── calc.rs         # Restricted arithmetic for action=calculate
│   ├── gallery.rs      # Image lookup for /api/image
│   ├── client.rs       # Backend task owning dispatch
│   ├── server.rs       # axum routes
│   └── main.rs         # Binary entry point
└── tests/

*/

pub use client::Backend;
pub use config::{ProviderDescriptor, Registry, ServerConfig};
pub use error::Error;
pub use request::{DispatchResult, PromptBody, PromptRequest};

// ===== SendPrompt =====

pub type SendPromptReply = Result<DispatchResult, crate::error::Error>;
pub type SendPromptReplySender
  = tokio::sync::mpsc::UnboundedSender<SendPromptReply>;

pub struct SendPromptArgs
{   pub request: PromptRequest
  , pub reply: SendPromptReplySender
}

// ===== CheckKeys =====

pub type CheckKeysReply = Vec<status::ProbeReport>;
pub type CheckKeysReplySender
  = tokio::sync::mpsc::UnboundedSender<CheckKeysReply>;

pub struct CheckKeysArgs
{   pub reply: CheckKeysReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== BackendHand (sender side) =====

#[derive(Clone)]
pub struct BackendHand
{   pub send_prompt_tx
      : tokio::sync::mpsc::UnboundedSender<SendPromptArgs>
  , pub check_keys_tx
      : tokio::sync::mpsc::UnboundedSender<CheckKeysArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== BackendFoot (receiver side) =====

pub struct BackendFoot
{   pub send_prompt_rx
      : tokio::sync::mpsc::UnboundedReceiver<SendPromptArgs>
  , pub check_keys_rx
      : tokio::sync::mpsc::UnboundedReceiver<CheckKeysArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}

/// Supported text-generation providers.
/// The declaration order is the default fallback priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider
{
  /// OpenAI chat completions
  OpenAI
  ,
  /// OpenRouter (OpenAI-compatible, extra attribution headers)
  OpenRouter
  ,
  /// Google Gemini generateContent
  Gemini
  ,
  /// Cohere generate
  Cohere
  ,
  /// Hugging Face Inference API
  HuggingFace
}

impl Provider
{   /// Every provider in default priority order.
    pub const ALL: [Provider; 5] = [
      Provider::OpenAI
    , Provider::OpenRouter
    , Provider::Gemini
    , Provider::Cohere
    , Provider::HuggingFace
    ];

    /// Symbolic name used in `apiPreference` and `apiUsed`.
    pub fn name(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "openai"
          , Provider::OpenRouter => "openrouter"
          , Provider::Gemini => "gemini"
          , Provider::Cohere => "cohere"
          , Provider::HuggingFace => "huggingface"
        }
    }

    /// Prefix of the environment variables configuring this provider.
    pub fn env_prefix(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "OPENAI"
          , Provider::OpenRouter => "OPENROUTER"
          , Provider::Gemini => "GEMINI"
          , Provider::Cohere => "COHERE"
          , Provider::HuggingFace => "HUGGINGFACE"
        }
    }
}

impl fmt::Display for Provider
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.name())
    }
}

impl FromStr for Provider
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "openai" | "chatgpt" => Ok(Provider::OpenAI)
          , "openrouter" => Ok(Provider::OpenRouter)
          , "gemini" | "google" => Ok(Provider::Gemini)
          , "cohere" => Ok(Provider::Cohere)
          , "huggingface" | "hf" => Ok(Provider::HuggingFace)
          , other => Err(crate::error::Error::InvalidConfiguration(
              format!("unknown provider: {}", other)
            ))
        }
    }
}
