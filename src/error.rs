use std::fmt;

/// Error type for prompt dispatch and the HTTP surface.
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Provider has no credential configured; it is skipped
    MissingCredential(String)
  , /// Transport failure before a status was received
    HttpError(String)
  , /// Provider answered with a non-2xx status
    ApiError(u16, String)
  , /// Provider answered 2xx but reported an error payload
    ProviderError(String)
  , /// Expected field missing or of the wrong shape
    MalformedResponse(String)
  , /// Expected text field present but blank
    EmptyReply
  , /// Per-call timeout elapsed
    Timeout
  , /// Every attempted provider failed, in attempt order
    AllProvidersExhausted(Vec<(crate::Provider, Error)>)
  , /// Client input rejected before contacting any provider
    InvalidRequest(String)
  , /// Arithmetic expression rejected
    InvalidExpression(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// Map a reqwest failure onto the transport variants.
    pub fn from_transport(e: &reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout
        } else
        {   Error::HttpError(e.to_string())
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingCredential(provider) => {
              write!(f, "Missing credential for: {}", provider)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError(status, body) => {
              write!(f, "API error (status {}): {}", status, body)
            }
          , Error::ProviderError(msg) => {
              write!(f, "Provider error: {}", msg)
            }
          , Error::MalformedResponse(msg) => {
              write!(f, "Malformed response: {}", msg)
            }
          , Error::EmptyReply => {
              write!(f, "Provider returned an empty reply")
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::AllProvidersExhausted(failures) => {
              write!(f, "All providers failed")?;
              for (i, (provider, err)) in failures.iter().enumerate()
              {   let sep = if i == 0 { ": " } else { "; " };
                  write!(f, "{}{}: {}", sep, provider, err)?;
              }
              Ok(())
            }
          , Error::InvalidRequest(msg) => {
              write!(f, "{}", msg)
            }
          , Error::InvalidExpression(msg) => {
              write!(f, "Invalid expression: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
