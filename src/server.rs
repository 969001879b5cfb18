//! HTTP surface: axum router, handlers and the serve entrypoint

use std::sync::Arc;
use std::time::Duration;
use axum::{Json, Router};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use crate::config::{Registry, ServerConfig};
use crate::failover::FailoverSequence;
use crate::gallery::{Gallery, ImageSource};
use crate::request::{ErrorReply, PromptBody, PromptReply, PromptRequest};
use crate::status::{ProbeReport, ProviderStatus};
use crate::Backend;

/// Plain-text health line served on `/`
pub const HEALTH_TEXT: &str = "AI Business Promoter Backend is running fine!";
/// Error text when every provider failed
pub const EXHAUSTED_TEXT: &str = "All AI providers failed";
/// `apiUsed` for locally evaluated arithmetic
pub const CALCULATOR: &str = "calculator";

/// Shared handler state; everything behind it is read-only
#[derive(Clone)]
pub struct AppState
{   pub backend: Arc<Backend>
  , pub gallery: Arc<Gallery>
}

impl AppState
{   pub fn registry(&self) -> &Registry
    {   self.backend.registry()
    }
}

/// Build the router with every endpoint.
pub fn router(state: AppState) -> Router
{   Router::new()
      .route("/", get(health))
      .route("/api/prompt", post(prompt))
      .route("/api/image", post(image))
      .route("/api/status", get(status))
      .route("/api/check-keys", get(check_keys))
      .with_state(state)
}

/// Handler failure rendered as `{error, apiUsed?}`
pub struct ApiFailure
{   status: StatusCode
  , body: ErrorReply
}

impl ApiFailure
{   fn new(status: StatusCode, error: impl Into<String>) -> Self
    {   ApiFailure
        {   status
          , body: ErrorReply { error: error.into(), api_used: None }
        }
    }
}

impl From<crate::error::Error> for ApiFailure
{   fn from(e: crate::error::Error) -> Self
    {   use crate::error::Error;
        match e
        {   e @ (Error::InvalidRequest(_) | Error::InvalidExpression(_)) => {
              ApiFailure::new(StatusCode::BAD_REQUEST, e.to_string())
            }
          , Error::AllProvidersExhausted(_) => {
              ApiFailure::new(StatusCode::INTERNAL_SERVER_ERROR, EXHAUSTED_TEXT)
            }
          , other => {
              ApiFailure::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiFailure
{   fn into_response(self) -> Response
    {   (self.status, Json(self.body)).into_response()
    }
}

async fn health() -> &'static str
{   HEALTH_TEXT
}

async fn prompt(
  State(state): State<AppState>
, body: Result<Json<PromptBody>, JsonRejection>
) -> Result<Json<PromptReply>, ApiFailure>
{   let body = body_or_default(body);
    let request = PromptRequest::from_body(&body)?;

    if is_calculate(body.action.as_deref())
    {   let value = crate::calc::evaluate(&request.prompt)?;
        debug!("Calculated {} locally", request.prompt);
        return Ok(Json(PromptReply::new(
          crate::calc::format_number(value)
        , CALCULATOR
        )));
    }

    let pinned = FailoverSequence::pin_target(state.registry(), request.preference)
      .map(|d| d.provider);

    match state.backend.dispatch(request).await
    {   Ok(result) => {
          if !result.failures.is_empty()
          {   debug!(
                "{} provider(s) failed before {}",
                result.failures.len(), result.provider
              );
          }
          Ok(Json(result.into()))
        }
      , Err(e @ crate::error::Error::AllProvidersExhausted(_)) => {
          error!("{}", e);
          Err(e.into())
        }
      , Err(e) => match pinned
        {   Some(provider) => {
              warn!("Preferred provider {} failed: {}", provider, e);
              Err(ApiFailure
              {   status: StatusCode::BAD_GATEWAY
                , body: ErrorReply
                  {   error: e.to_string()
                    , api_used: Some(provider.name().to_string())
                  }
              })
            }
          , None => Err(e.into())
        }
    }
}

/// Unreadable bodies are treated as empty, so validation reports what is missing.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T
{   match body
    {   Ok(Json(body)) => body
      , Err(rejection) => {
          debug!("Unreadable request body: {}", rejection.body_text());
          T::default()
        }
    }
}

fn is_calculate(action: Option<&str>) -> bool
{   action
      .map(str::trim)
      .is_some_and(|a| a.eq_ignore_ascii_case("calculate"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageBody
{   pub prompt: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReply
{   pub image_url: String
  , pub source: ImageSource
}

async fn image(
  State(state): State<AppState>
, body: Result<Json<ImageBody>, JsonRejection>
) -> Result<Json<ImageReply>, ApiFailure>
{   let body = body_or_default(body);
    let prompt = body.prompt
      .as_deref()
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .ok_or_else(|| ApiFailure::new(StatusCode::BAD_REQUEST, "Prompt missing"))?;
    let (image_url, source) = state.gallery.pick(prompt);
    Ok(Json(ImageReply { image_url, source }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReply
{   pub providers: Vec<ProviderStatus>
  , pub order: Vec<String>
}

async fn status(State(state): State<AppState>) -> Json<StatusReply>
{   let registry = state.registry();
    Json(StatusReply
    {   providers: crate::status::configured_status(registry)
      , order: registry
          .configured()
          .map(|d| d.provider.name().to_string())
          .collect()
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckKeysReply
{   pub providers: Vec<ProbeReport>
}

async fn check_keys(
  State(state): State<AppState>
) -> Result<Json<CheckKeysReply>, ApiFailure>
{   let mut rx = state.backend.check_keys().await?;
    let providers = rx.recv().await.ok_or_else(|| {
      ApiFailure::new(StatusCode::INTERNAL_SERVER_ERROR, "Backend dropped reply")
    })?;
    Ok(Json(CheckKeysReply { providers }))
}

/// Handle returned by [`serve`] - holds the bound port and shutdown trigger.
pub struct ServeHandle
{   /// The port the server is listening on.
    pub port: u16
  , shutdown_tx: Option<oneshot::Sender<()>>
  , join: Option<tokio::task::JoinHandle<Result<(), std::io::Error>>>
}

impl ServeHandle
{   /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<(), crate::error::Error>
    {   if let Some(tx) = self.shutdown_tx.take()
        {   let _ = tx.send(());
        }
        if let Some(join) = self.join.take()
        {   join.await
              .map_err(|e| crate::error::Error::Other(e.to_string()))?
              .map_err(|e| crate::error::Error::Other(e.to_string()))?;
        }
        Ok(())
    }
}

/// Build the HTTP client, backend and router from config.
pub fn build_state(config: &ServerConfig)
  -> Result<AppState, crate::error::Error>
{   let http_client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| crate::error::Error::InvalidConfiguration(e.to_string()))?;

    let gallery = match &config.gallery_path
    {   Some(path) => Gallery::load(path)?
      , None => Gallery::default()
    };

    Ok(AppState
    {   backend: Arc::new(Backend::new(
          http_client
        , Arc::new(config.registry.clone())
        ))
      , gallery: Arc::new(gallery)
    })
}

/// Bind and start serving in a spawned task.
pub async fn serve(config: &ServerConfig)
  -> Result<ServeHandle, crate::error::Error>
{   let state = build_state(config)?;
    serve_with_state(state, &config.bind).await
}

/// Serve an already-built state.
pub async fn serve_with_state(
  state: AppState
, bind: &str
) -> Result<ServeHandle, crate::error::Error>
{   let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await.map_err(|e| {
      crate::error::Error::InvalidConfiguration(
        format!("cannot bind {}: {}", bind, e)
      )
    })?;
    let port = listener
      .local_addr()
      .map_err(|e| crate::error::Error::Other(e.to_string()))?
      .port();
    info!("Server listening on {} (port {})", bind, port);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
      axum::serve(listener, app)
        .with_graceful_shutdown(async {
          let _ = shutdown_rx.await;
          info!("Received shutdown signal");
        })
        .await
    });

    Ok(ServeHandle
    {   port
      , shutdown_tx: Some(shutdown_tx)
      , join: Some(join)
    })
}
