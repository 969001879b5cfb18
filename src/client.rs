use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, error, info};
use crate::config::Registry;
use crate::BackendFoot;

/// Public API for the dispatch backend - owns the task
pub struct Backend
{   hand: crate::BackendHand
  , registry: Arc<Registry>
  , _task_handle: tokio::task::JoinHandle<()>
}

impl Backend
{   /// Create and spawn a new backend
    /// Returns immediately - spawns background task
    pub fn new(
      http_client: reqwest::Client
    , registry: Arc<Registry>
    ) -> Self
    {   debug!("Creating Backend with task ownership");

        let (send_prompt_tx, send_prompt_rx)
          = mpsc::unbounded_channel();
        let (check_keys_tx, check_keys_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::BackendHand
        {   send_prompt_tx
          , check_keys_tx
          , kill_process_tx
        };

        let foot = crate::BackendFoot
        {   send_prompt_rx
          , check_keys_rx
          , kill_process_rx
        };

        let loop_registry = Arc::clone(&registry);
        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, http_client, loop_registry).await
        });

        Backend
        {   hand
          , registry
          , _task_handle
        }
    }

    /// Read-only registry the backend dispatches over
    pub fn registry(&self) -> &Registry
    {   &self.registry
    }

    /// Queue a prompt - returns almost immediately
    pub async fn send_prompt(
      &self
    , request: crate::PromptRequest
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SendPromptReply>,
        crate::error::Error
      >
    {   debug!(
          "send_prompt queuing command (preference {:?})",
          request.preference
        );
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SendPromptArgs
        {   request
          , reply: reply_tx
        };

        self.hand.send_prompt_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a prompt and wait for its result
    pub async fn dispatch(
      &self
    , request: crate::PromptRequest
    ) -> crate::SendPromptReply
    {   let mut rx = self.send_prompt(request).await?;
        rx.recv().await.unwrap_or_else(|| {
          error!("Backend dropped prompt reply");
          Err(crate::error::Error::Other(
            "Backend dropped reply".to_string()
          ))
        })
    }

    /// Probe every provider - returns almost immediately
    pub async fn check_keys(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::CheckKeysReply>,
        crate::error::Error
      >
    {   debug!("check_keys queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::CheckKeysArgs
        {   reply: reply_tx
        };

        self.hand.check_keys_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down Backend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown timeout");
            Err(crate::error::Error::Timeout)
        }
    }
}

/// Main backend event loop
///
/// tokio::select! is ONLY for fast queueing. Every prompt and key check
/// is spawned onto its own task, so a slow provider never holds up
/// another request. The loop owns nothing mutable.
async fn run_backend_loop(
  foot: crate::BackendFoot
, http_client: reqwest::Client
, registry: Arc<Registry>
)
{   debug!("Starting Backend event loop");
    let BackendFoot
    {   mut send_prompt_rx
      , mut check_keys_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = send_prompt_rx.recv() => {
          debug!("Received SendPrompt");
          let client = http_client.clone();
          let registry = Arc::clone(&registry);
          tokio::spawn(async move {
            let result = crate::failover::dispatch(
              &client,
              &registry,
              &cmd.request
            ).await;
            let _ = cmd.reply.send(result);
          });
        }
      , Some(cmd) = check_keys_rx.recv() => {
          debug!("Received CheckKeys");
          let client = http_client.clone();
          let registry = Arc::clone(&registry);
          tokio::spawn(async move {
            let reports = crate::status::check_keys(&client, &registry).await;
            let _ = cmd.reply.send(reports);
          });
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("Backend shutting down");
          break;
        }
      , else => {
          debug!("All command channels closed");
          break;
        }
      }
    }
}
