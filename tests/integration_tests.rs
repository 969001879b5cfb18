mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use common::{endpoint, http_client, key, prefix, registry, reply_body};
use promoter::error::Error;
use promoter::failover::dispatch;
use promoter::prompt::{self, Tool};
use promoter::{Backend, PromptRequest, Provider, ServerConfig};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_reply(server: &MockServer, provider: Provider, text: &str, times: u64)
{   Mock::given(method("POST"))
      .and(path(endpoint(provider)))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(provider, text)))
      .expect(times)
      .mount(server)
      .await;
}

async fn mount_status(server: &MockServer, provider: Provider, status: u16, times: u64)
{   Mock::given(method("POST"))
      .and(path(endpoint(provider)))
      .respond_with(ResponseTemplate::new(status).set_body_string("upstream says no"))
      .expect(times)
      .mount(server)
      .await;
}

#[tokio::test]
async fn test_first_provider_reply_wins()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::OpenAI)))
      .and(header("authorization", format!("Bearer {}", key(Provider::OpenAI)).as_str()))
      .and(body_partial_json(json!({
        "model": "gpt-3.5-turbo",
        "messages": [{"role": "user", "content": "2+2"}]
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(Provider::OpenAI, "4")))
      .expect(1)
      .mount(&server)
      .await;
    mount_reply(&server, Provider::Gemini, "four", 0).await;

    let registry = registry(&server, &[Provider::OpenAI, Provider::Gemini]);
    let mut request = PromptRequest::new("2+2");
    request.hints.template = Some("default".to_string());

    let result = assert_ok!(dispatch(&http_client(), &registry, &request).await);
    assert_eq!(result.reply, "4");
    assert_eq!(result.provider, Provider::OpenAI);
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_rate_limited_provider_falls_through_to_next()
{   let server = MockServer::start().await;
    mount_status(&server, Provider::OpenAI, 429, 1).await;
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::OpenRouter)))
      .and(header("x-title", "Promoter Tests"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(reply_body(Provider::OpenRouter, "Hello from the router"))
      )
      .expect(1)
      .mount(&server)
      .await;

    let registry = registry(&server, &Provider::ALL);
    let result = assert_ok!(
      dispatch(&http_client(), &registry, &PromptRequest::new("hi")).await
    );
    assert_eq!(result.provider, Provider::OpenRouter);
    assert_eq!(result.reply, "Hello from the router");
    assert_eq!(
      result.failures,
      vec![(Provider::OpenAI, Error::ApiError(429, "upstream says no".to_string()))]
    );
}

#[tokio::test]
async fn test_providers_without_credentials_are_never_called()
{   let server = MockServer::start().await;
    mount_reply(&server, Provider::OpenAI, "nope", 0).await;
    mount_reply(&server, Provider::OpenRouter, "nope", 0).await;
    mount_reply(&server, Provider::Cohere, "Fresh deals", 1).await;
    mount_reply(&server, Provider::HuggingFace, "nope", 0).await;

    let registry = registry(&server, &[Provider::Cohere]);
    let result = assert_ok!(
      dispatch(&http_client(), &registry, &PromptRequest::new("deals")).await
    );
    assert_eq!(result.provider, Provider::Cohere);
    assert_eq!(result.reply, "Fresh deals");
}

#[tokio::test]
async fn test_preference_attempts_only_that_provider()
{   let server = MockServer::start().await;
    mount_reply(&server, Provider::OpenAI, "nope", 0).await;
    mount_reply(&server, Provider::Gemini, "nope", 0).await;
    mount_reply(&server, Provider::HuggingFace, "Big sale today", 1).await;

    let registry = registry(&server, &Provider::ALL);
    let request = PromptRequest::new("sale").with_preference(Provider::HuggingFace);
    let result = assert_ok!(dispatch(&http_client(), &registry, &request).await);
    assert_eq!(result.provider, Provider::HuggingFace);
    assert_eq!(result.reply, "Big sale today");
}

#[tokio::test]
async fn test_preferred_provider_failure_is_surfaced()
{   let server = MockServer::start().await;
    mount_status(&server, Provider::Cohere, 500, 1).await;
    mount_reply(&server, Provider::OpenAI, "nope", 0).await;

    let registry = registry(&server, &Provider::ALL);
    let request = PromptRequest::new("x").with_preference(Provider::Cohere);
    let err = assert_err!(dispatch(&http_client(), &registry, &request).await);
    assert_eq!(err, Error::ApiError(500, "upstream says no".to_string()));
}

#[tokio::test]
async fn test_unconfigured_preference_uses_priority_order()
{   let server = MockServer::start().await;
    mount_reply(&server, Provider::Gemini, "Hi there", 1).await;

    let registry = registry(&server, &[Provider::Gemini]);
    let request = PromptRequest::new("x").with_preference(Provider::OpenAI);
    let result = assert_ok!(dispatch(&http_client(), &registry, &request).await);
    assert_eq!(result.provider, Provider::Gemini);
}

#[tokio::test]
async fn test_provider_order_from_environment_is_followed()
{   let server = MockServer::start().await;
    mount_status(&server, Provider::Cohere, 503, 1).await;
    mount_reply(&server, Provider::OpenAI, "Cohere went first", 1).await;

    let env: HashMap<String, String> = [
      ("PROVIDER_ORDER", "cohere,openai".to_string())
    , ("COHERE_KEY", key(Provider::Cohere))
    , ("COHERE_BASE_URL", format!("{}{}", server.uri(), prefix(Provider::Cohere)))
    , ("OPENAI_KEY", key(Provider::OpenAI))
    , ("OPENAI_BASE_URL", format!("{}{}", server.uri(), prefix(Provider::OpenAI)))
    ]
      .into_iter()
      .map(|(k, v)| (k.to_string(), v))
      .collect();
    let config = assert_ok!(ServerConfig::from_lookup(|k| env.get(k).cloned()));

    let result = assert_ok!(
      dispatch(&http_client(), &config.registry, &PromptRequest::new("hi")).await
    );
    assert_eq!(result.provider, Provider::OpenAI);
    assert_eq!(result.reply, "Cohere went first");
    assert_eq!(
      result.failures,
      vec![(Provider::Cohere, Error::ApiError(503, "upstream says no".to_string()))]
    );
}

#[tokio::test]
async fn test_exhaustion_records_every_failure_in_order()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::OpenAI)))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "error": {"message": "quota exceeded", "type": "insufficient_quota"}
      })))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::OpenRouter)))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
      .expect(1)
      .mount(&server)
      .await;
    mount_reply(&server, Provider::Gemini, "   ", 1).await;
    mount_status(&server, Provider::Cohere, 503, 1).await;
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::HuggingFace)))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .expect(1)
      .mount(&server)
      .await;

    let registry = registry(&server, &Provider::ALL);
    let err = assert_err!(
      dispatch(&http_client(), &registry, &PromptRequest::new("x")).await
    );
    let failures = match err
    {   Error::AllProvidersExhausted(failures) => failures
      , other => panic!("expected exhaustion, got {:?}", other)
    };
    let order: Vec<Provider> = failures.iter().map(|(p, _)| *p).collect();
    assert_eq!(order, Provider::ALL.to_vec());
    assert_eq!(failures[0].1, Error::ProviderError("quota exceeded".to_string()));
    assert!(matches!(failures[1].1, Error::MalformedResponse(_)));
    assert_eq!(failures[2].1, Error::EmptyReply);
    assert_eq!(failures[3].1, Error::ApiError(503, "upstream says no".to_string()));
    assert!(matches!(failures[4].1, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn test_gemini_sends_key_in_query_string()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::Gemini)))
      .and(query_param("key", key(Provider::Gemini).as_str()))
      .and(body_partial_json(json!({
        "contents": [{"parts": [{"text": "hello"}]}]
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(Provider::Gemini, "Namaste")))
      .expect(1)
      .mount(&server)
      .await;

    let registry = registry(&server, &[Provider::Gemini]);
    let result = assert_ok!(
      dispatch(&http_client(), &registry, &PromptRequest::new("hello")).await
    );
    assert_eq!(result.reply, "Namaste");
}

#[tokio::test]
async fn test_tool_mode_sends_wrapped_prompt_with_smaller_cap()
{   let server = MockServer::start().await;
    let wrapped = prompt::tool_prompt(Tool::Hashtags, "Handmade soap from Jaipur");
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::Cohere)))
      .and(body_partial_json(json!({
        "prompt": wrapped,
        "max_tokens": prompt::TOOL_MAX_TOKENS
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(Provider::Cohere, "#soap #handmade")))
      .expect(1)
      .mount(&server)
      .await;

    let registry = registry(&server, &[Provider::Cohere]);
    let request = PromptRequest::new("Handmade soap from Jaipur").with_tool(Tool::Hashtags);
    let result = assert_ok!(dispatch(&http_client(), &registry, &request).await);
    assert_eq!(result.reply, "#soap #handmade");
}

#[tokio::test]
async fn test_hung_provider_times_out_and_falls_through()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::OpenAI)))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(reply_body(Provider::OpenAI, "too late"))
          .set_delay(Duration::from_secs(3))
      )
      .mount(&server)
      .await;
    mount_reply(&server, Provider::OpenRouter, "on time", 1).await;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_millis(300))
      .build()
      .unwrap();
    let registry = registry(&server, &[Provider::OpenAI, Provider::OpenRouter]);
    let result = assert_ok!(dispatch(&client, &registry, &PromptRequest::new("x")).await);
    assert_eq!(result.provider, Provider::OpenRouter);
    assert_eq!(result.failures, vec![(Provider::OpenAI, Error::Timeout)]);
}

#[tokio::test]
async fn test_backend_dispatches_and_shuts_down()
{   let server = MockServer::start().await;
    mount_reply(&server, Provider::OpenAI, "Hello!", 2).await;

    let backend = Backend::new(
      http_client()
    , Arc::new(registry(&server, &[Provider::OpenAI]))
    );

    let mut rx = assert_ok!(backend.send_prompt(PromptRequest::new("hi")).await);
    let reply = tokio::time::timeout(Duration::from_secs(5), rx.recv())
      .await
      .expect("reply in time")
      .expect("reply sent");
    assert_eq!(assert_ok!(reply).reply, "Hello!");

    let result = assert_ok!(backend.dispatch(PromptRequest::new("again")).await);
    assert_eq!(result.provider, Provider::OpenAI);

    assert_ok!(backend.shutdown().await);
}

#[tokio::test]
async fn test_backend_runs_prompts_concurrently()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path(endpoint(Provider::OpenAI)))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(reply_body(Provider::OpenAI, "slow"))
          .set_delay(Duration::from_millis(500))
      )
      .expect(4)
      .mount(&server)
      .await;

    let backend = Backend::new(
      http_client()
    , Arc::new(registry(&server, &[Provider::OpenAI]))
    );
    let started = std::time::Instant::now();
    let (a, b, c, d) = tokio::join!(
      backend.dispatch(PromptRequest::new("1"))
    , backend.dispatch(PromptRequest::new("2"))
    , backend.dispatch(PromptRequest::new("3"))
    , backend.dispatch(PromptRequest::new("4"))
    );
    for result in [a, b, c, d]
    {   assert_eq!(assert_ok!(result).reply, "slow");
    }
    assert!(started.elapsed() < Duration::from_millis(1500));
}
