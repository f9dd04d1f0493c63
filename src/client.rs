use std::path::Path;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::config::AppConfig;
use crate::error::{AssistError, AssistResult};
use crate::media::encode_image;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, MessageContent};
use crate::prompts::{build_image_prompt, build_simplify_prompt, build_text_prompt};

/// Chat-completion client. Built once at startup and shared read-only.
pub struct ModelClient {
  http: reqwest::Client,
  endpoint: String,
  headers: HeaderMap,
  model: String,
  image_max_tokens: u32,
  text_max_tokens: u32,
  simplify_max_tokens: u32,
}

impl ModelClient {
  pub fn new(config: &AppConfig, api_key: &str) -> AssistResult<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(
      AUTHORIZATION,
      HeaderValue::from_str(&format!("Bearer {}", api_key))
        .map_err(|err| AssistError::Config(format!("api key: {err}")))?,
    );

    let http = reqwest::Client::builder()
      .timeout(config.request_timeout())
      .build()
      .map_err(|err| AssistError::Config(format!("http client: {err}")))?;

    Ok(Self {
      http,
      endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
      headers,
      model: config.model.clone(),
      image_max_tokens: config.image_max_tokens,
      text_max_tokens: config.text_max_tokens,
      simplify_max_tokens: config.simplify_max_tokens,
    })
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  pub async fn analyze_image(&self, image_path: &Path) -> AssistResult<String> {
    let image = encode_image(image_path)?;
    let content = MessageContent::text_with_image(build_image_prompt(), &image);
    self.complete(content, self.image_max_tokens).await
  }

  pub async fn analyze_text(&self, description: &str) -> AssistResult<String> {
    if description.trim().is_empty() {
      return Err(AssistError::Validation(
        "Please enter a description before proceeding.".to_string(),
      ));
    }
    let content = MessageContent::Text(build_text_prompt(description));
    self.complete(content, self.text_max_tokens).await
  }

  pub async fn simplify(&self, text: &str) -> AssistResult<String> {
    let content = MessageContent::Text(build_simplify_prompt(text));
    self.complete(content, self.simplify_max_tokens).await
  }

  /// Sends a single user message and returns the first choice's text unmodified.
  async fn complete(&self, content: MessageContent, max_tokens: u32) -> AssistResult<String> {
    let payload = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessage {
        role: "user".to_string(),
        content,
      }],
      max_tokens,
    };

    let started = Instant::now();
    let resp = self
      .http
      .post(&self.endpoint)
      .headers(self.headers.clone())
      .json(&payload)
      .send()
      .await
      .map_err(|err| AssistError::Upstream(err.to_string()))?;

    if !resp.status().is_success() {
      let upstream_status = resp.status();
      let text = resp
        .text()
        .await
        .unwrap_or_else(|_| "chat completion request failed".to_string());
      return Err(AssistError::Upstream(format!(
        "upstream error ({}): {}",
        upstream_status, text
      )));
    }

    let body = resp
      .json::<ChatCompletionResponse>()
      .await
      .map_err(|err| AssistError::Upstream(format!("malformed response: {err}")))?;

    tracing::info!(
      model = %self.model,
      max_tokens,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "chat completion finished"
    );

    let choice = body
      .choices
      .into_iter()
      .next()
      .ok_or_else(|| AssistError::Upstream("response contained no choices".to_string()))?;
    match choice.message.content {
      Some(text) if !text.is_empty() => Ok(text),
      _ => Err(AssistError::Upstream("first choice has no content".to_string())),
    }
  }
}

#[cfg(test)]
pub(crate) mod stub {
  use std::collections::VecDeque;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  use axum::extract::State;
  use axum::http::{HeaderMap, StatusCode};
  use axum::response::IntoResponse;
  use axum::routing::post;
  use axum::{Json, Router};

  use crate::config::AppConfig;

  /// Canned chat-completion endpoint that records what it receives.
  #[derive(Default)]
  pub struct Upstream {
    calls: AtomicUsize,
    requests: Mutex<Vec<serde_json::Value>>,
    auth: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<(StatusCode, serde_json::Value)>>,
  }

  impl Upstream {
    pub fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<serde_json::Value> {
      self.requests.lock().unwrap().clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
      self.auth.lock().unwrap().clone()
    }
  }

  pub fn reply(text: &str) -> (StatusCode, serde_json::Value) {
    (
      StatusCode::OK,
      serde_json::json!({ "choices": [ { "message": { "role": "assistant", "content": text } } ] }),
    )
  }

  async fn completions(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
  ) -> impl IntoResponse {
    upstream.calls.fetch_add(1, Ordering::SeqCst);
    upstream.requests.lock().unwrap().push(body);
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
      upstream.auth.lock().unwrap().push(value.to_string());
    }
    let (status, body) = upstream
      .replies
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| (StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({ "error": "no reply queued" })));
    (status, Json(body))
  }

  /// Starts the stub on an ephemeral port and returns it with a config pointing at it.
  pub async fn spawn(replies: Vec<(StatusCode, serde_json::Value)>) -> (Arc<Upstream>, AppConfig) {
    let upstream = Arc::new(Upstream {
      replies: Mutex::new(replies.into()),
      ..Default::default()
    });
    let app = Router::new()
      .route("/v1/chat/completions", post(completions))
      .with_state(upstream.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    let config = AppConfig {
      api_base: format!("http://{addr}/v1"),
      request_timeout_secs: 5,
      ..AppConfig::default()
    };
    (upstream, config)
  }
}
