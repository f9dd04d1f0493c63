use std::net::TcpListener;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::client::ModelClient;
use crate::controller::{Interaction, InteractionController, Mode};
use crate::error::{AssistError, AssistResult};
use crate::models::{AnalysisResponse, AnalyzeTextRequest, SimplifyRequest};
use crate::render::rendered;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub struct RouterState {
  pub started_at: Instant,
  pub client: ModelClient,
}

pub fn build_router(state: RouterState) -> Router {
  Router::new()
    .route("/", get(index))
    .route("/health", get(health))
    .route("/v1/analyze/text", post(analyze_text))
    .route("/v1/analyze/image", post(analyze_image))
    .route("/v1/simplify", post(simplify))
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .with_state(Arc::new(state))
}

pub async fn run_router(listener: TcpListener, state: RouterState) -> anyhow::Result<()> {
  listener.set_nonblocking(true)?;
  let listener = tokio::net::TcpListener::from_std(listener)?;
  axum::serve(listener, build_router(state)).await?;
  Ok(())
}

async fn index() -> Html<&'static str> {
  Html(INDEX_HTML)
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<serde_json::Value> {
  let uptime = state.started_at.elapsed().as_millis();
  Json(serde_json::json!({
    "status": "ok",
    "version": env!("CARGO_PKG_VERSION"),
    "uptime_ms": uptime
  }))
}

async fn analyze_text(
  State(state): State<Arc<RouterState>>,
  Json(req): Json<AnalyzeTextRequest>,
) -> AssistResult<Json<AnalysisResponse>> {
  let mut controller = InteractionController::new(&state.client, Mode::Text);
  controller.set_description(&req.description)?;
  let interaction = controller.confirm(req.simplify).await?;
  Ok(Json(to_response(&state, interaction)))
}

async fn analyze_image(
  State(state): State<Arc<RouterState>>,
  mut multipart: Multipart,
) -> AssistResult<Json<AnalysisResponse>> {
  let mut controller = InteractionController::new(&state.client, Mode::Image);
  let mut simplify = false;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|err| AssistError::Validation(format!("invalid upload: {err}")))?
  {
    match field.name() {
      Some("file") => {
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
          .bytes()
          .await
          .map_err(|err| AssistError::Validation(format!("invalid upload: {err}")))?;
        controller.upload_image(&file_name, &bytes)?;
      }
      Some("simplify") => {
        let value = field
          .text()
          .await
          .map_err(|err| AssistError::Validation(format!("invalid upload: {err}")))?;
        simplify = parse_flag(&value);
      }
      _ => {}
    }
  }

  let interaction = controller.confirm(simplify).await?;
  Ok(Json(to_response(&state, interaction)))
}

async fn simplify(
  State(state): State<Arc<RouterState>>,
  Json(req): Json<SimplifyRequest>,
) -> AssistResult<Json<AnalysisResponse>> {
  if req.text.trim().is_empty() {
    return Err(AssistError::Validation(
      "Nothing to simplify yet.".to_string(),
    ));
  }
  let text = state.client.simplify(&req.text).await?;
  Ok(Json(to_response(
    &state,
    Interaction {
      primary: text,
      simplified: None,
      simplify_error: None,
    },
  )))
}

fn parse_flag(value: &str) -> bool {
  matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes")
}

fn to_response(state: &RouterState, interaction: Interaction) -> AnalysisResponse {
  AnalysisResponse {
    id: uuid::Uuid::new_v4().to_string(),
    model: state.client.model().to_string(),
    analyzed_at: Utc::now().to_rfc3339(),
    primary: rendered(interaction.primary),
    simplified: interaction.simplified.map(rendered),
    simplified_error: interaction.simplify_error.as_ref().map(AssistError::to_body),
  }
}
