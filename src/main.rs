mod client;
mod config;
mod controller;
mod error;
mod logger;
mod media;
mod models;
mod prompts;
mod render;
mod router;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;

use client::ModelClient;
use router::{run_router, RouterState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  let log_path = std::env::var(logger::LOG_PATH_ENV).ok().map(PathBuf::from);
  logger::init(log_path.as_deref())?;

  let config = config::load_from_env().context("failed to load configuration")?;
  let api_key = config::api_key_from_env()?;
  let client = ModelClient::new(&config, &api_key)?;

  let listener = std::net::TcpListener::bind(&config.bind_addr)
    .with_context(|| format!("failed to bind {}", config.bind_addr))?;
  let addr = listener.local_addr()?;
  tracing::info!(%addr, model = %config.model, "medassist listening");

  let state = RouterState {
    started_at: Instant::now(),
    client,
  };
  run_router(listener, state).await
}
