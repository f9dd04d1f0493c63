use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AssistError, AssistResult};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const CONFIG_PATH_ENV: &str = "MEDASSIST_CONFIG";
pub const BIND_ENV: &str = "MEDASSIST_BIND";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
  pub model: String,
  pub api_base: String,
  pub bind_addr: String,
  pub image_max_tokens: u32,
  pub text_max_tokens: u32,
  pub simplify_max_tokens: u32,
  pub request_timeout_secs: u64,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      model: "gpt-4-turbo".to_string(),
      api_base: "https://api.openai.com/v1".to_string(),
      bind_addr: "127.0.0.1:8501".to_string(),
      image_max_tokens: 1500,
      text_max_tokens: 1000,
      simplify_max_tokens: 1000,
      request_timeout_secs: 120,
    }
  }
}

impl AppConfig {
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }
}

pub fn load_or_init(path: &Path) -> anyhow::Result<AppConfig> {
  if path.exists() {
    let data = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&data)?;
    Ok(config)
  } else {
    let config = AppConfig::default();
    save_config(path, &config)?;
    Ok(config)
  }
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(config)?;
  std::fs::write(path, json)?;
  Ok(())
}

/// Resolves the config file (if any) and applies environment overrides.
pub fn load_from_env() -> anyhow::Result<AppConfig> {
  load_with(|name| std::env::var(name).ok())
}

fn load_with(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<AppConfig> {
  let non_blank = |name: &str| {
    lookup(name)
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty())
  };

  let mut config = match non_blank(CONFIG_PATH_ENV) {
    Some(path) => load_or_init(Path::new(&path))?,
    None => AppConfig::default(),
  };
  if let Some(bind) = non_blank(BIND_ENV) {
    config.bind_addr = bind;
  }
  Ok(config)
}

pub fn api_key_from_env() -> AssistResult<String> {
  let key = std::env::var(API_KEY_ENV).unwrap_or_default();
  validate_api_key(key)
}

fn validate_api_key(key: String) -> AssistResult<String> {
  if key.trim().is_empty() {
    Err(AssistError::Config(format!("{API_KEY_ENV} is not set")))
  } else {
    Ok(key.trim().to_string())
  }
}
