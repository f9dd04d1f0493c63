use std::path::Path;

use base64::Engine;

use crate::error::AssistResult;
use crate::models::ImageData;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn extension_of(path: &Path) -> Option<String> {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| ext.to_ascii_lowercase())
}

pub fn is_allowed_extension(path: &Path) -> bool {
  extension_of(path)
    .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    .unwrap_or(false)
}

fn mime_for(path: &Path) -> &'static str {
  match extension_of(path).as_deref() {
    Some("png") => "image/png",
    _ => "image/jpeg",
  }
}

/// Reads the file and base64-encodes its bytes. Contents are passed through unchecked.
pub fn encode_image(path: &Path) -> AssistResult<ImageData> {
  let bytes = std::fs::read(path)?;
  let base64 = base64::engine::general_purpose::STANDARD.encode(bytes);

  Ok(ImageData {
    mime: mime_for(path).to_string(),
    base64,
  })
}
