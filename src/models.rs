use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageData {
  pub mime: String,
  pub base64: String,
}

impl ImageData {
  pub fn data_url(&self) -> String {
    format!("data:{};base64,{}", self.mime, self.base64)
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageUrl {
  pub url: String,
  pub detail: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
  Text { text: String },
  ImageUrl { image_url: ImageUrl },
}

/// Message content is either a bare string or a list of typed parts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
  Text(String),
  Parts(Vec<ContentPart>),
}

impl MessageContent {
  pub fn text_with_image(text: &str, image: &ImageData) -> Self {
    MessageContent::Parts(vec![
      ContentPart::Text {
        text: text.to_string(),
      },
      ContentPart::ImageUrl {
        image_url: ImageUrl {
          url: image.data_url(),
          detail: "high".to_string(),
        },
      },
    ])
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
  pub role: String,
  pub content: MessageContent,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatCompletionRequest {
  pub model: String,
  pub messages: Vec<ChatMessage>,
  pub max_tokens: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChoiceMessage {
  #[serde(default)]
  pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Choice {
  pub message: ChoiceMessage,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatCompletionResponse {
  #[serde(default)]
  pub choices: Vec<Choice>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyzeTextRequest {
  pub description: String,
  #[serde(default)]
  pub simplify: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SimplifyRequest {
  pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderedText {
  pub text: String,
  pub html: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
  pub error: String,
  pub code: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalysisResponse {
  pub id: String,
  pub model: String,
  pub analyzed_at: String,
  #[serde(flatten)]
  pub primary: RenderedText,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub simplified: Option<RenderedText>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub simplified_error: Option<ErrorBody>,
}
