use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::client::ModelClient;
use crate::error::{AssistError, AssistResult};
use crate::media::{extension_of, is_allowed_extension};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
  Image,
  Text,
}

enum State {
  AwaitingImageInput { upload: Option<NamedTempFile> },
  AwaitingTextInput { description: String },
}

impl State {
  fn empty(mode: Mode) -> Self {
    match mode {
      Mode::Image => State::AwaitingImageInput { upload: None },
      Mode::Text => State::AwaitingTextInput {
        description: String::new(),
      },
    }
  }
}

#[derive(Debug, PartialEq)]
pub enum UserInput<'a> {
  ImagePath(&'a Path),
  SymptomText(&'a str),
}

/// Result of one confirmed interaction. `primary` is shown first, then `simplified`.
/// A failed simplification leaves `primary` intact and is reported in `simplify_error`.
#[derive(Debug)]
pub struct Interaction {
  pub primary: String,
  pub simplified: Option<String>,
  pub simplify_error: Option<AssistError>,
}

/// Drives a single user interaction. Uploaded files live only as long as the controller.
pub struct InteractionController<'a> {
  client: &'a ModelClient,
  state: State,
}

impl<'a> InteractionController<'a> {
  pub fn new(client: &'a ModelClient, mode: Mode) -> Self {
    Self {
      client,
      state: State::empty(mode),
    }
  }

  pub fn mode(&self) -> Mode {
    match self.state {
      State::AwaitingImageInput { .. } => Mode::Image,
      State::AwaitingTextInput { .. } => Mode::Text,
    }
  }

  /// Switching modes discards whatever was entered in the previous one.
  pub fn select_mode(&mut self, mode: Mode) {
    if self.mode() != mode {
      self.state = State::empty(mode);
    }
  }

  pub fn pending_input(&self) -> Option<UserInput<'_>> {
    match &self.state {
      State::AwaitingImageInput { upload } => upload
        .as_ref()
        .map(|file| UserInput::ImagePath(file.path())),
      State::AwaitingTextInput { description } => Some(UserInput::SymptomText(description)),
    }
  }

  /// Stores the upload in a temp file, replacing (and deleting) any earlier one.
  pub fn upload_image(&mut self, file_name: &str, bytes: &[u8]) -> AssistResult<&Path> {
    let State::AwaitingImageInput { upload } = &mut self.state else {
      return Err(AssistError::Validation(
        "Switch to image mode before uploading.".to_string(),
      ));
    };
    let name = Path::new(file_name);
    if !is_allowed_extension(name) {
      return Err(AssistError::Validation(
        "Only jpg, jpeg and png images are accepted.".to_string(),
      ));
    }
    let suffix = extension_of(name)
      .map(|ext| format!(".{ext}"))
      .unwrap_or_default();

    let mut file = tempfile::Builder::new()
      .prefix("medassist-")
      .suffix(&suffix)
      .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    tracing::debug!(path = %file.path().display(), size = bytes.len(), "stored upload");

    Ok(upload.insert(file).path())
  }

  pub fn set_description(&mut self, text: &str) -> AssistResult<()> {
    match &mut self.state {
      State::AwaitingTextInput { description } => {
        *description = text.to_string();
        Ok(())
      }
      State::AwaitingImageInput { .. } => Err(AssistError::Validation(
        "Switch to text mode before describing symptoms.".to_string(),
      )),
    }
  }

  /// Runs the analysis for the current mode and optionally chains a simplification.
  /// Consumes the controller so a pending upload is removed on every exit path.
  pub async fn confirm(self, simplify: bool) -> AssistResult<Interaction> {
    let primary = match self.pending_input() {
      Some(UserInput::ImagePath(path)) => self.client.analyze_image(path).await?,
      Some(UserInput::SymptomText(description)) => self.client.analyze_text(description).await?,
      None => {
        return Err(AssistError::Validation(
          "Please upload an image before proceeding.".to_string(),
        ))
      }
    };

    let mut interaction = Interaction {
      primary,
      simplified: None,
      simplify_error: None,
    };
    if simplify {
      match self.client.simplify(&interaction.primary).await {
        Ok(text) => interaction.simplified = Some(text),
        Err(err) => {
          tracing::warn!(code = err.code(), "simplification failed: {err}");
          interaction.simplify_error = Some(err);
        }
      }
    }
    Ok(interaction)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::client::stub::{reply, spawn};

  #[tokio::test]
  async fn text_mode_without_simplify_makes_one_call() {
    let (upstream, config) = spawn(vec![reply("Possible viral pharyngitis...")]).await;
    let client = ModelClient::new(&config, "sk-test").unwrap();

    let mut controller = InteractionController::new(&client, Mode::Text);
    controller.set_description("sore throat for 3 days").unwrap();
    let interaction = controller.confirm(false).await.unwrap();

    assert_eq!(interaction.primary, "Possible viral pharyngitis...");
    assert_eq!(interaction.simplified, None);
    assert!(interaction.simplify_error.is_none());
    assert_eq!(upstream.calls(), 1);
  }

  #[tokio::test]
  async fn image_mode_with_simplify_chains_two_calls_in_order() -> anyhow::Result<()> {
    let (upstream, config) = spawn(vec![
      reply("Findings: circular red patch. Possible ringworm."),
      reply("You have a skin spot caused by a fungus."),
    ])
    .await;
    let client = ModelClient::new(&config, "sk-test")?;

    let mut controller = InteractionController::new(&client, Mode::Image);
    let jpeg = [0xFFu8, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    let upload_path = controller.upload_image("arm.jpg", &jpeg)?.to_path_buf();
    assert!(upload_path.exists());

    let interaction = controller.confirm(true).await?;
    assert_eq!(
      interaction.primary,
      "Findings: circular red patch. Possible ringworm."
    );
    assert_eq!(
      interaction.simplified.as_deref(),
      Some("You have a skin spot caused by a fungus.")
    );
    assert_eq!(upstream.calls(), 2);

    let requests = upstream.requests();
    assert!(requests[0]["messages"][0]["content"].is_array());
    assert!(requests[1]["messages"][0]["content"]
      .as_str()
      .unwrap()
      .ends_with("Findings: circular red patch. Possible ringworm."));
    assert!(!upload_path.exists(), "upload should be removed after the interaction");
    Ok(())
  }

  #[tokio::test]
  async fn simplify_failure_keeps_primary_result() {
    let (upstream, config) = spawn(vec![
      reply("Possible viral pharyngitis..."),
      (
        axum::http::StatusCode::TOO_MANY_REQUESTS,
        serde_json::json!({ "error": "quota" }),
      ),
    ])
    .await;
    let client = ModelClient::new(&config, "sk-test").unwrap();

    let mut controller = InteractionController::new(&client, Mode::Text);
    controller.set_description("sore throat for 3 days").unwrap();
    let interaction = controller.confirm(true).await.unwrap();

    assert_eq!(interaction.primary, "Possible viral pharyngitis...");
    assert_eq!(interaction.simplified, None);
    assert!(matches!(
      interaction.simplify_error,
      Some(AssistError::Upstream(ref msg)) if msg.contains("429")
    ));
    assert_eq!(upstream.calls(), 2);
  }

  #[tokio::test]
  async fn empty_description_warns_without_calling() {
    let (upstream, config) = spawn(vec![reply("unused")]).await;
    let client = ModelClient::new(&config, "sk-test").unwrap();

    for input in ["", "   "] {
      let mut controller = InteractionController::new(&client, Mode::Text);
      controller.set_description(input).unwrap();
      let err = controller.confirm(true).await.unwrap_err();
      assert!(matches!(err, AssistError::Validation(_)));
    }
    assert_eq!(upstream.calls(), 0);
  }

  #[tokio::test]
  async fn failed_upstream_still_removes_upload() {
    let (_upstream, config) =
      spawn(vec![(axum::http::StatusCode::OK, serde_json::json!({ "choices": [] }))]).await;
    let client = ModelClient::new(&config, "sk-test").unwrap();

    let mut controller = InteractionController::new(&client, Mode::Image);
    let path = controller.upload_image("face.png", b"png").unwrap().to_path_buf();
    let err = controller.confirm(false).await.unwrap_err();

    assert!(matches!(err, AssistError::Upstream(_)));
    assert!(!path.exists());
  }

  #[tokio::test]
  async fn repeated_upload_replaces_previous_file() {
    let (_upstream, config) = spawn(vec![]).await;
    let client = ModelClient::new(&config, "sk-test").unwrap();

    let mut controller = InteractionController::new(&client, Mode::Image);
    let first = controller.upload_image("a.jpg", b"one").unwrap().to_path_buf();
    let second = controller.upload_image("b.jpeg", b"two").unwrap().to_path_buf();

    assert!(!first.exists());
    assert!(second.exists());
    assert_eq!(std::fs::read(&second).unwrap(), b"two");
    assert_eq!(controller.pending_input(), Some(UserInput::ImagePath(&second)));
  }

  #[tokio::test]
  async fn switching_mode_discards_pending_input() {
    let (upstream, config) = spawn(vec![]).await;
    let client = ModelClient::new(&config, "sk-test").unwrap();

    let mut controller = InteractionController::new(&client, Mode::Image);
    let path = controller.upload_image("a.png", b"img").unwrap().to_path_buf();
    controller.select_mode(Mode::Text);
    assert!(!path.exists());
    assert_eq!(controller.pending_input(), Some(UserInput::SymptomText("")));

    controller.set_description("rash").unwrap();
    controller.select_mode(Mode::Text);
    assert_eq!(controller.pending_input(), Some(UserInput::SymptomText("rash")));

    controller.select_mode(Mode::Image);
    assert_eq!(controller.pending_input(), None);
    let err = controller.confirm(false).await.unwrap_err();
    assert!(matches!(err, AssistError::Validation(_)));
    assert_eq!(upstream.calls(), 0);
  }

  #[tokio::test]
  async fn mode_mismatch_and_bad_extension_are_rejected() {
    let (_upstream, config) = spawn(vec![]).await;
    let client = ModelClient::new(&config, "sk-test").unwrap();

    let mut controller = InteractionController::new(&client, Mode::Text);
    assert!(controller.upload_image("a.jpg", b"x").is_err());

    controller.select_mode(Mode::Image);
    assert!(controller.set_description("cough").is_err());
    assert!(matches!(
      controller.upload_image("scan.gif", b"x"),
      Err(AssistError::Validation(_))
    ));
  }
}
