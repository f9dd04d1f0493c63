use pulldown_cmark::{html, Options, Parser};

use crate::models::RenderedText;

/// Renders model output as markdown. Raw HTML in the reply is passed through untouched.
pub fn render_markdown(text: &str) -> String {
  let mut options = Options::empty();
  options.insert(Options::ENABLE_TABLES);
  options.insert(Options::ENABLE_STRIKETHROUGH);

  let parser = Parser::new_ext(text, options);
  let mut out = String::with_capacity(text.len() * 3 / 2);
  html::push_html(&mut out, parser);
  out
}

pub fn rendered(text: String) -> RenderedText {
  let html = render_markdown(&text);
  RenderedText { text, html }
}
