const IMAGE_PROMPT: &str = "
You are a medical expert analyzing images of human body parts for potential diseases or health issues. You are working in a reputable hospital's telemedicine unit.

Given an image, provide a detailed analysis of:
1. Observed findings (symptoms/anomalies)
2. Possible medical conditions
3. Recommended next steps (tests, consultation, self-care)
4. Urgency level (e.g., Immediate, Moderate, Routine)
5. Disclaimer: Always consult a licensed physician before taking action.

If the image quality is poor or unidentifiable, state that clearly.
";

const TEXT_PROMPT_HEAD: &str = "
You are a virtual medical assistant working in a hospital. A user has submitted the following description of their medical concern:

\"";

const TEXT_PROMPT_TAIL: &str = "\"

Provide a structured response that includes:
1. Possible conditions or explanations
2. Recommended actions (self-care or consult type)
3. Red flags (if any)
4. Disclaimer: This is not a medical diagnosis. Always consult a healthcare professional.
";

const SIMPLIFY_PREFIX: &str = "Explain the following in very simple terms. :\n";

pub fn build_image_prompt() -> &'static str {
  IMAGE_PROMPT
}

/// The description is interpolated as-is; quotes or markup inside it are not escaped.
pub fn build_text_prompt(description: &str) -> String {
  let mut prompt =
    String::with_capacity(TEXT_PROMPT_HEAD.len() + description.len() + TEXT_PROMPT_TAIL.len());
  prompt.push_str(TEXT_PROMPT_HEAD);
  prompt.push_str(description);
  prompt.push_str(TEXT_PROMPT_TAIL);
  prompt
}

pub fn build_simplify_prompt(prior: &str) -> String {
  format!("{SIMPLIFY_PREFIX}{prior}")
}
