//! Prompt construction for the analysis request.

use crate::fetch::char_prefix;

/// Configuration for the analysis prompt.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Maximum number of page characters embedded in the prompt.
    pub content_limit: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { content_limit: 2000 }
    }
}

/// Output format the model is asked to follow. The parser relies on this shape.
const FORMAT_INSTRUCTIONS: &str = "\
Format your response in markdown and include:
- A summary text
- Markdown table using pipe format (|col1|col2| etc.)
- BAR: Title: My Bar Chart
  Labels: A, B, C
  Values: 10, 20, 30
- PIE: Title: My Pie Chart
  Labels: X, Y, Z
  Values: 25, 35, 40";

/// Builds the single user message sent to the model.
///
/// Page content is cut to `content_limit` characters.
pub fn build_prompt(content: &str, user_prompt: &str, config: &PromptConfig) -> String {
    let excerpt = char_prefix(content, config.content_limit);

    format!(
        "Analyze the following website content and respond to the user's prompt.\n\n\
         Content:\n{}\n\n\
         Prompt: {}\n\n\
         {}\n",
        excerpt,
        user_prompt.trim(),
        FORMAT_INSTRUCTIONS
    )
}
