/*!
 * Prompt templates for translation and language detection.
 *
 * Templates carry `{placeholder}` markers that are substituted at render time.
 * Every provider receives the same wording; only the wire layout differs.
 */

use crate::language_utils::LanguageDescriptor;
use crate::providers::Prompt;

/// Output budget for detection answers; a code is a couple of tokens
pub const DETECTION_MAX_TOKENS: u32 = 10;

/// System prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Translation instructions
    pub const TRANSLATOR: &'static str = r#"You are a professional translator. Translate the text you are given from {source_language} to {target_language}.

Rules:
- Translate only. Do not add, remove or change meaning.
- Do not explain, comment on, or annotate the translation.
- Preserve formatting, line breaks, punctuation style, numbers and names.
- Reply with the translated text and nothing else."#;

    /// Detection instructions
    pub const DETECTOR: &'static str = r#"Identify the language of the text you are given.
Reply with the ISO 639-1 language code only (for example: en, tr, de, ja).
Do not add any other words or punctuation."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn translator() -> Self {
        Self::new(Self::TRANSLATOR)
    }

    pub fn detector() -> Self {
        Self::new(Self::DETECTOR)
    }

    /// Render the template with the given variables.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::translator()
    }
}

/// Language label used inside prompts: `English (en)`
fn prompt_label(language: &LanguageDescriptor) -> String {
    if language.is_auto() {
        "the language it is written in".to_string()
    } else if language.name == language.code {
        language.code.clone()
    } else {
        format!("{} ({})", language.name, language.code)
    }
}

/// Prompt asking for a bare language code
pub fn detection_prompt(text: &str) -> Prompt {
    Prompt {
        system: PromptTemplate::detector().render("", ""),
        user: text.to_string(),
        max_tokens: Some(DETECTION_MAX_TOKENS),
    }
}

/// Prompt asking for a faithful translation
pub fn translation_prompt(text: &str, source: &LanguageDescriptor, target: &LanguageDescriptor) -> Prompt {
    Prompt {
        system: PromptTemplate::translator().render(&prompt_label(source), &prompt_label(target)),
        user: text.to_string(),
        max_tokens: None,
    }
}
