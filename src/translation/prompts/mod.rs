/*!
 * Prompt construction for the translation providers.
 *
 * This module provides:
 * - System prompt templates for translation and detection
 * - Builders turning a request into a provider-neutral `Prompt`
 */

pub mod templates;

// Re-export main types
pub use templates::{detection_prompt, translation_prompt, PromptTemplate, DETECTION_MAX_TOKENS};
