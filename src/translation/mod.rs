/*!
 * Translation layer on top of the provider capability tables.
 *
 * - `adapter`: generic adapter implementing translate/detect for one provider
 * - `manager`: registry of adapters and routing to the active one
 * - `cache`: per-adapter translation and detection cache
 * - `retry`: retry with exponential backoff for remote calls
 * - `prompts`: prompt templates for translation and detection
 */

// Re-export main types for easier usage
pub use self::adapter::{AdapterContext, ApiStatus, HealthStatus, ProviderAdapter, TranslationResult};
pub use self::cache::{CacheStats, TranslationCache};
pub use self::manager::{ApiInfo, ProviderManager};
pub use self::retry::RetryPolicy;

// Submodules
pub mod adapter;
pub mod cache;
pub mod manager;
pub mod prompts;
pub mod retry;
