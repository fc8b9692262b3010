//! Generation provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Turns an assembled prompt into generated text.
///
/// The only expected blocking point in the question-answering path; may
/// fail with timeout, auth, or quota errors, all of which the engine maps
/// to its graceful-degrade path.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text for the given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier in use
    fn model(&self) -> &str;
}
