use async_trait::async_trait;

use super::error::{DeliveryError, GenerationError};

/// Free-form text generation, e.g. a hosted language model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Outbound messaging to a conversation participant.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, recipient: &str, body: &str) -> Result<(), DeliveryError>;
}
