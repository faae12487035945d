use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Outbound text capability of a conversation, supplied by the host
/// framework alongside each inbound event.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Platform message-query API used to resolve quoted messages.
///
/// Returns the raw response body (e.g. `{"message": [{type, data}, ...]}`);
/// callers parse it defensively, since its shape is platform-defined.
#[async_trait]
pub trait MessageLookup: Send + Sync {
    async fn get_message(&self, message_id: &str) -> Result<Value>;
}
