use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::GenerationError;
use crate::GenerationClient;

/// Replays queued replies in order. Used offline and in tests.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call waits on `gate` before replying.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    pub fn push_failure(&self, error: GenerationError) -> &Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or(Err(GenerationError::Exhausted))?;
        if reply.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_exhausts() {
        let client = ScriptedClient::new();
        client.push_text("first").push_failure(GenerationError::EmptyResponse);

        assert_eq!(client.generate("a").await.unwrap(), "first");
        assert!(matches!(
            client.generate("b").await,
            Err(GenerationError::EmptyResponse)
        ));
        assert!(matches!(
            client.generate("c").await,
            Err(GenerationError::Exhausted)
        ));
        assert_eq!(client.calls(), 3);
        assert_eq!(client.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn blank_text_counts_as_empty() {
        let client = ScriptedClient::new();
        client.push_text("   ");
        assert!(matches!(
            client.generate("a").await,
            Err(GenerationError::EmptyResponse)
        ));
    }
}
