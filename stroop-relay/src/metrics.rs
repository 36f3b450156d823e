use crate::provider::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Instant;

/// Estimate token count from text using the chars/4 heuristic.
///
/// This is an approximation, not tokenization. Ceiling division keeps short
/// non-empty strings from counting as zero.
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(4)
}

/// Sum of per-message estimates. Rounding happens per message.
pub fn estimate_message_tokens(messages: &[ChatMessage]) -> u64 {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}

/// Usage and latency of one completed chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMetrics {
    pub response_text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub finish_reason: Option<String>,
    pub first_token_latency_ms: Option<u64>,
    pub chunk_count: usize,
    pub request_snapshot: Value,
    pub response_snapshot: Value,
    pub completed_at: DateTime<Utc>,
}

/// One-shot latch shared by every completion path of a relay call.
#[derive(Debug, Default)]
pub struct CompletionLatch {
    fired: AtomicBool,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for the first caller only.
    pub fn claim(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Accumulates streamed text and timing for a single call.
#[derive(Debug)]
pub struct ResponseCollector {
    dispatched_at: Instant,
    text: String,
    chunks: usize,
    first_token_at: Option<Instant>,
}

impl ResponseCollector {
    pub fn new(dispatched_at: Instant) -> Self {
        Self {
            dispatched_at,
            text: String::new(),
            chunks: 0,
            first_token_at: None,
        }
    }

    pub fn push(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        if self.first_token_at.is_none() {
            self.first_token_at = Some(Instant::now());
        }
        self.text.push_str(delta);
        self.chunks += 1;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn first_token_latency_ms(&self) -> Option<u64> {
        self.first_token_at
            .map(|at| at.duration_since(self.dispatched_at).as_millis() as u64)
    }

    pub fn finish(
        self,
        finish_reason: Option<String>,
        input_tokens: u64,
        request_snapshot: Value,
    ) -> CompletionMetrics {
        let first_token_latency_ms = self.first_token_latency_ms();
        let response_snapshot = json!({
            "content": self.text,
            "finish_reason": finish_reason,
            "chunks": self.chunks,
        });
        CompletionMetrics {
            output_tokens: estimate_tokens(&self.text),
            response_text: self.text,
            input_tokens,
            finish_reason,
            first_token_latency_ms,
            chunk_count: self.chunks,
            request_snapshot,
            response_snapshot,
            completed_at: Utc::now(),
        }
    }
}
