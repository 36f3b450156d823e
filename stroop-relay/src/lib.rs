pub mod error;
pub mod event;
pub mod metrics;
pub mod provider;
pub mod relay;
pub mod store;

pub use error::{RelayError, StoreError};
pub use event::{SseDecoder, StreamEvent, sse_frames};
pub use metrics::{
    CompletionLatch, CompletionMetrics, ResponseCollector, estimate_message_tokens, estimate_tokens,
};
pub use provider::{ChatMessage, ChatRequest, ChatRole, ProviderChunk, ProviderStream};
pub use relay::{RelayStream, StreamingRelay};
pub use store::{
    InteractionContext, InteractionRecord, InteractionStore, JsonlInteractionStore,
    MemoryInteractionStore,
};
