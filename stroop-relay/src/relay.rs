use crate::error::RelayError;
use crate::event::StreamEvent;
use crate::metrics::{CompletionLatch, CompletionMetrics, ResponseCollector, estimate_message_tokens};
use crate::provider::{ChatRequest, ProviderStream};
use crate::store::{InteractionContext, InteractionStore};
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub type RelayStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, RelayError>> + Send + 'static>>;

/// Relays one streaming chat completion to a client.
///
/// The returned stream yields a `Token` per non-empty provider delta and a
/// single `Done` once the provider finishes (or simply ends). A provider
/// error ends the stream with an `Err` item instead. Metrics are reported to
/// the interaction store at most once, before `Done` is yielded, and never
/// after cancellation.
pub struct StreamingRelay {
    store: Arc<dyn InteractionStore>,
    context: InteractionContext,
    cancel: CancellationToken,
}

impl StreamingRelay {
    pub fn new(store: Arc<dyn InteractionStore>, context: InteractionContext) -> Self {
        Self {
            store,
            context,
            cancel: CancellationToken::new(),
        }
    }

    /// Ties the relay to an externally owned token, e.g. the request's.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn relay(self, request: ChatRequest, upstream: ProviderStream) -> RelayStream {
        let Self {
            store,
            context,
            cancel,
        } = self;
        let dispatched_at = Instant::now();
        let input_tokens = estimate_message_tokens(&request.messages);
        let request_snapshot = serde_json::to_value(&request).unwrap_or(Value::Null);
        let latch = CompletionLatch::new();

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            input_tokens,
            "relaying chat completion"
        );

        Box::pin(async_stream::stream! {
            let mut upstream = upstream;
            let mut collector = ResponseCollector::new(dispatched_at);

            loop {
                let next = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    item = upstream.next() => Some(item),
                };
                let Some(item) = next else {
                    tracing::debug!("relay cancelled by caller");
                    break;
                };
                if cancel.is_cancelled() {
                    break;
                }

                let finish_reason = match item {
                    Some(Ok(chunk)) => {
                        if !chunk.delta.is_empty() {
                            collector.push(&chunk.delta);
                            yield Ok(StreamEvent::Token { text: chunk.delta });
                        }
                        match chunk.finish_reason {
                            Some(reason) => Some(reason),
                            None => continue,
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "upstream chat stream failed");
                        yield Err(RelayError::Upstream(e));
                        break;
                    }
                    None => {
                        tracing::debug!("upstream ended without a finish reason");
                        None
                    }
                };

                if cancel.is_cancelled() {
                    break;
                }
                if latch.claim() {
                    let metrics = collector.finish(finish_reason, input_tokens, request_snapshot);
                    report(store.as_ref(), &metrics, &context).await;
                }
                if !cancel.is_cancelled() {
                    yield Ok(StreamEvent::Done);
                }
                break;
            }
        })
    }
}

async fn report(store: &dyn InteractionStore, metrics: &CompletionMetrics, context: &InteractionContext) {
    tracing::info!(
        session_id = %context.session_id,
        input_tokens = metrics.input_tokens,
        output_tokens = metrics.output_tokens,
        latency_ms = ?metrics.first_token_latency_ms,
        finish_reason = ?metrics.finish_reason,
        "chat completion finished"
    );
    if let Err(e) = store.record(metrics, context).await {
        tracing::warn!(error = %e, "failed to record chat interaction");
    }
}
