use futures_util::StreamExt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use stroop_relay::{
    ChatMessage, ChatRequest, CompletionMetrics, InteractionContext, InteractionStore,
    MemoryInteractionStore, ProviderChunk, ProviderStream, RelayError, SseDecoder, StoreError,
    StreamEvent, StreamingRelay, sse_frames,
};

fn request() -> ChatRequest {
    ChatRequest::new(
        "gpt-4o-mini",
        vec![
            ChatMessage::system("You are a helpful travel assistant."),
            ChatMessage::user("What colour is the sky?"),
        ],
    )
}

fn context() -> InteractionContext {
    InteractionContext {
        user_id: "participant-7".into(),
        session_id: "session-42".into(),
        task_id: None,
    }
}

fn scripted(chunks: Vec<ProviderChunk>) -> ProviderStream {
    Box::pin(futures_util::stream::iter(chunks.into_iter().map(Ok)))
}

fn sky_deltas() -> Vec<ProviderChunk> {
    vec![
        ProviderChunk::text("The"),
        ProviderChunk::text(" sky"),
        ProviderChunk::text(" is"),
        ProviderChunk::text(" blue"),
        ProviderChunk::finished("stop"),
    ]
}

async fn collect(
    store: Arc<MemoryInteractionStore>,
    upstream: ProviderStream,
) -> Vec<Result<StreamEvent, RelayError>> {
    StreamingRelay::new(store, context())
        .relay(request(), upstream)
        .collect()
        .await
}

#[tokio::test]
async fn tokens_arrive_in_order_then_one_done() {
    let store = Arc::new(MemoryInteractionStore::new());
    let events: Vec<StreamEvent> = collect(store.clone(), scripted(sky_deltas()))
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(
        events,
        vec![
            StreamEvent::token("The"),
            StreamEvent::token(" sky"),
            StreamEvent::token(" is"),
            StreamEvent::token(" blue"),
            StreamEvent::Done,
        ]
    );

    let records = store.records().await;
    assert_eq!(records.len(), 1);
    let metrics = &records[0].metrics;
    assert_eq!(metrics.response_text, "The sky is blue");
    assert_eq!(metrics.finish_reason.as_deref(), Some("stop"));
    // 35 chars -> 9, 23 chars -> 6
    assert_eq!(metrics.input_tokens, 15);
    assert_eq!(metrics.output_tokens, 4);
    assert_eq!(metrics.chunk_count, 4);
    assert_eq!(metrics.request_snapshot["model"], "gpt-4o-mini");
    assert_eq!(metrics.response_snapshot["content"], "The sky is blue");
}

#[tokio::test]
async fn missing_finish_reason_still_completes_once() {
    let store = Arc::new(MemoryInteractionStore::new());
    let upstream = scripted(vec![ProviderChunk::text("Hello"), ProviderChunk::text("!")]);
    let events = collect(store.clone(), upstream).await;

    assert_eq!(events.len(), 3);
    assert!(matches!(events.last(), Some(Ok(StreamEvent::Done))));

    let records = store.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metrics.response_text, "Hello!");
    assert_eq!(records[0].metrics.finish_reason, None);
}

#[tokio::test]
async fn upstream_error_is_terminal_and_unrecorded() {
    let store = Arc::new(MemoryInteractionStore::new());
    let upstream: ProviderStream = Box::pin(futures_util::stream::iter(vec![
        Ok(ProviderChunk::text("Partial")),
        Err(anyhow::anyhow!("connection reset by peer")),
        Ok(ProviderChunk::finished("stop")),
    ]));
    let events = collect(store.clone(), upstream).await;

    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Ok(StreamEvent::Token { text }) if text == "Partial"));
    assert!(matches!(&events[1], Err(RelayError::Upstream(_))));
    assert!(store.records().await.is_empty());
}

#[tokio::test]
async fn nothing_is_consumed_after_finish() {
    let store = Arc::new(MemoryInteractionStore::new());
    let overread = Arc::new(AtomicBool::new(false));
    let flag = overread.clone();
    let upstream: ProviderStream = Box::pin(async_stream::stream! {
        yield Ok(ProviderChunk::text("Done"));
        yield Ok(ProviderChunk {
            delta: ".".into(),
            finish_reason: Some("stop".into()),
        });
        flag.store(true, Ordering::SeqCst);
        yield Ok(ProviderChunk::text("ignored"));
    });

    let events = collect(store.clone(), upstream).await;
    assert_eq!(events.len(), 3);
    assert!(!overread.load(Ordering::SeqCst));
    assert_eq!(store.records().await[0].metrics.response_text, "Done.");
}

#[tokio::test]
async fn finish_without_tokens_has_no_latency() {
    let store = Arc::new(MemoryInteractionStore::new());
    let upstream = scripted(vec![ProviderChunk::text(""), ProviderChunk::finished("length")]);
    let events = collect(store.clone(), upstream).await;

    assert_eq!(events.len(), 1);
    let records = store.records().await;
    assert_eq!(records[0].metrics.first_token_latency_ms, None);
    assert_eq!(records[0].metrics.output_tokens, 0);
}

#[tokio::test(start_paused = true)]
async fn latency_measures_first_nonempty_token() {
    let store = Arc::new(MemoryInteractionStore::new());
    let upstream: ProviderStream = Box::pin(async_stream::stream! {
        tokio::time::sleep(Duration::from_millis(50)).await;
        yield Ok(ProviderChunk::text(""));
        tokio::time::sleep(Duration::from_millis(70)).await;
        yield Ok(ProviderChunk::text("Hi"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        yield Ok(ProviderChunk::finished("stop"));
    });
    collect(store.clone(), upstream).await;

    let records = store.records().await;
    assert_eq!(records[0].metrics.first_token_latency_ms, Some(120));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_events_and_metrics() {
    let store = Arc::new(MemoryInteractionStore::new());
    let relay = StreamingRelay::new(store.clone(), context());
    let cancel = relay.cancellation_token();
    let upstream: ProviderStream = Box::pin(async_stream::stream! {
        yield Ok(ProviderChunk::text("One"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        yield Ok(ProviderChunk::text(" two"));
        yield Ok(ProviderChunk::finished("stop"));
    });

    let mut stream = relay.relay(request(), upstream);
    assert_eq!(stream.next().await.unwrap().unwrap(), StreamEvent::token("One"));
    cancel.cancel();
    assert!(stream.next().await.is_none());
    assert!(store.records().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_a_pending_read() {
    let store = Arc::new(MemoryInteractionStore::new());
    let cancel = tokio_util::sync::CancellationToken::new();
    let relay = StreamingRelay::new(store.clone(), context()).with_cancellation(cancel.clone());
    let upstream: ProviderStream = Box::pin(async_stream::stream! {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        yield Ok(ProviderChunk::finished("stop"));
    });

    let mut stream = relay.relay(request(), upstream);
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });
    assert!(stream.next().await.is_none());
    canceller.await.unwrap();
    assert!(store.records().await.is_empty());
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let store = Arc::new(MemoryInteractionStore::new());
    let first = collect(store.clone(), scripted(sky_deltas()));
    let second = collect(
        store.clone(),
        scripted(vec![ProviderChunk::text("Retry"), ProviderChunk::finished("stop")]),
    );
    let (a, b) = tokio::join!(first, second);
    assert_eq!(a.len(), 5);
    assert_eq!(b.len(), 2);

    let mut texts: Vec<String> = store
        .records()
        .await
        .into_iter()
        .map(|r| r.metrics.response_text)
        .collect();
    texts.sort();
    assert_eq!(texts, vec!["Retry".to_string(), "The sky is blue".to_string()]);
}

struct RejectingStore;

impl InteractionStore for RejectingStore {
    fn record<'a>(
        &'a self,
        _metrics: &'a CompletionMetrics,
        _context: &'a InteractionContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async { Err(StoreError::Unavailable("database offline".into())) })
    }
}

#[tokio::test]
async fn store_failure_does_not_break_the_stream() {
    let events: Vec<_> = StreamingRelay::new(Arc::new(RejectingStore), context())
        .relay(request(), scripted(sky_deltas()))
        .collect()
        .await;
    assert_eq!(events.len(), 5);
    assert!(matches!(events.last(), Some(Ok(StreamEvent::Done))));
}

#[tokio::test]
async fn wire_output_round_trips_through_decoder() {
    let store = Arc::new(MemoryInteractionStore::new());
    let events = StreamingRelay::new(store, context()).relay(request(), scripted(sky_deltas()));
    let wire: String = sse_frames(events).collect::<Vec<_>>().await.concat();

    assert!(wire.starts_with("event: token\ndata: \"The\"\n\n"));
    assert!(wire.ends_with("event: token\ndata: \" blue\"\n\nevent: done\n\n"));

    let mut decoder = SseDecoder::new();
    let decoded: Vec<StreamEvent> = decoder
        .feed(&wire)
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let text: String = decoded
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Token { text } => Some(text.as_str()),
            StreamEvent::Done => None,
        })
        .collect();
    assert_eq!(text, "The sky is blue");
    assert_eq!(decoded.last(), Some(&StreamEvent::Done));
}

#[tokio::test]
async fn upstream_error_becomes_error_frame() {
    let store = Arc::new(MemoryInteractionStore::new());
    let upstream: ProviderStream = Box::pin(futures_util::stream::iter(vec![Err(anyhow::anyhow!(
        "503 service unavailable"
    ))]));
    let events = StreamingRelay::new(store, context()).relay(request(), upstream);
    let frames: Vec<String> = sse_frames(events).collect().await;
    assert_eq!(
        frames,
        vec!["event: error\ndata: \"upstream stream failed: 503 service unavailable\"\n\n".to_string()]
    );
}
