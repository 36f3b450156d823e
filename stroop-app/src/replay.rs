use crate::config::AppConfig;
use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use stroop_relay::{
    ChatRequest, InteractionContext, InteractionStore, JsonlInteractionStore, ProviderChunk,
    ProviderStream, StreamingRelay, sse_frames,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// One line of a recorded provider transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptLine {
    Request(ChatRequest),
    Chunk(ProviderChunk),
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub request: ChatRequest,
    pub items: Vec<TranscriptItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptItem {
    Chunk(ProviderChunk),
    Error(String),
}

impl Transcript {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut request = None;
        let mut items = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parsed: TranscriptLine = serde_json::from_str(line)
                .with_context(|| format!("transcript line {} is not valid", idx + 1))?;
            match parsed {
                TranscriptLine::Request(r) => {
                    if request.replace(r).is_some() {
                        bail!("transcript line {}: second request", idx + 1);
                    }
                }
                TranscriptLine::Chunk(chunk) => items.push(TranscriptItem::Chunk(chunk)),
                TranscriptLine::Error { message } => items.push(TranscriptItem::Error(message)),
            }
        }
        let request = request.context("transcript has no request line")?;
        Ok(Self { request, items })
    }

    /// Plays the recorded items back as a provider stream.
    pub fn into_stream(self, delay: Duration) -> (ChatRequest, ProviderStream) {
        let items = self.items;
        let stream = async_stream::stream! {
            for item in items {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match item {
                    TranscriptItem::Chunk(chunk) => yield Ok(chunk),
                    TranscriptItem::Error(message) => yield Err(anyhow::anyhow!(message)),
                }
            }
        };
        (self.request, Box::pin(stream))
    }
}

pub async fn run(
    config: &AppConfig,
    transcript: &Path,
    log: Option<PathBuf>,
    delay_ms: u64,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(transcript)
        .await
        .with_context(|| format!("failed to read transcript {}", transcript.display()))?;
    let transcript = Transcript::parse(&raw)?;
    let store = Arc::new(JsonlInteractionStore::new(
        log.unwrap_or_else(|| config.interactions_path.clone()),
    ));
    let context = InteractionContext {
        user_id: config.participant.user_id.clone(),
        session_id: config
            .participant
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        task_id: None,
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling replay");
            on_signal.cancel();
        }
    });

    let mut stdout = tokio::io::stdout();
    relay_to(
        transcript,
        store,
        context,
        cancel,
        Duration::from_millis(delay_ms),
        &mut stdout,
    )
    .await
}

/// Relays a transcript, writing each wire frame as soon as it is produced.
pub async fn relay_to<W: AsyncWrite + Unpin>(
    transcript: Transcript,
    store: Arc<dyn InteractionStore>,
    context: InteractionContext,
    cancel: CancellationToken,
    delay: Duration,
    out: &mut W,
) -> Result<()> {
    let (request, upstream) = transcript.into_stream(delay);
    let events = StreamingRelay::new(store, context)
        .with_cancellation(cancel)
        .relay(request, upstream);
    let mut frames = sse_frames(events);
    while let Some(frame) = frames.next().await {
        out.write_all(frame.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}
