use async_trait::async_trait;
use callmeter_collector::MetricsCollector;
use callmeter_types::MetricKind;
use std::ops::Deref;
use std::sync::Arc;

use crate::chunk::{ChunkText, Prompt};
use crate::estimate::Estimators;
use crate::observer::{LlmObserver, MetricObserver};
use crate::stream::{ChunkStream, ObservedStream};

/// Result of a generation: one complete chunk, or a stream of them.
pub enum LlmResponse<C, E> {
    Complete(C),
    Stream(ChunkStream<C, E>),
}

impl<C: std::fmt::Debug, E> std::fmt::Debug for LlmResponse<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(chunk) => f.debug_tuple("Complete").field(chunk).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A chat or completion model client.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    type Chunk: ChunkText + Send + 'static;
    type Error: Send + 'static;

    fn model_name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &Prompt,
    ) -> Result<LlmResponse<Self::Chunk, Self::Error>, Self::Error>;
}

/// Wraps a [`LanguageModel`] and records one LLM metric per successful
/// generation.
pub struct MeteredLlm<L> {
    inner: L,
    collector: Option<Arc<MetricsCollector>>,
    estimators: Estimators,
}

impl<L: LanguageModel> MeteredLlm<L> {
    pub fn new(inner: L, collector: Option<Arc<MetricsCollector>>) -> Self {
        if collector.is_none() {
            tracing::debug!(model = inner.model_name(), "llm metrics disabled, passing through");
        }
        Self {
            inner,
            collector,
            estimators: Estimators::default(),
        }
    }

    pub fn with_estimators(mut self, estimators: Estimators) -> Self {
        self.estimators = estimators;
        self
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn into_inner(self) -> L {
        self.inner
    }

    fn observer(&self, prompt: &Prompt) -> Option<LlmObserver> {
        let collector = self
            .collector
            .as_ref()
            .filter(|c| c.collects(MetricKind::Llm))?;
        Some(LlmObserver::new(
            collector.clone(),
            self.estimators,
            self.inner.model_name(),
            &prompt.text_content(),
        ))
    }
}

impl<L> Deref for MeteredLlm<L> {
    type Target = L;

    fn deref(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LanguageModel> LanguageModel for MeteredLlm<L> {
    type Chunk = L::Chunk;
    type Error = L::Error;

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn generate(
        &self,
        prompt: &Prompt,
    ) -> Result<LlmResponse<Self::Chunk, Self::Error>, Self::Error> {
        let Some(mut observer) = self.observer(prompt) else {
            return self.inner.generate(prompt).await;
        };

        observer.start_timer();
        match self.inner.generate(prompt).await? {
            LlmResponse::Complete(chunk) => {
                let text = chunk.chunk_text().unwrap_or_default();
                observer.observe_completion(text);
                Ok(LlmResponse::Complete(chunk))
            }
            LlmResponse::Stream(stream) => Ok(LlmResponse::Stream(Box::pin(
                ObservedStream::new(stream, observer),
            ))),
        }
    }
}
