use async_trait::async_trait;
use callmeter_collector::MetricsCollector;
use callmeter_types::MetricKind;
use std::ops::Deref;
use std::sync::Arc;

use crate::chunk::ChunkText;
use crate::estimate::Estimators;
use crate::observer::{MetricObserver, TtsObserver};
use crate::stream::{ChunkStream, ObservedStream};

/// A streaming speech synthesis client.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    type Audio: ChunkText + Send + 'static;
    type Error: Send + 'static;

    fn model_name(&self) -> &str;

    fn voice_id(&self) -> &str;

    async fn synthesize(&self, text: &str)
        -> Result<ChunkStream<Self::Audio, Self::Error>, Self::Error>;
}

/// Wraps a [`SpeechSynthesizer`] and records one TTS metric per request.
pub struct MeteredTts<T> {
    inner: T,
    collector: Option<Arc<MetricsCollector>>,
    estimators: Estimators,
}

impl<T: SpeechSynthesizer> MeteredTts<T> {
    pub fn new(inner: T, collector: Option<Arc<MetricsCollector>>) -> Self {
        if collector.is_none() {
            tracing::debug!(model = inner.model_name(), "tts metrics disabled, passing through");
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

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for MeteredTts<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: SpeechSynthesizer> SpeechSynthesizer for MeteredTts<T> {
    type Audio = T::Audio;
    type Error = T::Error;

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn voice_id(&self) -> &str {
        self.inner.voice_id()
    }

    async fn synthesize(
        &self,
        text: &str,
    ) -> Result<ChunkStream<Self::Audio, Self::Error>, Self::Error> {
        let Some(collector) = self
            .collector
            .as_ref()
            .filter(|c| c.collects(MetricKind::Tts))
        else {
            return self.inner.synthesize(text).await;
        };

        let mut observer = TtsObserver::new(
            collector.clone(),
            self.estimators,
            self.inner.model_name(),
            self.inner.voice_id(),
            text,
        );
        observer.start_timer();
        let stream = self.inner.synthesize(text).await?;
        Ok(Box::pin(ObservedStream::new(stream, observer)))
    }
}
