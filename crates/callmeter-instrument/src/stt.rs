use async_trait::async_trait;
use callmeter_collector::MetricsCollector;
use callmeter_types::MetricKind;
use std::ops::Deref;
use std::sync::Arc;

use crate::chunk::ChunkText;
use crate::estimate::Estimators;
use crate::observer::{AsrObserver, MetricObserver};
use crate::stream::{ChunkStream, ObservedStream};

/// A streaming speech recognition client.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Audio handed to the recognizer (a buffer, a frame stream, a URL).
    type Input: Send + 'static;
    type Transcript: ChunkText + Send + 'static;
    type Error: Send + 'static;

    fn model_name(&self) -> &str;

    fn language(&self) -> &str;

    async fn recognize(
        &self,
        input: Self::Input,
    ) -> Result<ChunkStream<Self::Transcript, Self::Error>, Self::Error>;
}

/// Wraps a [`SpeechRecognizer`] and records one ASR metric per request.
pub struct MeteredStt<S> {
    inner: S,
    collector: Option<Arc<MetricsCollector>>,
    estimators: Estimators,
}

impl<S: SpeechRecognizer> MeteredStt<S> {
    pub fn new(inner: S, collector: Option<Arc<MetricsCollector>>) -> Self {
        if collector.is_none() {
            tracing::debug!(model = inner.model_name(), "asr metrics disabled, passing through");
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

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Deref for MeteredStt<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: SpeechRecognizer> SpeechRecognizer for MeteredStt<S> {
    type Input = S::Input;
    type Transcript = S::Transcript;
    type Error = S::Error;

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn language(&self) -> &str {
        self.inner.language()
    }

    async fn recognize(
        &self,
        input: Self::Input,
    ) -> Result<ChunkStream<Self::Transcript, Self::Error>, Self::Error> {
        let Some(collector) = self
            .collector
            .as_ref()
            .filter(|c| c.collects(MetricKind::Asr))
        else {
            return self.inner.recognize(input).await;
        };

        let mut observer = AsrObserver::new(
            collector.clone(),
            self.estimators,
            self.inner.model_name(),
            self.inner.language(),
        );
        observer.start_timer();
        let stream = self.inner.recognize(input).await?;
        Ok(Box::pin(ObservedStream::new(stream, observer)))
    }
}
