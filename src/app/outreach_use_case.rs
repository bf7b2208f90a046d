use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app::ports::TextGenerator;
use crate::config::{GenerationBackend, GenerationConfig};
use crate::infra::{GeminiGenerator, TemplateGenerator};
use crate::types::Record;

/// Writes outreach text for one record at a time.
///
/// The live backend gets up to `max_attempts` tries with exponential
/// backoff; after that the deterministic template is used, so `write`
/// always produces text.
pub struct OutreachWriter {
    live: Option<Arc<dyn TextGenerator>>,
    fallback: TemplateGenerator,
    max_attempts: u32,
    retry_base: Duration,
}

impl OutreachWriter {
    pub fn new(live: Option<Arc<dyn TextGenerator>>, max_attempts: u32, retry_base: Duration) -> Self {
        Self {
            live,
            fallback: TemplateGenerator,
            max_attempts: max_attempts.max(1),
            retry_base,
        }
    }

    pub fn templates_only() -> Self {
        Self::new(None, 1, Duration::ZERO)
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        let live: Option<Arc<dyn TextGenerator>> = match config.backend {
            GenerationBackend::Template => None,
            GenerationBackend::Gemini => match GeminiGenerator::new(config) {
                Ok(generator) => Some(Arc::new(generator)),
                Err(e) => {
                    warn!("Live generation unavailable, using templates: {}", e);
                    None
                }
            },
        };
        Self::new(
            live,
            config.max_attempts,
            Duration::from_millis(config.retry_base_ms),
        )
    }

    pub fn backend_name(&self) -> &'static str {
        self.live
            .as_ref()
            .map(|g| g.name())
            .unwrap_or_else(|| self.fallback.name())
    }

    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1) plus up to half a base of jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.retry_base.as_millis() as u64;
        let exp = base.saturating_mul(1u64 << (attempt - 1).min(16));
        let jitter = rand::thread_rng().gen_range(0..=base / 2);
        Duration::from_millis(exp + jitter)
    }

    pub async fn write(&self, record: &Record) -> String {
        if let Some(live) = &self.live {
            for attempt in 1..=self.max_attempts {
                match live.generate(record).await {
                    Ok(text) => return text,
                    Err(e) if attempt < self.max_attempts => {
                        let delay = self.backoff(attempt);
                        debug!(
                            "Attempt {}/{} for record {} failed: {}; retrying in {:?}",
                            attempt, self.max_attempts, record.id, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        warn!(
                            "{} failed for record {} after {} attempts, using template: {}",
                            live.name(),
                            record.id,
                            attempt,
                            e
                        );
                    }
                }
            }
        }
        self.fallback.render(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationFailure;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        calls: AtomicU32,
        succeed_on: u32,
    }

    #[async_trait]
    impl TextGenerator for Flaky {
        async fn generate(&self, _record: &Record) -> Result<String, GenerationFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok("live text".to_string())
            } else {
                Err(GenerationFailure::EmptyResponse)
            }
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn writer(succeed_on: u32, attempts: u32) -> (Arc<Flaky>, OutreachWriter) {
        let live = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            succeed_on,
        });
        let writer = OutreachWriter::new(Some(live.clone()), attempts, Duration::ZERO);
        (live, writer)
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let (live, writer) = writer(2, 3);
        assert_eq!(writer.write(&Record::new("r")).await, "live text");
        assert_eq!(live.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fall_back_to_template() {
        let (live, writer) = writer(u32::MAX, 2);
        let record = Record::new("r").with_field("company_name", "A社");
        assert_eq!(writer.write(&record).await, TemplateGenerator.render(&record));
        assert_eq!(live.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_from_config_without_key_uses_templates() {
        let config = GenerationConfig {
            backend: GenerationBackend::Gemini,
            ..GenerationConfig::default()
        };
        assert_eq!(OutreachWriter::from_config(&config).backend_name(), "template");
    }

    #[test]
    fn test_backoff_grows() {
        let writer = OutreachWriter::new(None, 3, Duration::from_millis(100));
        let first = writer.backoff(1);
        let second = writer.backoff(2);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
        assert!(second >= Duration::from_millis(200) && second <= Duration::from_millis(250));
    }
}
