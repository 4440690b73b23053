//! Background source cleanup

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use pulse_config::SourcesConfig;

use crate::pipeline::Pipeline;

/// Periodically drop sources idle beyond `idle_timeout`
pub fn spawn_source_cleanup(
    pipeline: Arc<Pipeline>,
    config: &SourcesConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let every = config.cleanup_interval.max(Duration::from_millis(10));
    let idle_timeout =
        chrono::Duration::from_std(config.idle_timeout).unwrap_or(chrono::Duration::MAX);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = pipeline.cleanup_idle_sources(Utc::now(), idle_timeout).await;
                    if removed > 0 {
                        info!(removed, "Idle sources removed");
                    }
                }
            }
        }
        debug!("Source cleanup stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::harness;
    use pulse_config::IngestConfig;
    use serde_json::json;

    #[tokio::test]
    async fn test_idle_sources_swept() {
        let h = harness(IngestConfig::default()).await;
        h.pipeline
            .submit_log(json!({"message": "m", "level": "info"}), Some("web"))
            .await
            .unwrap();

        let config = SourcesConfig {
            idle_timeout: Duration::ZERO,
            cleanup_interval: Duration::from_millis(20),
        };
        let cancel = CancellationToken::new();
        let handle = spawn_source_cleanup(Arc::clone(&h.pipeline), &config, cancel.clone());

        tokio::time::sleep(Duration::from_millis(200)).await;

        cancel.cancel();
        handle.await.unwrap();
        assert!(h.pipeline.sources().is_empty());
    }
}
