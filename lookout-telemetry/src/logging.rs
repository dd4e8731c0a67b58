//! ## lookout-telemetry::logging
//! **Structured logging with tracing and OpenTelemetry attributes**
//!
//! ### Expectations:
//! - One subscriber per process, installed by the binary
//! - `RUST_LOG` overrides the configured level
//! - Security events (committed cycles, attack verdicts) carry `KeyValue` metadata

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Install the global subscriber. Returns an error if one is already set.
    pub fn init(
        level: &str,
        thread_names: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
            )
            .with_thread_names(thread_names)
            .with_span_events(FmtSpan::ENTER)
            .try_init()
    }

    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "security_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(
                metadata = ?metadata,
                "Security event occurred"
            );
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn security_event_is_logged_with_metadata() {
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(EventLogger::log_event(
                "cycle_committed",
                vec![
                    KeyValue::new("artifact", "capture_2024-03-09_14-05-07.pcap"),
                    KeyValue::new("attack_flows", 1_i64),
                ],
            ));
        assert!(logs_contain("Security event occurred"));
        assert!(logs_contain("capture_2024-03-09_14-05-07.pcap"));
    }
}
