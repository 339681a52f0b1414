//! Logging setup for the code generator binary.
//!
//! Log output always goes to stderr so generated source written to stdout is
//! never interleaved with log lines. `RUST_LOG` overrides the default level.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for generator logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit one JSON object per event instead of human-readable text.
    pub json_format: bool,
    /// Level used when RUST_LOG is not set.
    pub default_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::INFO,
        }
    }
}

impl LoggingConfig {
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_level.to_string()))
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(config: LoggingConfig) {
    let filter = config.filter();

    if config.json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CaptureWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CaptureWriter {
        fn output(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
        }
    }

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert!(!config.json_format);
        assert_eq!(config.default_level, Level::INFO);

        assert!(LoggingConfig::json().json_format);
        assert!(!LoggingConfig::text().json_format);
        assert_eq!(
            LoggingConfig::text().with_level(Level::DEBUG).default_level,
            Level::DEBUG
        );
    }

    #[test]
    fn test_generator_events_are_json_formatted() {
        let writer = CaptureWriter::default();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("trace"))
            .with(fmt::layer().json().with_writer(writer.clone()).with_target(true));

        tracing::subscriber::with_default(subscriber, || {
            let model = fluentfga_schema::AuthorizationModel::new("1.1");
            crate::generate(&model, &crate::AccessorPolicy::default()).unwrap();
        });

        let output = writer.output();
        assert!(!output.is_empty());
        for line in output.lines().filter(|l| !l.is_empty()) {
            let json: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(json.get("level").is_some());
            assert!(json.get("target").is_some());
        }
        assert!(output.contains("Generated entity types"));
    }
}
