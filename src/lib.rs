//! Screen OCR with text reflow.
//!
//! Captures a screen region, recognizes words with Tesseract and turns the noisy word list
//! into clean paragraphs (`reflow`), or hands it to a remote cleanup service.

pub mod config;
pub mod reflow;
pub mod session;
pub mod system;

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Installs the global subscriber. `RUST_LOG` wins over `level`. Logs go to stderr.
pub fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    // A second call (tests, embedding hosts) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
