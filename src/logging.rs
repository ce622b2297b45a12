//! Tracing subscriber setup.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Logs always go to stderr and,
/// when a directory is configured, to a daily-rolling file as well. Keep
/// the returned guard alive for the life of the process or buffered file
/// output is lost.
pub fn init(config: &LoggingConfig, default_filter: &str) -> Option<WorkerGuard> {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
  let stderr = fmt::layer().with_writer(std::io::stderr);

  match &config.file_dir {
    Some(dir) => {
      let appender = tracing_appender::rolling::daily(dir, "arcfinder.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
      Some(guard)
    }
    None => {
      tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .init();
      None
    }
  }
}
