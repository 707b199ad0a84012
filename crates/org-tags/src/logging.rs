use crate::config::LoggingConfig;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "org-tags.log";

/// Install the global tracing subscriber.
///
/// Console output always goes to stderr. When `config.directory` is set, a daily rolling file
/// is written there too; keep the returned guard alive or buffered lines are lost on exit.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, anyhow::Error> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&config.level))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

	let (file_layer, guard) = match &config.directory {
		Some(directory) => {
			std::fs::create_dir_all(directory)?;
			let (writer, guard) = tracing_appender::non_blocking(
				tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX),
			);
			let layer = fmt::layer()
				.with_writer(writer)
				.with_ansi(false)
				.with_target(true)
				.with_line_number(true);
			(Some(layer), Some(guard))
		}
		None => (None, None),
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(console_layer)
		.with(file_layer)
		.try_init()?;

	Ok(guard)
}
