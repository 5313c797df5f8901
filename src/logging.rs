use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keep this alive for as long as file logging should flush.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn file_logging_enabled() -> bool {
    std::env::var("AIDAS_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Installs the tracing subscriber: stdout always, plus a daily rolling
/// file appender when `AIDAS_FILE_LOGS` is set.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    if file_logging_enabled() {
        let log_dir = std::env::var("AIDAS_LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        match std::fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let file_appender =
                    RollingFileAppender::new(Rotation::DAILY, &log_dir, "engine.log");
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(stdout_layer)
                    .with(file_layer)
                    .init();

                return Some(FileLogGuard { _guard: guard });
            }
            Err(err) => {
                eprintln!("failed to create log directory {log_dir}: {err}");
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();

    None
}
