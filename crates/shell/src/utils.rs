//! Logger setup for the CLI.

use std::path::{Path, PathBuf};

use ftlog::{
    appender::{FileAppender, Period},
    LevelFilter, LoggerGuard,
};

/// Starts the ftlog logger, writing to `<out_dir>/logs/phylome.log` with
/// daily rotation. The returned guard flushes pending records when
/// dropped, so it must stay alive for the whole run.
///
/// # Errors
///
/// - If the logs directory cannot be created.
/// - If a logger was already installed.
pub fn init_logging(out_dir: &Path) -> Result<(LoggerGuard, PathBuf), String> {
    let logs_dir = out_dir.join("logs");
    std::fs::create_dir_all(&logs_dir).map_err(|e| format!("Failed to create {logs_dir:?}: {e}"))?;
    let log_path = logs_dir.join("phylome.log");

    let appender = FileAppender::builder().path(&log_path).rotate(Period::Day).build();
    let guard = ftlog::Builder::new()
        .max_log_level(LevelFilter::Info)
        .root(appender)
        .try_init()
        .map_err(|e| format!("Failed to initialize the logger: {e}"))?;

    Ok((guard, log_path))
}
