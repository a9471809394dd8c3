use chrono::Utc;
use slog::Drain;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

pub fn create_root_logger_for_stdout(replica: &str) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stdout().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("replica" => replica.to_string()))
}

/// Logs to a new `replset_sidecar_<UTC timestamp>.log` in `directory`, which must exist.
pub fn create_root_logger_for_file(directory: &Path, replica: &str) -> io::Result<slog::Logger> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_file_path(directory))?;

    let decorator = slog_term::PlainDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok(slog::Logger::root(drain, slog::o!("replica" => replica.to_string())))
}

fn log_file_path(directory: &Path) -> PathBuf {
    let now = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
    directory.join(format!("replset_sidecar_{}.log", now))
}
