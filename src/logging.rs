// Logging setup for binaries embedding the engine. The library itself only talks to
// the `log` facade; whoever owns `main` decides where records go.

use std::path::Path;

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};

/// Starts a logger at `base_level` (overridable through `RUST_LOG`). With a
/// `log_dir`, records go to rotating files there and warnings are also echoed to
/// stderr; without one, everything goes to stderr.
///
/// The returned handle must be kept alive for as long as logging is wanted.
pub fn setup_logging(
    base_level: &str,
    log_dir: Option<&Path>,
) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(base_level)?;
    let logger = match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir))
            .duplicate_to_stderr(Duplicate::Warn)
            .rotate(
                Criterion::Size(1024 * 1024), //1MB
                Naming::Timestamps,
                Cleanup::KeepLogFiles(5),
            ),
        None => logger.log_to_stderr(),
    };
    logger.start()
}
