use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tally_common::observability::{LogConfig, LogFormat};
use tempfile::TempDir;

static LOG_DIR: OnceLock<TempDir> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Install debug-level tracing once per test binary, logging into a
/// throwaway directory. Returns the log file path.
pub fn init_test_tracing() -> &'static Path {
    LOG_PATH.get_or_init(|| {
        let dir = LOG_DIR.get_or_init(|| {
            tempfile::Builder::new()
                .prefix("wordtally-tests")
                .tempdir()
                .expect("temp log dir")
        });
        let config = LogConfig {
            app_name: "wordtally-tests",
            log_dir: Some(dir.path().to_path_buf()),
            emit_stderr: true,
            format: if std::env::var("TALLY_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
        };

        tally_common::observability::init_logging(config).unwrap_or_default()
    })
}
