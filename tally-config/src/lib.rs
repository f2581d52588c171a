//! `wordtally` settings, read from YAML and overridden from the environment.
//!
//! `TALLY__COUNT__TOP=25` sets `count.top`. String values may reference
//! other variables as `${VAR}`. Every field has a default, so an empty
//! document is a valid configuration:
//!
//! ```yaml
//! fetch:
//!   timeout_secs: 15
//!   retries: 0
//! count:
//!   top: 10
//!   count_head: false
//! output:
//!   file: result.txt
//!   show: false
//!   format: text
//! log:
//!   dir: ~/.local/share/wordtally
//!   stderr: false
//!   format: text
//!   filter: info
//! ```
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tally_common::OutputFormat;
use tally_common::observability::LogFormat;

const MAX_EXPANSION_PASSES: usize = 8;
const ENV_PREFIX: &str = "TALLY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TallyConfig {
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub count: CountSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// HTTP fetch tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Retries for 429/5xx and transport errors; zero means a single attempt.
    pub retries: usize,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            connect_timeout_secs: 5,
            retries: 0,
            user_agent: concat!("wordtally/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CountSettings {
    /// Number of ranked words to report; `-1` reports every word.
    pub top: i64,
    /// Scrub the `<head>` region before the remaining passes.
    pub count_head: bool,
}

impl Default for CountSettings {
    fn default() -> Self {
        Self {
            top: 10,
            count_head: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Destination file; `null` disables file output.
    pub file: Option<PathBuf>,
    pub show: bool,
    pub format: OutputFormat,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("result.txt")),
            show: false,
            format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: Option<PathBuf>,
    pub stderr: bool,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            stderr: false,
            format: LogFormat::Text,
            filter: "info".into(),
        }
    }
}

fn expand_placeholders(value: &mut Value) {
    match value {
        Value::String(s) if s.contains('$') => *s = expand_str(s),
        Value::Array(items) => items.iter_mut().for_each(expand_placeholders),
        Value::Object(map) => map.values_mut().for_each(expand_placeholders),
        _ => {}
    }
}

/// Re-expand until nothing changes or the pass limit is hit. Unknown
/// variables are left in place.
fn expand_str(raw: &str) -> String {
    let mut current = raw.to_owned();
    for _ in 0..MAX_EXPANSION_PASSES {
        match shellexpand::env(&current) {
            Ok(next) if next != current => current = next.into_owned(),
            _ => break,
        }
    }
    current
}

/// Collects config sources in precedence order; later sources win.
pub struct TallyConfigLoader {
    builder: ConfigBuilder<DefaultState>,
}

impl Default for TallyConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TallyConfigLoader {
    /// No sources yet. `TALLY__` variables are always applied by [`load`](Self::load).
    ///
    /// ```
    /// use tally_config::TallyConfigLoader;
    ///
    /// let config = TallyConfigLoader::new()
    ///     .with_yaml_str("count:\n  top: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.count.top, 3);
    /// assert_eq!(config.fetch.retries, 0);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// A file that must exist. The format follows the extension.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.file(path.as_ref(), true)
    }

    /// A file that is skipped when missing.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.file(path.as_ref(), false)
    }

    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    fn file(mut self, path: &Path, required: bool) -> Self {
        self.builder = self.builder.add_source(File::from(path).required(required));
        self
    }

    /// Merge everything, with `TALLY__SECTION__KEY` variables on top, then
    /// expand `${VAR}` in string values.
    ///
    /// ```
    /// use tally_config::TallyConfigLoader;
    ///
    /// unsafe { std::env::set_var("TALLY_DOC_OUT", "/tmp/ranking.txt"); }
    ///
    /// let config = TallyConfigLoader::new()
    ///     .with_yaml_str("output:\n  file: \"${TALLY_DOC_OUT}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(
    ///     config.output.file.as_deref(),
    ///     Some(std::path::Path::new("/tmp/ranking.txt"))
    /// );
    ///
    /// unsafe { std::env::remove_var("TALLY_DOC_OUT"); }
    /// ```
    pub fn load(self) -> Result<TallyConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut merged: Value = cfg.try_deserialize()?;
        expand_placeholders(&mut merged);
        // Env values arrive as strings; the second pass coerces them per field type.
        Config::try_from(&merged)?.try_deserialize()
    }
}
