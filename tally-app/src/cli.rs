use std::path::PathBuf;

use clap::Parser;
use tally_common::{OutputFormat, Result, TallyError};
use tally_config::{TallyConfig, TallyConfigLoader};
use tally_web::count::TopN;

use crate::pipeline::RunSettings;

const DEFAULT_CONFIG_FILE: &str = "wordtally.yaml";

const LONG_ABOUT: &str = "\
Retrieve a web page and analyze its content by counting the words present on the page.

Examples:
    wordtally -u https://example.com/
    wordtally -u https://example.com/ -o result_file.txt
    wordtally -u https://example.com/ -s -n 3";

#[derive(Debug, Parser)]
#[command(name = "wordtally", version, about, long_about = LONG_ABOUT)]
pub struct Cli {
    /// Web URL.
    #[arg(short = 'u', long, value_name = "url")]
    pub url: String,

    /// Output file path [default: result.txt].
    #[arg(short = 'o', long = "output-file", value_name = "output_file_path")]
    pub output_file: Option<PathBuf>,

    /// Print result to console.
    #[arg(short = 's', long, overrides_with = "no_show")]
    pub show: bool,

    /// Do not print to console, even if the config enables it.
    #[arg(long = "no-show", overrides_with = "show")]
    pub no_show: bool,

    /// Count of top words, -1 (or `all`) for every word [default: 10].
    #[arg(
        short = 'n',
        long = "number-of-words",
        value_name = "count",
        allow_hyphen_values = true
    )]
    pub number_of_words: Option<TopN>,

    /// Scrub the <head> region before counting.
    #[arg(long, overrides_with = "no_count_head")]
    pub count_head: bool,

    /// Keep the <head> region, even if the config scrubs it.
    #[arg(long = "no-count-head", overrides_with = "count_head")]
    pub no_count_head: bool,

    /// Output format: text or json.
    #[arg(long, value_name = "format")]
    pub format: Option<OutputFormat>,

    /// YAML config file [default: ./wordtally.yaml when present].
    #[arg(short = 'c', long, value_name = "path", env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Duplicate logs to stderr.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// An explicit `--config` must exist; the default file is optional.
    pub fn load_config(&self) -> Result<TallyConfig> {
        let loader = match &self.config {
            Some(path) => TallyConfigLoader::new().with_file(path),
            None => TallyConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
        };
        loader.load().map_err(|e| TallyError::Config(e.to_string()))
    }

    /// Overlay command-line values on top of `cfg`.
    pub fn into_settings(self, cfg: &TallyConfig) -> Result<RunSettings> {
        let top = match self.number_of_words {
            Some(top) => top,
            None => TopN::try_from(cfg.count.top).map_err(|e| TallyError::Config(e.to_string()))?,
        };

        let mut output = cfg.output.clone();
        if let Some(file) = self.output_file {
            output.file = Some(file);
        }
        output.show = switch(self.show, self.no_show, output.show);
        if let Some(format) = self.format {
            output.format = format;
        }

        Ok(RunSettings {
            url: self.url,
            top,
            count_head: switch(self.count_head, self.no_count_head, cfg.count.count_head),
            output,
        })
    }
}

/// `--flag` / `--no-flag` pair; the config value stands when neither is given.
fn switch(on: bool, off: bool, configured: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => configured,
    }
}
