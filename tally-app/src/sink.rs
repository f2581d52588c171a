//! Renders the ranking and writes it to a file and/or the console.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tally_common::{OutputFormat, Result};
use tally_config::OutputSettings;
use tally_web::count::RankedEntry;

/// Text output is one `"{rank}. {word} --- {count}"` line per entry.
pub fn render(entries: &[RankedEntry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(entries.iter().map(|e| format!("{e}\n")).collect()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(entries).map_err(io::Error::other)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Write the rendering to `output.file` (if set) and to stdout (if
/// `output.show`). Returns the file written.
pub fn write_results(entries: &[RankedEntry], output: &OutputSettings) -> Result<Option<PathBuf>> {
    let rendered = render(entries, output.format)?;

    let written = match &output.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &rendered)?;
            tracing::debug!(path = %path.display(), bytes = rendered.len(), "sink.file_written");
            Some(path.clone())
        }
        None => None,
    };

    if output.show {
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
    }

    Ok(written)
}
