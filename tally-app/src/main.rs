use anyhow::Result;
use clap::Parser;
use tally_app::cli::Cli;
use tally_app::pipeline::{build_fetcher, run};
use tally_common::observability::{LogConfig, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Env wins over file; flags win over both.
    let cfg = cli.load_config()?;

    init_logging(LogConfig {
        app_name: "wordtally",
        log_dir: cfg.log.dir.clone(),
        emit_stderr: cfg.log.stderr || cli.verbose,
        format: cfg.log.format,
        default_filter: cfg.log.filter.clone(),
    })?;

    let settings = cli.into_settings(&cfg)?;
    let fetcher = build_fetcher(&cfg.fetch)?;

    run(&fetcher, &settings).await?;
    Ok(())
}
