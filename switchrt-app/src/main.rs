mod app;
mod cli;
mod logging;

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use switchrt_experiment::{
    AuthService, ExperimentConfig, JsonFileStore, MemoryAuth, ResultStore, export_csv,
};
use tracing::info;

pub use app::App;
use cli::Cli;
use logging::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);

    let config = match &cli.config {
        Some(path) => ExperimentConfig::from_json_file(path)?,
        None => ExperimentConfig::default(),
    };
    let store = JsonFileStore::new(&cli.results);

    if let Some(target) = &cli.export {
        let csv = export_csv(&store.sessions()?);
        if target.as_os_str() == "-" {
            std::io::stdout().write_all(csv.as_bytes())?;
        } else {
            std::fs::write(target, csv)
                .with_context(|| format!("cannot write {}", target.display()))?;
            info!(path = %target.display(), "sessions exported");
        }
        return Ok(());
    }

    let email = cli
        .email
        .context("a participant email is required (--email or SWITCHRT_EMAIL)")?;
    let mut auth = MemoryAuth::new();
    let token = auth.login(&email)?;

    let app = App::new(config, cli.route, auth, token, store, cli.windowed)?;
    app.run()?;

    Ok(())
}
