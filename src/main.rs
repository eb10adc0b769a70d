mod app;
mod bundle;
mod card;
mod config;
mod error;
mod logging;
mod queue;
mod scheduler;
mod session;
mod stats;
mod storage;
mod trainer;
mod ui;

use anyhow::Result;
use app::App;
use config::Config;

fn main() -> Result<()> {
    let config = Config::load()?;
    config.ensure_dirs()?;
    logging::init(&config)?;

    tracing::info!(db = %config.db_path.display(), "Starting kelma");

    let app = App::new(config)?;

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!("Exiting with error: {e:#}");
    }

    result
}
