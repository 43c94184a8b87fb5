//! # Health Stats Server - Entry Point
//! src/main.rs
//!
//! Arranque: configuración, logging, dataset, store de resultados, workers
//! y servidor HTTP. Cualquier error de arranque termina el proceso con
//! código 1.

use health_stats_server::config::Config;
use health_stats_server::data::load_csv;
use health_stats_server::error::AppError;
use health_stats_server::jobs::{FileResultStore, JobManager, JobManagerConfig, ResultStore};
use health_stats_server::logging;
use health_stats_server::server::Server;
use std::sync::Arc;

fn main() {
    let config = Config::new();

    if let Err(e) = logging::init(config.log_file.as_deref()) {
        eprintln!("Error fatal: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        tracing::error!(error = %e, "fatal error");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), AppError> {
    config.validate()?;
    config.log_summary();

    let dataset = load_csv(&config.dataset)?;

    let store = FileResultStore::open(&config.results_dir)?;
    if !config.keep_results {
        let removed = store.clear()?;
        if removed > 0 {
            tracing::info!(removed, dir = %config.results_dir, "cleared stale results");
        }
    }

    let manager = JobManager::new(
        JobManagerConfig::from_config(&config),
        Arc::new(store),
        Arc::new(dataset),
    )?;

    let server = Server::bind(&config.address(), Arc::new(manager))?;
    server.run()?;

    Ok(())
}
