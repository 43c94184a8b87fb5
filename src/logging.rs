//! # Logging
//! src/logging.rs
//!
//! Subscriber de `tracing` para todo el proceso. El nivel se controla con
//! `RUST_LOG` (por defecto `info`). Con archivo de log la salida va sin
//! colores ANSI y el archivo se trunca al arrancar.

use crate::error::AppError;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

/// Instala el subscriber global
///
/// Falla si el archivo no se puede crear o si ya había un subscriber.
pub fn init(log_file: Option<&str>) -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| AppError::Logging(format!("cannot open log file {}: {}", path, e)))?;

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_thread_names(true)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
                .map_err(|e| AppError::Logging(e.to_string()))
        }
        None => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_thread_names(true))
            .try_init()
            .map_err(|e| AppError::Logging(e.to_string())),
    }
}
