//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI con fallback a variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./health_stats_server --port 8080 \
//!   --dataset ./nutrition_activity_obesity_usa_subset.csv \
//!   --workers 8
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 TP_NUM_OF_THREADS=8 RUST_LOG=debug ./health_stats_server
//! ```

use crate::error::ConfigError;
use clap::Parser;
use std::num::NonZeroUsize;
use std::thread;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "health_stats_server")]
#[command(about = "Servidor de estadísticas de salud pública con consultas asíncronas")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Datos ===
    /// CSV de la encuesta, cargado una vez al arrancar
    #[arg(long, default_value = "./nutrition_activity_obesity_usa_subset.csv", env = "DATASET_PATH")]
    pub dataset: String,

    /// Directorio donde se guardan los resultados (`job_id_N.json`)
    #[arg(long = "results-dir", default_value = "./results", env = "RESULTS_DIR")]
    pub results_dir: String,

    /// Conserva los resultados de una ejecución anterior
    #[arg(long = "keep-results", env = "KEEP_RESULTS")]
    pub keep_results: bool,

    // === Workers ===
    /// Número de workers (por defecto, los núcleos disponibles)
    #[arg(long, env = "TP_NUM_OF_THREADS")]
    pub workers: Option<usize>,

    /// Espera máxima de un worker ocioso antes de revisar el apagado
    #[arg(long = "poll-interval-ms", default_value = "1000", env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    // === Logging ===
    /// Archivo de log; sin él se escribe a stdout
    #[arg(long = "log-file", env = "LOG_FILE")]
    pub log_file: Option<String>,
}

impl Config {
    /// Parsea argumentos CLI y variables de entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use health_stats_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Workers efectivos: el valor configurado o los núcleos disponibles
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError("workers must be >= 1".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError("poll interval must be > 0".to_string()));
        }
        if self.results_dir.trim().is_empty() {
            return Err(ConfigError("results dir must not be empty".to_string()));
        }
        if self.dataset.trim().is_empty() {
            return Err(ConfigError("dataset path must not be empty".to_string()));
        }

        Ok(())
    }

    /// Deja la configuración efectiva en el log
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            dataset = %self.dataset,
            results_dir = %self.results_dir,
            keep_results = self.keep_results,
            workers = self.worker_count(),
            poll_interval_ms = self.poll_interval_ms,
            log_file = self.log_file.as_deref().unwrap_or("stdout"),
            "configuration"
        );
    }
}

fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            dataset: "./nutrition_activity_obesity_usa_subset.csv".to_string(),
            results_dir: "./results".to_string(),
            keep_results: false,
            workers: None,
            poll_interval_ms: 1000,
            log_file: None,
        }
    }
}
