//! # Errores del Servidor
//! src/error.rs
//!
//! Tipos de error de cada capa. Cada capa tiene su propio enum para que
//! el llamador pueda decidir qué hacer (un error de consulta termina en el
//! archivo de resultado, un error de configuración aborta el arranque).

use thiserror::Error;

/// Errores de la ejecución de una consulta (Query Engine)
///
/// Nunca se propagan al cliente de forma síncrona: el worker los
/// convierte en un resultado `Failure`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// La pregunta no aparece en el dataset
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    /// Falta un argumento que el tipo de consulta necesita
    #[error("Missing argument '{argument}' for {kind}")]
    MissingArgument {
        kind: &'static str,
        argument: &'static str,
    },
}

/// Errores del Result Store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Fallo de I/O al escribir o borrar el resultado de un job
    #[error("I/O error on result of {job_id}: {source}")]
    Io {
        job_id: String,
        #[source]
        source: std::io::Error,
    },

    /// Fallo de I/O sobre el directorio de resultados
    #[error("I/O error on results directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// El resultado no se pudo serializar
    #[error("Failed to serialize result of {job_id}: {source}")]
    Serialize {
        job_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errores al cargar el dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Configuración inválida
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Identificador de job con formato inválido
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid job_id: {0}")]
pub struct InvalidJobId(pub String);

/// Error fatal durante el arranque del proceso
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
