//! # Health Stats Server
//! src/lib.rs
//!
//! Servidor HTTP que responde consultas estadísticas sobre un dataset de
//! salud pública (nutrición, actividad física, obesidad en EE.UU.). Las
//! consultas se encolan y las resuelve un pool de workers en segundo plano;
//! el cliente recibe un `job_id` y consulta el resultado después.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing y construcción de mensajes HTTP
//! - `server`: Servidor TCP, un thread por conexión
//! - `router`: Enrutamiento por método y path
//! - `jobs`: Ids, cola, workers, resultados y apagado ordenado
//! - `data`: Carga del CSV y Query Engine
//! - `config`: Argumentos CLI y variables de entorno
//! - `logging`: Subscriber de `tracing`
//! - `error`: Tipos de error
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use health_stats_server::data::Dataset;
//! use health_stats_server::jobs::{JobManager, JobManagerConfig, MemoryResultStore};
//! use health_stats_server::server::Server;
//! use std::sync::Arc;
//!
//! let manager = JobManager::new(
//!     JobManagerConfig::default(),
//!     Arc::new(MemoryResultStore::new()),
//!     Arc::new(Dataset::default()),
//! )
//! .unwrap();
//!
//! let server = Server::bind("127.0.0.1:8080", Arc::new(manager)).unwrap();
//! server.run().unwrap();
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod router;
pub mod server;
