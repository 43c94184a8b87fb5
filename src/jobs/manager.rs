//! # Gestor Central de Jobs
//! src/jobs/manager.rs
//!
//! Fachada que usa la capa HTTP: asigna ids, encola, consulta resultados y
//! dispara el apagado ordenado. Es dueño del asignador de ids, la cola, el
//! store y el pool de workers.

use crate::config::Config;
use crate::data::QueryEngine;
use crate::jobs::id::JobIdAllocator;
use crate::jobs::pool::WorkerPool;
use crate::jobs::queue::JobQueue;
use crate::jobs::shutdown::PoolState;
use crate::jobs::storage::{Lookup, ResultStore};
use crate::jobs::types::{Job, JobId, JobStatus, QueryArgs, QueryKind, ShutdownStatus};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Configuración del Job Manager
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Número de workers
    pub workers: usize,

    /// Espera máxima de un worker ocioso antes de revisar el apagado
    pub poll_interval: Duration,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            poll_interval: Duration::from_millis(1000),
        }
    }
}

impl JobManagerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.worker_count(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// Gestor central de jobs
pub struct JobManager {
    ids: JobIdAllocator,
    queue: JobQueue,
    store: Arc<dyn ResultStore>,
    pool: WorkerPool,
}

impl JobManager {
    /// Crea el manager y arranca los workers
    pub fn new(
        config: JobManagerConfig,
        store: Arc<dyn ResultStore>,
        engine: Arc<dyn QueryEngine>,
    ) -> io::Result<Self> {
        let queue = JobQueue::new();
        let pool = WorkerPool::start(
            config.workers,
            queue.clone(),
            Arc::clone(&store),
            engine,
            config.poll_interval,
        )?;

        Ok(Self {
            ids: JobIdAllocator::new(),
            queue,
            store,
            pool,
        })
    }

    /// Encola un job y retorna su id de inmediato
    ///
    /// Nunca bloquea por capacidad. Después de un apagado el job se acepta
    /// igual pero ningún worker lo va a tomar.
    pub fn submit(&self, kind: QueryKind, args: QueryArgs) -> JobId {
        let id = self.ids.next();
        tracing::debug!(job_id = %id, kind = %kind, "job enqueued");
        self.queue.enqueue(Job::new(id, kind, args));
        id
    }

    /// Estado de un job a partir del id crudo recibido por HTTP
    pub fn job_status(&self, raw: &str) -> JobStatus {
        let id = match raw.parse::<JobId>() {
            Ok(id) if self.ids.was_issued(id) => id,
            _ => return JobStatus::Invalid,
        };

        // Archivo ausente o vacío: el worker todavía no terminó de escribir
        if !self.store.exists(id) {
            return JobStatus::Running;
        }

        match self.store.get(id) {
            Lookup::Found(result) => JobStatus::Done(result.to_json()),
            Lookup::NotFound => JobStatus::Running,
            Lookup::Corrupt(reason) => {
                tracing::warn!(job_id = %id, reason = %reason, "result could not be read");
                JobStatus::Invalid
            }
        }
    }

    /// Jobs que siguen en la cola (los que están en ejecución no cuentan)
    pub fn num_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Apaga el pool y reporta si quedaron jobs sin procesar
    ///
    /// Bloquea hasta que todos los workers terminen su job en mano.
    pub fn graceful_shutdown(&self) -> ShutdownStatus {
        let report = self.pool.shutdown();
        if report.leftover > 0 {
            ShutdownStatus::Running
        } else {
            ShutdownStatus::Done
        }
    }

    /// Ids con resultado guardado, en orden ascendente
    pub fn completed_jobs(&self) -> Vec<JobId> {
        match self.store.list() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "failed to list results");
                Vec::new()
            }
        }
    }

    pub fn pool_state(&self) -> PoolState {
        self.pool.state()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.size()
    }
}
