//! # Apagado Ordenado
//! src/jobs/shutdown.rs
//!
//! Máquina de estados `Running -> ShutdownRequested -> Drained`.
//!
//! Al pedir el apagado se cierra la cola: los workers ociosos despiertan y
//! salen, los ocupados terminan el job que tienen en mano. Los jobs que
//! siguen en la cola no se procesan nunca; se reporta cuántos quedaron.

use crate::jobs::queue::JobQueue;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Estado del pool de workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Running,
    ShutdownRequested,
    Drained,
}

/// Resumen de un apagado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Threads que terminaron durante esta llamada
    pub workers_joined: usize,

    /// Jobs que quedaron en la cola sin procesar
    pub leftover: usize,
}

/// Coordina el apagado de los workers
pub struct ShutdownCoordinator {
    queue: JobQueue,
    state: Mutex<PoolState>,

    /// Se mantiene bloqueado mientras se hace join, para que dos apagados
    /// concurrentes no reporten `Drained` antes de tiempo
    workers: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ShutdownCoordinator {
    pub fn new(queue: JobQueue, workers: Vec<JoinHandle<()>>) -> Self {
        Self {
            queue,
            state: Mutex::new(PoolState::Running),
            workers: Mutex::new(workers),
        }
    }

    pub fn state(&self) -> PoolState {
        *lock(&self.state)
    }

    /// Pide el apagado y espera a que salgan todos los workers
    ///
    /// Bloquea al llamador. Llamarlo otra vez no hace daño: retorna
    /// `workers_joined = 0` y el tamaño actual de la cola.
    pub fn shutdown(&self) -> DrainReport {
        let mut workers = lock(&self.workers);

        // Primero cerrar la cola: cuando alguien observe ShutdownRequested,
        // ningún worker puede tomar otro job
        self.queue.close();
        {
            let mut state = lock(&self.state);
            if *state == PoolState::Running {
                *state = PoolState::ShutdownRequested;
                tracing::info!(
                    workers = workers.len(),
                    pending = self.queue.len(),
                    "shutdown requested"
                );
            }
        }

        let mut workers_joined = 0;
        for handle in workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                tracing::error!(worker = %name, "worker thread panicked");
            }
            workers_joined += 1;
        }

        *lock(&self.state) = PoolState::Drained;

        let report = DrainReport {
            workers_joined,
            leftover: self.queue.len(),
        };

        if workers_joined > 0 {
            tracing::info!(
                workers_joined = report.workers_joined,
                leftover = report.leftover,
                "worker pool drained"
            );
            if report.leftover > 0 {
                tracing::warn!(leftover = report.leftover, "jobs left unprocessed in the queue");
            }
        }

        report
    }
}
