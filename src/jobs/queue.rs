//! # Cola FIFO para Jobs
//! src/jobs/queue.rs
//!
//! Implementa una cola thread-safe, sin límite de capacidad, que entrega
//! los jobs en orden de llegada. El mismo lock protege la bandera de
//! cierre que usa el apagado ordenado.

use crate::jobs::types::Job;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Resultado de intentar desencolar
#[derive(Debug)]
pub enum Dequeued {
    /// El worker pasa a ser dueño exclusivo del job
    Job(Job),

    /// Se agotó la espera sin jobs disponibles
    Empty,

    /// La cola fue cerrada por el apagado; no se entregan más jobs
    Closed,
}

/// Estado protegido por el mutex
#[derive(Debug, Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// Cola FIFO thread-safe
///
/// Clonar la cola comparte el mismo estado interno.
#[derive(Clone, Default)]
pub struct JobQueue {
    /// Jobs pendientes + bandera de cierre
    state: Arc<Mutex<QueueState>>,

    /// Condvar para despertar workers cuando hay jobs o al cerrar
    condvar: Arc<Condvar>,
}

impl JobQueue {
    /// Crea una cola vacía
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un job al final
    ///
    /// Nunca bloquea ni rechaza, incluso con la cola cerrada: en ese caso
    /// el job queda en la cola sin procesarse.
    pub fn enqueue(&self, job: Job) {
        let mut state = self.lock();
        state.jobs.push_back(job);

        // Notificar a un worker esperando
        self.condvar.notify_one();
    }

    /// Desencola el job más antiguo
    ///
    /// Si la cola está vacía espera como máximo `timeout`. Si la cola está
    /// cerrada retorna `Closed` de inmediato aunque queden jobs.
    pub fn dequeue(&self, timeout: Duration) -> Dequeued {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();

        loop {
            if state.closed {
                return Dequeued::Closed;
            }

            if let Some(job) = state.jobs.pop_front() {
                return Dequeued::Job(job);
            }

            let now = Instant::now();
            if now >= deadline {
                return Dequeued::Empty;
            }

            // Esperar a que haya jobs o a que cierren la cola
            let (guard, _) = self
                .condvar
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Cierra la cola y despierta a todos los workers que esperan
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.condvar.notify_all();
    }

    /// Jobs que siguen en la cola (los que ya tomó un worker no cuentan)
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
