//! # Asignador de Identificadores
//! src/jobs/id.rs
//!
//! Contador atómico que produce `job_id_1`, `job_id_2`, ... sin huecos ni
//! duplicados aunque lo llamen varios threads a la vez.

use crate::jobs::types::JobId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Asignador de ids de jobs
///
/// Lo posee el `JobManager`; no hay estado global.
#[derive(Debug, Default)]
pub struct JobIdAllocator {
    /// Último número entregado (0 = ninguno todavía)
    last: AtomicU64,
}

impl JobIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entrega el siguiente id
    pub fn next(&self) -> JobId {
        // fetch_add devuelve el valor previo: el primer id es 1
        let number = self.last.fetch_add(1, Ordering::SeqCst) + 1;
        JobId::from_number(number)
    }

    /// Número del último id entregado
    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }

    /// Verifica si el id ya fue entregado por este proceso
    pub fn was_issued(&self, id: JobId) -> bool {
        id.number() <= self.last_issued()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_at_one() {
        let ids = JobIdAllocator::new();
        assert_eq!(ids.last_issued(), 0);
        assert_eq!(ids.next().to_string(), "job_id_1");
        assert_eq!(ids.next().to_string(), "job_id_2");
        assert_eq!(ids.last_issued(), 2);
    }

    #[test]
    fn test_was_issued() {
        let ids = JobIdAllocator::new();
        let first = ids.next();
        assert!(ids.was_issued(first));
        assert!(!ids.was_issued(JobId::from_number(2)));
    }

    #[test]
    fn test_concurrent_allocation_is_contiguous() {
        let ids = Arc::new(JobIdAllocator::new());
        let threads = 8;
        let per_thread = 250;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..per_thread).map(|_| ids.next().number()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = BTreeSet::new();
        for handle in handles {
            for n in handle.join().unwrap() {
                assert!(all.insert(n), "duplicate id {}", n);
            }
        }

        let total = (threads * per_thread) as u64;
        assert_eq!(all.len() as u64, total);
        assert_eq!(all.iter().next(), Some(&1));
        assert_eq!(all.iter().next_back(), Some(&total));
    }
}
