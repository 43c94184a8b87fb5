//! # Pool de Workers
//! src/jobs/pool.rs
//!
//! N threads de larga vida que vacían la cola de jobs. Cada worker ejecuta
//! un job a la vez hasta terminarlo y persiste su resultado antes de tomar
//! el siguiente. La concurrencia existe solo entre workers.
//!
//! Un job que falla (error o panic del Query Engine) igual deja un archivo
//! de resultado: el worker nunca muere por un job.

use crate::data::QueryEngine;
use crate::jobs::queue::{Dequeued, JobQueue};
use crate::jobs::shutdown::{DrainReport, PoolState, ShutdownCoordinator};
use crate::jobs::storage::ResultStore;
use crate::jobs::types::{Job, JobId, JobResult};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Lo que necesita cada worker; todo compartido por `Arc`
#[derive(Clone)]
struct WorkerContext {
    queue: JobQueue,
    store: Arc<dyn ResultStore>,
    engine: Arc<dyn QueryEngine>,

    /// Espera máxima en la cola antes de volver a revisar el apagado
    poll_interval: Duration,
}

/// Pool fijo de workers
pub struct WorkerPool {
    size: usize,
    coordinator: ShutdownCoordinator,
}

impl WorkerPool {
    /// Lanza `size` workers sobre la cola
    ///
    /// Si algún thread no se puede crear, apaga los que ya arrancaron y
    /// retorna el error.
    pub fn start(
        size: usize,
        queue: JobQueue,
        store: Arc<dyn ResultStore>,
        engine: Arc<dyn QueryEngine>,
        poll_interval: Duration,
    ) -> io::Result<Self> {
        let context = WorkerContext {
            queue: queue.clone(),
            store,
            engine,
            poll_interval,
        };

        let mut handles = Vec::with_capacity(size);
        for i in 0..size {
            let name = format!("worker-{}", i);
            let context = context.clone();

            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(name, context));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    ShutdownCoordinator::new(queue, handles).shutdown();
                    return Err(e);
                }
            }
        }

        tracing::info!(workers = size, poll_ms = poll_interval.as_millis() as u64, "worker pool started");

        Ok(Self {
            size,
            coordinator: ShutdownCoordinator::new(queue, handles),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn state(&self) -> PoolState {
        self.coordinator.state()
    }

    /// Apagado ordenado; bloquea hasta que salgan todos los workers
    pub fn shutdown(&self) -> DrainReport {
        self.coordinator.shutdown()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.coordinator.shutdown();
    }
}

/// Loop principal del worker
fn worker_loop(name: String, context: WorkerContext) {
    tracing::debug!(worker = %name, "worker started");

    loop {
        match context.queue.dequeue(context.poll_interval) {
            Dequeued::Job(job) => process_job(&name, &context, job),
            Dequeued::Empty => continue,
            Dequeued::Closed => break,
        }
    }

    tracing::debug!(worker = %name, "worker exiting");
}

/// Ejecuta un job y persiste su resultado
fn process_job(worker: &str, context: &WorkerContext, job: Job) {
    let start = Instant::now();
    tracing::info!(worker, job_id = %job.id(), kind = %job.kind(), "starting job");

    let result = execute_job(context.engine.as_ref(), &job);

    match &result {
        JobResult::Success(_) => tracing::info!(
            worker,
            job_id = %job.id(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "completed job"
        ),
        JobResult::Failure(reason) => tracing::error!(
            worker,
            job_id = %job.id(),
            reason = %reason,
            "job failed"
        ),
    }

    persist(context.store.as_ref(), job.id(), result);
}

/// Invoca el Query Engine; cualquier error o panic se convierte en `Failure`
pub(crate) fn execute_job(engine: &dyn QueryEngine, job: &Job) -> JobResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| engine.run(job.kind(), job.args())));

    match outcome {
        Ok(Ok(payload)) => JobResult::Success(payload),
        Ok(Err(e)) => JobResult::Failure(e.to_string()),
        Err(panic) => JobResult::Failure(format!("query panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Guarda el resultado; si falla, intenta dejar al menos un `Failure`
///
/// Si tampoco se puede escribir el fallo, el job queda "running" para
/// siempre desde el punto de vista del cliente.
fn persist(store: &dyn ResultStore, id: JobId, result: JobResult) {
    let Err(e) = store.put(id, &result) else {
        return;
    };

    tracing::error!(job_id = %id, error = %e, "failed to persist job result");

    if !result.is_success() {
        return;
    }

    let fallback = JobResult::Failure(format!("failed to persist result: {}", e));
    if let Err(e) = store.put(id, &fallback) {
        tracing::error!(job_id = %id, error = %e, "failed to persist error result; job stays running");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{QueryError, StoreError};
    use crate::jobs::storage::{Lookup, MemoryResultStore};
    use crate::jobs::types::{QueryArgs, QueryKind};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Mutex;

    /// Motor que registra el orden de ejecución y responde con la pregunta
    #[derive(Default)]
    struct RecordingEngine {
        seen: Mutex<Vec<String>>,
    }

    impl QueryEngine for RecordingEngine {
        fn run(&self, _kind: QueryKind, args: &QueryArgs) -> Result<Value, QueryError> {
            self.seen.lock().unwrap().push(args.question.clone());
            match args.question.as_str() {
                "fail" => Err(QueryError::UnknownQuestion("fail".to_string())),
                "panic" => panic!("engine exploded"),
                q => Ok(json!({ "question": q })),
            }
        }
    }

    /// Motor que bloquea cada job hasta recibir permiso
    struct GatedEngine {
        gate: Mutex<Receiver<()>>,
        started: AtomicUsize,
    }

    impl GatedEngine {
        fn new() -> (Arc<Self>, Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let engine = Self {
                gate: Mutex::new(rx),
                started: AtomicUsize::new(0),
            };
            (Arc::new(engine), tx)
        }
    }

    impl QueryEngine for GatedEngine {
        fn run(&self, _kind: QueryKind, _args: &QueryArgs) -> Result<Value, QueryError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let _ = self.gate.lock().unwrap().recv();
            Ok(json!({"ok": true}))
        }
    }

    /// Store que rechaza los éxitos pero acepta los fallos
    #[derive(Default)]
    struct RejectingStore {
        inner: MemoryResultStore,
    }

    impl ResultStore for RejectingStore {
        fn put(&self, id: JobId, result: &JobResult) -> Result<(), StoreError> {
            if result.is_success() {
                return Err(StoreError::Io {
                    job_id: id.to_string(),
                    source: io::Error::new(io::ErrorKind::Other, "disk full"),
                });
            }
            self.inner.put(id, result)
        }
        fn get(&self, id: JobId) -> Lookup {
            self.inner.get(id)
        }
        fn exists(&self, id: JobId) -> bool {
            self.inner.exists(id)
        }
        fn list(&self) -> Result<Vec<JobId>, StoreError> {
            self.inner.list()
        }
        fn clear(&self) -> Result<usize, StoreError> {
            self.inner.clear()
        }
    }

    fn job(n: u64, question: &str) -> Job {
        Job::new(JobId::from_number(n), QueryKind::GlobalMean, QueryArgs::question(question))
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn start(size: usize, queue: &JobQueue, store: Arc<dyn ResultStore>, engine: Arc<dyn QueryEngine>) -> WorkerPool {
        WorkerPool::start(size, queue.clone(), store, engine, Duration::from_millis(20)).unwrap()
    }

    #[test]
    fn test_jobs_produce_results() {
        let queue = JobQueue::new();
        let store = Arc::new(MemoryResultStore::new());
        let pool = start(4, &queue, store.clone(), Arc::new(RecordingEngine::default()));

        for n in 1..=20 {
            queue.enqueue(job(n, &format!("q{}", n)));
        }

        wait_until(|| store.list().unwrap().len() == 20);
        assert_eq!(
            store.get(JobId::from_number(7)),
            Lookup::Found(JobResult::Success(json!({"question": "q7"})))
        );

        let report = pool.shutdown();
        assert_eq!(report, DrainReport { workers_joined: 4, leftover: 0 });
    }

    #[test]
    fn test_failures_are_persisted_and_workers_survive() {
        let queue = JobQueue::new();
        let store = Arc::new(MemoryResultStore::new());
        let pool = start(1, &queue, store.clone(), Arc::new(RecordingEngine::default()));

        queue.enqueue(job(1, "fail"));
        queue.enqueue(job(2, "panic"));
        queue.enqueue(job(3, "fine"));

        wait_until(|| store.exists(JobId::from_number(3)));

        assert_eq!(
            store.get(JobId::from_number(1)),
            Lookup::Found(JobResult::Failure("Unknown question: fail".to_string()))
        );
        match store.get(JobId::from_number(2)) {
            Lookup::Found(JobResult::Failure(reason)) => assert!(reason.contains("engine exploded")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(store.get(JobId::from_number(3)) == Lookup::Found(JobResult::Success(json!({"question": "fine"}))));

        pool.shutdown();
    }

    #[test]
    fn test_single_worker_runs_in_submission_order() {
        let queue = JobQueue::new();
        let store = Arc::new(MemoryResultStore::new());
        let engine = Arc::new(RecordingEngine::default());
        let pool = start(1, &queue, store.clone(), engine.clone());

        for n in 1..=10 {
            queue.enqueue(job(n, &format!("q{}", n)));
        }
        wait_until(|| store.list().unwrap().len() == 10);
        pool.shutdown();

        let expected: Vec<String> = (1..=10).map(|n| format!("q{}", n)).collect();
        assert_eq!(*engine.seen.lock().unwrap(), expected);
    }

    #[test]
    fn test_shutdown_finishes_job_in_hand_and_leaves_queue() {
        let queue = JobQueue::new();
        let store = Arc::new(MemoryResultStore::new());
        let (engine, release) = GatedEngine::new();
        let pool = Arc::new(start(1, &queue, store.clone(), engine.clone()));

        queue.enqueue(job(1, "a"));
        wait_until(|| engine.started.load(Ordering::SeqCst) == 1);
        queue.enqueue(job(2, "b"));
        queue.enqueue(job(3, "c"));

        let shutdown = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.shutdown())
        };
        wait_until(|| pool.state() == PoolState::ShutdownRequested);
        release.send(()).unwrap();

        let report = shutdown.join().unwrap();
        assert_eq!(report, DrainReport { workers_joined: 1, leftover: 2 });
        assert_eq!(pool.state(), PoolState::Drained);

        // El job en mano terminó; los de la cola no
        assert!(store.exists(JobId::from_number(1)));
        assert!(!store.exists(JobId::from_number(2)));
        assert!(!store.exists(JobId::from_number(3)));
        assert_eq!(queue.len(), 2);
        assert_eq!(engine.started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_idle_shutdown_does_not_wait_for_poll_interval() {
        let queue = JobQueue::new();
        let pool = WorkerPool::start(
            3,
            queue,
            Arc::new(MemoryResultStore::new()),
            Arc::new(RecordingEngine::default()),
            Duration::from_secs(60),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        let report = pool.shutdown();

        assert_eq!(report.workers_joined, 3);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_persist_falls_back_to_failure() {
        let store = RejectingStore::default();
        let id = JobId::from_number(1);

        persist(&store, id, JobResult::Success(json!({"a": 1.0})));

        match store.get(id) {
            Lookup::Found(JobResult::Failure(reason)) => assert!(reason.contains("disk full")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_execute_job_maps_outcomes() {
        let engine = RecordingEngine::default();
        assert!(execute_job(&engine, &job(1, "ok")).is_success());
        assert_eq!(
            execute_job(&engine, &job(2, "fail")),
            JobResult::Failure("Unknown question: fail".to_string())
        );
        assert!(!execute_job(&engine, &job(3, "panic")).is_success());
    }
}
