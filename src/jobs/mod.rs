//! # Sistema de Jobs
//!
//! Las consultas sobre el dataset se ejecutan en segundo plano: el request
//! HTTP solo encola y recibe un `job_id`, y el cliente consulta después el
//! resultado.
//!
//! ```text
//! submit → JobIdAllocator → JobQueue → WorkerPool → QueryEngine → ResultStore
//! ```
//!
//! ## Endpoints
//!
//! - `POST /api/<consulta>` - Encolar consulta
//! - `GET /api/get_results/<job_id>` - Estado o resultado
//! - `GET /api/num_jobs` - Jobs en cola
//! - `GET /api/graceful_shutdown` - Apagado ordenado
//! - `GET /api/jobs` - Jobs terminados

pub mod handlers;
pub mod id;
pub mod manager;
pub mod pool;
pub mod queue;
pub mod shutdown;
pub mod storage;
pub mod types;

pub use manager::{JobManager, JobManagerConfig};
pub use shutdown::{DrainReport, PoolState};
pub use storage::{FileResultStore, Lookup, MemoryResultStore, ResultStore};
pub use types::{Job, JobId, JobResult, JobStatus, QueryArgs, QueryKind, ShutdownStatus};
