//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Endpoints de la API:
//! - `POST /api/<consulta>`: encola una consulta y retorna su `job_id`
//! - `GET /api/get_results/<job_id>`
//! - `GET /api/num_jobs`
//! - `GET /api/graceful_shutdown`
//! - `GET /api/jobs`
//!
//! Los handlers solo validan y traducen; el trabajo lo hace el `JobManager`.

use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::manager::JobManager;
use crate::jobs::types::{QueryArgs, QueryKind};
use crate::router::{RouteParams, Router};
use serde_json::{json, Map, Value};

/// Tabla de rutas de la API
pub fn routes() -> Router<JobManager> {
    let mut router = Router::new();

    router.register(Method::GET, "/api/get_results/:job_id", get_results_handler);
    router.register(Method::GET, "/api/num_jobs", num_jobs_handler);
    router.register(Method::GET, "/api/graceful_shutdown", graceful_shutdown_handler);
    router.register(Method::GET, "/api/jobs", jobs_handler);
    for kind in QueryKind::ALL {
        router.register(Method::POST, &format!("/api/{}", kind.as_str()), submit_handler);
    }

    router
}

/// Handler para `POST /api/<consulta>`
///
/// # Body
/// ```json
/// {"question": "...", "state": "..."}
/// ```
/// `state` solo es obligatorio en las consultas por estado.
///
/// # Ejemplo de response
/// ```json
/// {"job_id": "job_id_1"}
/// ```
pub fn submit_handler(req: &Request, _params: &RouteParams, manager: &JobManager) -> Response {
    let name = req.path().rsplit('/').next().unwrap_or_default();
    let Some(kind) = QueryKind::from_name(name) else {
        return Response::error(StatusCode::NotFound, &format!("Route not found: {}", req.path()));
    };

    let body = match req.json_body() {
        Some(Value::Object(body)) => body,
        _ => return Response::error(StatusCode::BadRequest, "Request body must be a JSON object"),
    };

    let args = match parse_args(kind, &body) {
        Ok(args) => args,
        Err(reason) => return Response::error(StatusCode::BadRequest, reason),
    };

    let job_id = manager.submit(kind, args);
    Response::json(&json!({ "job_id": job_id }))
}

/// Extrae los argumentos tipados del body
fn parse_args(kind: QueryKind, body: &Map<String, Value>) -> Result<QueryArgs, &'static str> {
    let field = |name: &str| body.get(name).and_then(Value::as_str);

    if kind.requires_state() {
        match (field("question"), field("state")) {
            (Some(question), Some(state)) => Ok(QueryArgs::question(question).with_state(state)),
            _ => Err("Missing question or state parameter"),
        }
    } else {
        field("question")
            .map(QueryArgs::question)
            .ok_or("Missing question parameter")
    }
}

/// Handler para `GET /api/get_results/<job_id>`
///
/// # Ejemplos de response
/// ```json
/// {"status": "running"}
/// {"status": "done", "data": {...}}
/// {"status": "error", "reason": "Invalid job_id"}
/// ```
pub fn get_results_handler(_req: &Request, params: &RouteParams, manager: &JobManager) -> Response {
    let raw = params.get("job_id").unwrap_or_default();
    Response::json(&manager.job_status(raw).to_json())
}

/// Handler para `GET /api/num_jobs`: jobs que siguen en la cola
pub fn num_jobs_handler(_req: &Request, _params: &RouteParams, manager: &JobManager) -> Response {
    Response::json(&json!({ "num_jobs": manager.num_jobs() }))
}

/// Handler para `GET /api/graceful_shutdown`
///
/// Bloquea hasta que todos los workers terminen su job en mano.
pub fn graceful_shutdown_handler(_req: &Request, _params: &RouteParams, manager: &JobManager) -> Response {
    let status = manager.graceful_shutdown();
    Response::json(&json!({ "status": status }))
}

/// Handler para `GET /api/jobs`: jobs con resultado guardado
pub fn jobs_handler(_req: &Request, _params: &RouteParams, manager: &JobManager) -> Response {
    let data: Vec<Value> = manager
        .completed_jobs()
        .into_iter()
        .map(|id| {
            let mut entry = Map::new();
            entry.insert(id.to_string(), json!("done"));
            Value::Object(entry)
        })
        .collect();

    Response::json(&json!({ "status": "done", "data": data }))
}
