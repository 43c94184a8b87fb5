//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero, con el store
//! de resultados en un directorio temporal y un dataset chico en memoria.

use health_stats_server::data::parse_csv;
use health_stats_server::jobs::{FileResultStore, JobManager, JobManagerConfig};
use health_stats_server::server::Server;
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const OBESITY: &str = "Percent of adults aged 18 years and older who have obesity";
const MUSCLE: &str = "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)";

const DATASET: &str = "\
YearStart,LocationDesc,Question,Data_Value,StratificationCategory1,Stratification1
2020,Ohio,Percent of adults aged 18 years and older who have obesity,30.0,Sex,Male
2020,Ohio,Percent of adults aged 18 years and older who have obesity,40.0,Sex,Female
2020,Texas,Percent of adults aged 18 years and older who have obesity,20.0,Sex,Male
2020,Utah,Percent of adults aged 18 years and older who have obesity,25.0,Sex,Female
2020,Iowa,Percent of adults aged 18 years and older who have obesity,,Sex,Male
2020,Ohio,\"Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)\",50.0,Total,Total
";

/// Servidor de prueba corriendo en background
struct TestServer {
    addr: SocketAddr,
    results_dir: PathBuf,
    _dir: TempDir,
}

fn start_server(workers: usize) -> TestServer {
    let dir = TempDir::new().unwrap();
    let results_dir = dir.path().join("results");

    let store = FileResultStore::open(&results_dir).unwrap();
    let dataset = parse_csv(DATASET.as_bytes()).unwrap();
    let config = JobManagerConfig {
        workers,
        poll_interval: Duration::from_millis(20),
    };
    let manager = JobManager::new(config, Arc::new(store), Arc::new(dataset)).unwrap();

    let server = Server::bind("127.0.0.1:0", Arc::new(manager)).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());

    TestServer {
        addr,
        results_dir,
        _dir: dir,
    }
}

/// Helper: envía bytes crudos y retorna la response completa
fn send_raw(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream.write_all(raw).unwrap();
    stream.flush().unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

/// Helper: extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or_default()
}

fn get(server: &TestServer, path: &str) -> (String, Value) {
    let response = send_raw(server.addr, format!("GET {} HTTP/1.0\r\n\r\n", path).as_bytes());
    let body = serde_json::from_str(extract_body(&response)).unwrap_or(Value::Null);
    (status_line(&response).to_string(), body)
}

fn post(server: &TestServer, path: &str, body: &Value) -> (String, Value) {
    let body = body.to_string();
    let raw = format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    );
    let response = send_raw(server.addr, raw.as_bytes());
    let body = serde_json::from_str(extract_body(&response)).unwrap_or(Value::Null);
    (status_line(&response).to_string(), body)
}

fn submit(server: &TestServer, kind: &str, body: Value) -> String {
    let (status, body) = post(server, &format!("/api/{}", kind), &body);
    assert_eq!(status, "HTTP/1.0 200 OK", "submit failed: {}", body);
    body["job_id"].as_str().unwrap().to_string()
}

fn wait_result(server: &TestServer, job_id: &str) -> Value {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let (_, body) = get(server, &format!("/api/get_results/{}", job_id));
        if body["status"] != "running" {
            return body;
        }
        assert!(Instant::now() < deadline, "job {} never finished", job_id);
        thread::sleep(Duration::from_millis(10));
    }
}

// ==== Consultas ====

#[test]
fn test_states_mean_end_to_end() {
    let server = start_server(2);

    let job_id = submit(&server, "states_mean", json!({ "question": OBESITY }));
    assert_eq!(job_id, "job_id_1");

    let body = wait_result(&server, &job_id);
    assert_eq!(body["status"], "done");

    // Ascendente por valor; Iowa no tiene valores
    let data = body["data"].as_object().unwrap();
    let keys: Vec<&str> = data.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Texas", "Utah", "Ohio"]);
    assert_eq!(body["data"]["Ohio"], json!(35.0));

    // El resultado quedó en disco con el nombre del job
    assert!(server.results_dir.join("job_id_1.json").is_file());
}

#[test]
fn test_state_queries() {
    let server = start_server(2);

    let mean = submit(&server, "state_mean", json!({ "question": OBESITY, "state": "Ohio" }));
    let missing = submit(&server, "state_mean", json!({ "question": OBESITY, "state": "Atlantis" }));
    let global = submit(&server, "global_mean", json!({ "question": OBESITY }));

    assert_eq!(wait_result(&server, &mean)["data"], json!({"Ohio": 35.0}));
    assert_eq!(wait_result(&server, &missing)["data"], json!({"Atlantis": null}));
    assert_eq!(wait_result(&server, &global)["data"], json!({"global_mean": 28.75}));
}

#[test]
fn test_unknown_question_is_failed_job() {
    let server = start_server(1);

    let job_id = submit(&server, "best5", json!({ "question": "Not a question" }));
    let body = wait_result(&server, &job_id);

    assert_eq!(body["status"], "done");
    assert_eq!(body["data"]["status"], "error");
    assert_eq!(body["data"]["reason"], "Unknown question: Not a question");
}

#[test]
fn test_repeated_polls_are_identical() {
    let server = start_server(1);

    let job_id = submit(&server, "mean_by_category", json!({ "question": MUSCLE }));
    let first = wait_result(&server, &job_id);
    let (_, second) = get(&server, &format!("/api/get_results/{}", job_id));

    assert_eq!(first, second);
    assert_eq!(first["data"], json!({"('Ohio', 'Total', 'Total')": 50.0}));
}

#[test]
fn test_submission_order_with_single_worker() {
    let server = start_server(1);

    let ids: Vec<String> = (0..5)
        .map(|_| submit(&server, "global_mean", json!({ "question": OBESITY })))
        .collect();
    assert_eq!(ids, vec!["job_id_1", "job_id_2", "job_id_3", "job_id_4", "job_id_5"]);

    wait_result(&server, "job_id_5");
    let (_, listing) = get(&server, "/api/jobs");
    assert_eq!(listing["data"].as_array().unwrap().len(), 5);
    assert_eq!(listing["data"][0], json!({"job_id_1": "done"}));
}

// ==== Validación ====

#[test]
fn test_missing_parameters() {
    let server = start_server(1);

    let (status, body) = post(&server, "/api/worst5", &json!({}));
    assert_eq!(status, "HTTP/1.0 400 Bad Request");
    assert_eq!(body, json!({"status": "error", "reason": "Missing question parameter"}));

    let (status, body) = post(&server, "/api/state_mean_by_category", &json!({ "question": OBESITY }));
    assert_eq!(status, "HTTP/1.0 400 Bad Request");
    assert_eq!(body["reason"], "Missing question or state parameter");

    // Ningún job fue creado
    let (_, body) = get(&server, "/api/get_results/job_id_1");
    assert_eq!(body, json!({"status": "error", "reason": "Invalid job_id"}));
}

#[test]
fn test_invalid_job_ids() {
    let server = start_server(1);

    for id in ["job_id_99", "job_id_0", "nonsense", "..%2Fetc"] {
        let (status, body) = get(&server, &format!("/api/get_results/{}", id));
        assert_eq!(status, "HTTP/1.0 200 OK");
        assert_eq!(body["reason"], "Invalid job_id", "id {:?}", id);
    }
}

#[test]
fn test_not_found_and_wrong_method() {
    let server = start_server(1);

    let (status, body) = get(&server, "/nonexistent");
    assert_eq!(status, "HTTP/1.0 404 Not Found");
    assert_eq!(body["status"], "error");

    let (status, _) = post(&server, "/api/num_jobs", &json!({}));
    assert_eq!(status, "HTTP/1.0 405 Method Not Allowed");

    let (status, _) = post(&server, "/api/median", &json!({ "question": OBESITY }));
    assert_eq!(status, "HTTP/1.0 404 Not Found");

    let (status, _) = get(&server, "/api/states_mean");
    assert_eq!(status, "HTTP/1.0 405 Method Not Allowed");
}

#[test]
fn test_malformed_request() {
    let server = start_server(1);
    let response = send_raw(server.addr, b"\x00\x01garbage\r\n\r\n");
    assert!(response.starts_with("HTTP/1.0 400 Bad Request"));
}

#[test]
fn test_index_lists_routes() {
    let server = start_server(1);
    let response = send_raw(server.addr, b"GET / HTTP/1.0\r\n\r\n");

    assert!(response.starts_with("HTTP/1.0 200 OK"));
    assert!(response.contains("X-Request-Id: "));
    assert!(extract_body(&response).contains("GET /api/num_jobs"));
}

// ==== Apagado ====

#[test]
fn test_graceful_shutdown() {
    let server = start_server(2);

    let job_id = submit(&server, "diff_from_mean", json!({ "question": OBESITY }));
    wait_result(&server, &job_id);

    let (_, body) = get(&server, "/api/graceful_shutdown");
    assert_eq!(body, json!({"status": "done"}));

    // El servidor sigue respondiendo pero ya no procesa jobs
    let pending = submit(&server, "global_mean", json!({ "question": OBESITY }));
    assert_eq!(get(&server, "/api/num_jobs").1, json!({"num_jobs": 1}));
    assert_eq!(
        get(&server, &format!("/api/get_results/{}", pending)).1,
        json!({"status": "running"})
    );
    assert_eq!(get(&server, "/api/graceful_shutdown").1, json!({"status": "running"}));
}
