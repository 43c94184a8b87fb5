//! # Construcción de Respuestas HTTP
//!
//! Respuestas HTTP/1.0 armadas a mano y serializadas a bytes para el
//! socket. Los errores de la API usan siempre el mismo sobre JSON:
//! `{"status": "error", "reason": "..."}`.
//!
//! ```
//! use health_stats_server::http::{Response, StatusCode};
//! use serde_json::json;
//!
//! let response = Response::json(&json!({"job_id": "job_id_1"}));
//! assert_eq!(response.status(), StatusCode::Ok);
//! ```

use super::StatusCode;
use serde_json::{json, Value};

/// Respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// En orden de inserción; un nombre repetido reemplaza al anterior
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl Response {
    /// Respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Fija el body y su `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        let length = body.len().to_string();
        self.body = body;
        self.add_header("Content-Length", &length);
        self
    }

    /// 200 OK con body JSON
    pub fn json(value: &Value) -> Self {
        Self::json_with_status(StatusCode::Ok, value)
    }

    pub fn json_with_status(status: StatusCode, value: &Value) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body_bytes(value.to_string().into_bytes())
    }

    /// Error con el sobre `{"status": "error", "reason": ...}`
    pub fn error(status: StatusCode, reason: &str) -> Self {
        Self::json_with_status(status, &json!({ "status": "error", "reason": reason }))
    }

    /// Texto plano (listado de rutas)
    pub fn text(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body_bytes(body.as_bytes().to_vec())
    }

    /// Descarta el body y deja los headers (respuesta a HEAD)
    pub fn without_body(mut self) -> Self {
        self.body.clear();
        self
    }

    /// Bytes listos para el socket: status line, headers, línea vacía, body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body parseado como JSON, útil en pruebas
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}
