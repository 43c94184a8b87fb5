//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser HTTP/1.0 y HTTP/1.1 escrito a mano. Una conexión lleva un solo
//! request; el body (JSON en los POST de la API) se toma tal cual a partir
//! de la línea vacía.
//!
//! ## Formato
//!
//! ```text
//! POST /api/states_mean HTTP/1.1\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 21\r\n
//! \r\n
//! {"question": "..."}
//! ```

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Separador entre la cabecera y el body
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,

    /// Como GET pero la respuesta no lleva body
    HEAD,

    POST,
}

impl Method {
    fn parse(s: &str) -> Result<Self, RequestError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ => Err(RequestError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }
}

/// Errores de parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Empty request")]
    EmptyRequest,

    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),
}

/// Request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query string (ej: "/api/get_results/job_id_1")
    path: String,

    /// Nombres en minúsculas
    headers: HashMap<String, String>,

    version: String,

    body: Vec<u8>,
}

impl Request {
    /// Parsea un request completo desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use health_stats_server::http::Request;
    ///
    /// let raw = b"POST /api/best5 HTTP/1.0\r\nContent-Length: 2\r\n\r\n{}";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/api/best5");
    /// assert_eq!(request.body(), b"{}");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, RequestError> {
        if buffer.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(RequestError::EmptyRequest);
        }

        let (head, body) = match find_head_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + HEAD_TERMINATOR.len()..]),
            None => (buffer, &[][..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| RequestError::InvalidRequestLine)?;
        let mut lines = head.split("\r\n");

        let (method, path, version) = Self::parse_request_line(lines.next().unwrap_or_default())?;
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            headers,
            version,
            body: body.to_vec(),
        })
    }

    /// Request line: `METHOD /path?query HTTP/1.x`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), RequestError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(RequestError::InvalidRequestLine);
        }

        let method = Method::parse(parts[0])?;

        // La API no usa query strings; se descartan
        let path = parts[1].split('?').next().unwrap_or_default().to_string();
        if !path.starts_with('/') {
            return Err(RequestError::InvalidRequestLine);
        }

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(RequestError::InvalidHttpVersion(version));
        }

        Ok((method, path, version))
    }

    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Result<HashMap<String, String>, RequestError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| RequestError::InvalidHeader(line.to_string()))?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(headers)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Header por nombre, sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body interpretado como JSON; `None` si está vacío o no es JSON válido
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Posición donde empieza `\r\n\r\n`, si ya llegó completa
pub fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

/// Lee `Content-Length` de una cabecera cruda (sin el terminador)
///
/// Se usa mientras el request todavía se está recibiendo, antes de poder
/// parsearlo entero. Sin el header el largo es 0.
pub fn content_length(head: &[u8]) -> Result<usize, RequestError> {
    let head = String::from_utf8_lossy(head);

    for line in head.split("\r\n").skip(1) {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let value = value.trim();
                return value
                    .parse()
                    .map_err(|_| RequestError::InvalidContentLength(value.to_string()));
            }
        }
    }

    Ok(0)
}
