//! # Módulo HTTP
//!
//! Protocolo HTTP implementado a mano sobre bytes:
//!
//! - Parsing de requests HTTP/1.0 y HTTP/1.1 con body JSON
//! - Construcción de responses
//! - Status codes usados por la API
//!
//! Cada conexión lleva un único request y se cierra después de responder.
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 21\r\n
//! \r\n
//! {"job_id":"job_id_1"}
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, Request, RequestError};
pub use response::Response;
pub use status::StatusCode;
