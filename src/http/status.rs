//! # Códigos de Estado HTTP
//!
//! Solo los códigos que usa la API:
//!
//! - **2xx**: 200 OK
//! - **4xx**: 400, 404, 405, 413

/// Códigos de estado que emite el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok = 200,

    /// 400 Bad Request - Body inválido o parámetros faltantes
    BadRequest = 400,

    /// 404 Not Found - Ruta desconocida
    NotFound = 404,

    /// 405 Method Not Allowed - La ruta existe con otro método
    MethodNotAllowed = 405,

    /// 413 Payload Too Large - Body por encima del límite
    PayloadTooLarge = 413,
}

impl StatusCode {
    /// # Ejemplo
    /// ```
    /// use health_stats_server::http::StatusCode;
    /// assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
