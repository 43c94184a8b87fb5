//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread por conexión. Cada conexión lleva un request: se lee completo
//! (cabecera + `Content-Length` bytes de body), se despacha al router y se
//! cierra después de responder.

use crate::http::request::{content_length, find_head_end};
use crate::http::{Method, Request, RequestError, Response, StatusCode};
use crate::jobs::handlers;
use crate::jobs::JobManager;
use crate::router::Router;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Tamaño máximo de un request (cabecera + body)
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Tiempo máximo esperando bytes del cliente
const READ_TIMEOUT: Duration = Duration::from_secs(5);

const SERVER_NAME: &str = concat!("health-stats/", env!("CARGO_PKG_VERSION"));

/// Resultado de leer un request del socket
#[derive(Debug)]
enum ReadOutcome {
    Complete(Vec<u8>),

    /// El cliente cerró sin mandar nada
    Closed,

    TooLarge,

    Malformed(RequestError),
}

/// Estado compartido por todas las conexiones
struct Shared {
    router: Router<JobManager>,
    manager: Arc<JobManager>,
    next_request_id: AtomicU64,
}

/// Servidor HTTP concurrente
pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl Server {
    /// Abre el socket; con puerto 0 el sistema elige uno libre
    pub fn bind(address: &str, manager: Arc<JobManager>) -> io::Result<Self> {
        let listener = TcpListener::bind(address)?;

        Ok(Self {
            listener,
            shared: Arc::new(Shared {
                router: handlers::routes(),
                manager,
                next_request_id: AtomicU64::new(1),
            }),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Acepta conexiones para siempre
    pub fn run(self) -> io::Result<()> {
        tracing::info!(address = %self.local_addr()?, "server listening");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let shared = Arc::clone(&self.shared);
                    let request_id = shared.next_request_id.fetch_add(1, Ordering::Relaxed);

                    let spawned = thread::Builder::new()
                        .name(format!("conn-{}", request_id))
                        .spawn(move || {
                            if let Err(e) = handle_connection(stream, &shared, request_id) {
                                tracing::warn!(request_id, error = %e, "connection error");
                            }
                        });

                    if let Err(e) = spawned {
                        tracing::error!(error = %e, "failed to spawn connection thread");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                }
            }
        }

        Ok(())
    }
}

fn handle_connection(mut stream: TcpStream, shared: &Shared, request_id: u64) -> io::Result<()> {
    let start = Instant::now();
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let (response, method, path) = match read_request(&mut stream)? {
        ReadOutcome::Closed => {
            tracing::debug!(request_id, "connection closed without request");
            return Ok(());
        }
        ReadOutcome::TooLarge => (
            Response::error(StatusCode::PayloadTooLarge, "Request too large"),
            "-".to_string(),
            "-".to_string(),
        ),
        ReadOutcome::Malformed(e) => (
            Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e)),
            "-".to_string(),
            "-".to_string(),
        ),
        ReadOutcome::Complete(bytes) => match Request::parse(&bytes) {
            Ok(request) => {
                let response = dispatch(&request, shared);
                (response, request.method().as_str().to_string(), request.path().to_string())
            }
            Err(e) => (
                Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e)),
                "-".to_string(),
                "-".to_string(),
            ),
        },
    };

    let response = response
        .with_header("Server", SERVER_NAME)
        .with_header("Connection", "close")
        .with_header("X-Request-Id", &request_id.to_string());

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    tracing::info!(
        request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request served"
    );

    Ok(())
}

/// Rutas de la API, más el índice en `/` y `/index`
fn dispatch(request: &Request, shared: &Shared) -> Response {
    let is_index = matches!(request.path(), "/" | "/index");

    let response = match request.method() {
        Method::GET | Method::HEAD if is_index => Response::text(&index_page(&shared.router)),
        Method::POST if is_index => Response::error(
            StatusCode::MethodNotAllowed,
            &format!("Method POST not allowed on {}", request.path()),
        ),
        _ => shared.router.route(request, &shared.manager),
    };

    if request.method() == Method::HEAD {
        response.without_body()
    } else {
        response
    }
}

fn index_page(router: &Router<JobManager>) -> String {
    format!(
        "Interact with the webserver using one of the defined routes:\n{}",
        router.describe()
    )
}

/// Lee del socket hasta tener la cabecera completa y el body declarado
fn read_request(stream: &mut impl Read) -> io::Result<ReadOutcome> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut expected_total: Option<usize> = None;

    loop {
        if let Some(total) = expected_total {
            if buffer.len() >= total {
                buffer.truncate(total);
                return Ok(ReadOutcome::Complete(buffer));
            }
        }

        let read = stream.read(&mut chunk)?;
        if read == 0 {
            // El cliente cerró la escritura: se parsea lo que haya
            return Ok(if buffer.is_empty() {
                ReadOutcome::Closed
            } else {
                ReadOutcome::Complete(buffer)
            });
        }
        buffer.extend_from_slice(&chunk[..read]);

        if expected_total.is_none() {
            match find_head_end(&buffer) {
                Some(end) => {
                    let body_len = match content_length(&buffer[..end]) {
                        Ok(len) => len,
                        Err(e) => return Ok(ReadOutcome::Malformed(e)),
                    };
                    let total = end.saturating_add(4).saturating_add(body_len);
                    if total > MAX_REQUEST_BYTES {
                        return Ok(ReadOutcome::TooLarge);
                    }
                    expected_total = Some(total);
                }
                None if buffer.len() > MAX_REQUEST_BYTES => return Ok(ReadOutcome::TooLarge),
                None => {}
            }
        }
    }
}
