//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea método + path a un handler.
//!
//! ```text
//! Request → Router → Handler(&Request, &RouteParams, &S) → Response
//! ```
//!
//! Un patrón es una secuencia de segmentos literales o de parámetros
//! `:nombre`, que capturan exactamente un segmento no vacío. Si el path
//! coincide con alguna ruta pero con otro método, la respuesta es 405; si no
//! coincide con ninguna, 404.

use crate::http::{Method, Request, Response, StatusCode};

/// Handler de una ruta. `S` es el estado compartido (ej: el Job Manager).
pub type Handler<S> = fn(&Request, &RouteParams, &S) -> Response;

/// Parámetros capturados por los segmentos `:nombre`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: Vec<(String, String)>,
}

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route<S> {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    handler: Handler<S>,
}

impl<S> Route<S> {
    fn matches(&self, path: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.params.push((name.clone(), part.to_string()));
                }
                _ => return None,
            }
        }

        Some(params)
    }

    /// HEAD se atiende con las rutas GET
    fn accepts(&self, method: Method) -> bool {
        self.method == method || (method == Method::HEAD && self.method == Method::GET)
    }
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .trim_start_matches('/')
        .split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(part.to_string()),
        })
        .collect()
}

/// Router sobre un estado compartido `S`
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta; gana la primera que coincida
    ///
    /// # Ejemplo
    /// ```
    /// use health_stats_server::router::{RouteParams, Router};
    /// use health_stats_server::http::{Method, Request, Response};
    /// use serde_json::json;
    ///
    /// fn hello(_req: &Request, params: &RouteParams, _state: &()) -> Response {
    ///     Response::json(&json!({ "name": params.get("name") }))
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello/:name", hello);
    ///
    /// let request = Request::parse(b"GET /hello/ana HTTP/1.0\r\n\r\n").unwrap();
    /// let response = router.route(&request, &());
    /// assert_eq!(response.body_json().unwrap()["name"], "ana");
    /// ```
    pub fn register(&mut self, method: Method, pattern: &str, handler: Handler<S>) {
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            segments: parse_pattern(pattern),
            handler,
        });
    }

    /// Despacha el request al handler que corresponda
    pub fn route(&self, request: &Request, state: &S) -> Response {
        let path = request.path();
        let mut path_matched = false;

        for route in &self.routes {
            if let Some(params) = route.matches(path) {
                if route.accepts(request.method()) {
                    return (route.handler)(request, &params, state);
                }
                path_matched = true;
            }
        }

        if path_matched {
            Response::error(
                StatusCode::MethodNotAllowed,
                &format!("Method {} not allowed on {}", request.method().as_str(), path),
            )
        } else {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        }
    }

    /// Listado legible de las rutas registradas, una por línea
    pub fn describe(&self) -> String {
        self.routes
            .iter()
            .map(|route| format!("{} {}\n", route.method.as_str(), route.pattern))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}
