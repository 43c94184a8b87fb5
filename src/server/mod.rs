//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes, cada una en su propio thread
//! 3. Lee y parsea el request HTTP
//! 4. Despacha al router de la API y envía la respuesta

pub mod tcp;

pub use tcp::Server;
