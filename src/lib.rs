//! Policy enforcement point: a reverse proxy that only forwards requests whose
//! bearer token is reported active by an OAuth2 introspection endpoint (RFC 7662).
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
