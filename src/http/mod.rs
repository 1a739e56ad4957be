//! Graph viewer: embedded Sigma.js page plus `/api/graph` and `/api/stats`

pub mod handler;
pub mod server;

pub use server::{router, HttpServer};
