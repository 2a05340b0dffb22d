pub use crate::server::GraphServer;

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod interceptor;
pub mod model;
mod routes;
pub mod server;
