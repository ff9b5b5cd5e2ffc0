pub mod bootstrap;
pub mod config;
pub mod db;
pub mod errors;
pub mod graph;
pub mod mcp;
pub mod service;
pub mod types;
