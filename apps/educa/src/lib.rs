//! # Educa
//!
//! HTTP/WebSocket front end of the Educa e-learning platform. The catalog
//! itself lives in `educa-core`; this crate adds the JSON API, the course
//! chat rooms, listing caches, configuration and the CLI.

pub mod api;
pub mod cli;
pub mod config;
