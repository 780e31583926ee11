//! # Taskboard API Server Library
//!
//! HTTP API for the taskboard service: projects, tasks, comments and
//! notifications behind a role-based access-control layer.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Request-level layers (security headers)
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
