//! # Choreboard API Server Library
//!
//! HTTP surface of Choreboard: session-cookie auth, teams, tasks,
//! categories and notifications as JSON over axum.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: JSON and query extractors that reject with the failure envelope
//! - `middleware`: Security headers and session resolution
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
