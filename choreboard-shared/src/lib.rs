//! # Choreboard Shared Library
//!
//! Data model, persistence and domain logic shared by the Choreboard API
//! server and the reminder worker.
//!
//! ## Module Organization
//!
//! - `db`: SQLite pool and embedded migrations
//! - `models`: database models and their queries
//! - `auth`: passwords, session tokens, request context, role checks
//! - `directory`: teams, memberships, invite codes
//! - `registration`: sign-up (create or join mode), login, profile
//! - `registry`: tasks and categories
//! - `ledger`: append-only task history
//! - `fanout`: notifications and the due-reminder sweep
//! - `error`: domain error taxonomy
//! - `best_effort`: outcome type for writes that must not fail their parent

pub mod auth;
pub mod best_effort;
pub mod db;
pub mod directory;
pub mod error;
pub mod fanout;
pub mod ledger;
pub mod models;
pub mod registration;
pub mod registry;

/// Current version of the Choreboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
