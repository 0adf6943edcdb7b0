//! # Choreboard Worker Library
//!
//! Batch jobs run outside the API process. Today that is the due-reminder
//! sweep, invoked once per run by an external scheduler (cron, systemd timer).
//!
//! ## Modules
//!
//! - `config`: Environment configuration
//! - `sweeper`: Due-reminder sweep

pub mod config;
pub mod sweeper;
