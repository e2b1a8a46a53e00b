//! Post Service Library
//!
//! CRUD endpoints for a single `Post` resource. Every endpoint answers
//! with the `{status, data}` envelope.
//!
//! # Modules
//!
//! - `api`: axum router and request extractors
//! - `controller`: the five post operations
//! - `pipeline`: validate → transact → envelope, shared by all operations
//! - `validation`: declarative field rules
//! - `store`: PostgreSQL and in-memory persistence
//! - `models`, `pagination`, `envelope`, `error`: data shapes
//! - `config`, `telemetry`: configuration loading and tracing setup

pub mod api;
pub mod config;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod models;
pub mod pagination;
pub mod pipeline;
pub mod store;
pub mod telemetry;
pub mod validation;

pub use config::Config;
pub use controller::PostController;
pub use envelope::{Envelope, Status};
pub use error::{AppError, Result};
