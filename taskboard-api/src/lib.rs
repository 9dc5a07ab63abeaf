//! # Taskboard API Server Library
//!
//! HTTP surface of the task tracker: routing, sessions, forms and error
//! mapping. Persistence and business rules live in `taskboard-shared`.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error handling and HTTP response mapping
//! - `forms`: request bodies, validation and form descriptors
//! - `middleware`: security headers and the login gate
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod routes;
