//! Wellness Tracker Backend Library
//!
//! Reminder scheduling and notification dispatch over a document store.
//! Exposes the backend modules for use in tests and other crates.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;
