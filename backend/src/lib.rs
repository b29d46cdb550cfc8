//! # GIFTECH Admin Backend
//!
//! Administrative backend for the GIFTECH education platform: the faculty,
//! school, student and scholarship directories, and the weekly teaching
//! timetable with double-booking protection.
//!
//! ## Architecture
//!
//! - [`models`]: Domain records, identifiers and time-of-day types
//! - [`scheduling`]: The timetable overlap rule and conflict reporting
//! - [`db`]: Repository pattern, in-memory backend and the service layer
//! - [`services`]: Dashboard statistics and the access-grant session cache
//! - [`config`]: TOML configuration with environment overrides
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod scheduling;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
