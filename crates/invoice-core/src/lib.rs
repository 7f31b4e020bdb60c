//! invoice-core - Core library for the invoice client
//!
//! This crate holds the session state, the auth flow, the upload
//! coordinator and the history reconciliation engine shared by every
//! invoice client front-end, plus the HTTP transport they talk through.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod session;
pub mod state;
pub mod upload;
pub mod util;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
