pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod health;
pub mod history;
pub mod invoice;
pub mod upload;
