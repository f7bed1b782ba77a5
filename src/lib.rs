//! flowscope - A terminal dashboard for marketing automation flows
//!
//! This crate lists flows from a marketing API, resolves the email steps of
//! each flow with rate-limit aware retries, and asks a text-generation
//! backend to rate every subject line.

pub mod app;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;

pub use app::App;
