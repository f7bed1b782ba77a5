//! Marketing and AI provider implementations.
//!
//! This module contains provider traits and implementations for external services:
//!
//! - [`marketing`] - Marketing automation API (Klaviyo)
//! - [`generation`] - Text-generation backends (chat completions)

pub mod generation;
pub mod marketing;
