//! Gemini backend for GenCraft
//!
//! Implements [`gencraft_core::GenerationBackend`] against the Gemini
//! `generateContent` REST API:
//! - structured stages ask for JSON constrained by a response schema
//! - the image stage asks for TEXT and IMAGE modalities and returns the
//!   first inline image as a data URI

pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use client::GeminiBackend;
pub use config::GeminiConfig;
pub use error::{GeminiError, Result};
