//! OpenAI summary-generation integration.
//!
//! Layered like every external source: `dto` mirrors the API response
//! exactly, `adapter` converts DTOs to domain types (and computes cost),
//! `client` owns the HTTP plumbing.

pub mod adapter;
pub mod client;
pub mod dto;

pub use client::OpenAiClient;
