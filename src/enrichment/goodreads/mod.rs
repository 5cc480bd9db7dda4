//! Goodreads ratings integration.
//!
//! Same layering as the other external sources: `dto` mirrors the API,
//! `adapter` converts to domain types, `client` owns the HTTP plumbing.

pub mod adapter;
pub mod client;
pub mod dto;

pub use client::GoodreadsClient;
