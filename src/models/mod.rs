//! Request and Response models for the cache HTTP harness
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{InsertRequest, RemoveQuery};
pub use responses::{
    EntriesResponse, GetResponse, HealthResponse, InsertResponse, ListedEntry, RemoveResponse,
    StatsResponse,
};
