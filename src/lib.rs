//! Single-node HTTP file storage.
//!
//! Clients upload bytes, get back a generated identifier, and later fetch,
//! inspect or delete the file by that identifier. [`services::storage_service`]
//! owns the on-disk layout; everything else is HTTP plumbing around it.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
