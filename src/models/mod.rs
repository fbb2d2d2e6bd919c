//! Core data models for the storage node.
//!
//! `FileMetadata` is the record persisted beside each blob; the response
//! types shape what the HTTP layer hands back to clients.

pub mod file;
