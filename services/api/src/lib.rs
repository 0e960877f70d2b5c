//! services/api/src/lib.rs
//!
//! The learning API: serves the course catalogue joined with each device's local
//! overlays over REST and a live WebSocket.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
