//! Chatvault - durable storage for messaging-group ingestion.
//!
//! Persists groups, messages and change-detected group metadata history on
//! either an embedded (SQLite) or a networked (PostgreSQL) engine, chosen
//! once at startup.

pub mod config;
pub mod ingest;
pub mod storage;
pub mod store;
pub mod utils;
