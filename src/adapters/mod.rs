//! External system integrations for Argus.
//!
//! This module provides adapters for the collaborators the scan pipeline
//! consumes:
//!
//! - [`database`] - Database abstraction layer plus the PostgreSQL adapter
//! - [`ner`] - NER service HTTP client
//! - [`repository`] - Scan state persistence
//! - [`notify`] - Progress notification channels
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies
//! and enable testing with in-memory implementations. The database layer is
//! trait-based so additional dialects can slot in next to PostgreSQL.

pub mod database;
pub mod ner;
pub mod notify;
pub mod repository;
