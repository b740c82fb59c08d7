//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the object storage clients and their adapters.

pub mod storage;
