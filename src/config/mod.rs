//! Configuration module
//!
//! Grid defaults (page size, selection mode, export location) read from a
//! TOML file in the user's config directory.

pub mod config;
