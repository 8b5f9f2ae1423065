//! Data layer: rows, column metadata and the view pipeline built over them
//!
//! Rows are shared JSON records. The pipeline stages (search, filters, sort,
//! pagination) each work on index vectors into the backing rows, and
//! `data_grid` wires them together with selection, editing and export.

// Core row and column model
pub mod column;
pub mod row;
pub mod value_accessor;

// Pipeline stages
pub mod filter;
pub mod pagination;
pub mod search;
pub mod sort;

// Interaction state
pub mod edit_session;
pub mod selection;

pub mod data_exporter;
pub mod data_grid;

// Data sources
pub mod loaders;
pub mod type_inference;
