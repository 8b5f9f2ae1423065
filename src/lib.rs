pub mod config;
pub mod data;
pub mod state;
pub mod table_display;
pub mod utils;
