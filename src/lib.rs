pub mod cli;
pub mod config;
pub mod core;
pub mod diff;
pub mod engine;
pub mod exit;
pub mod fields;
pub mod logging;
pub mod openapi;
pub mod scan;
pub mod schema;
pub mod ui;
