pub mod api;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod handoff;
pub mod models;
pub mod session;
pub mod ui;
