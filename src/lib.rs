pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod migrate;
pub mod orchestrator;
pub mod project;
pub mod ready;
pub mod topology;
pub mod ui;
