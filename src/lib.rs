// Public API - configuration, statistics, engine, and renderers
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod lookup;
pub mod monitor;
pub mod printer;
pub mod probe;
pub mod state;
