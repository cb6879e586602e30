pub mod args;
pub mod client;
pub mod commands;
pub mod config;
