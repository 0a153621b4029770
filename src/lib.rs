// ABOUTME: Library root for caravel - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod local;
pub mod output;
pub mod preflight;
pub mod release;
pub mod remote;
pub mod ssh;
pub mod transfer;
pub mod types;
