//! Shared configuration and error types for the kunai workspace.

pub mod config;
pub mod error;
pub mod telemetry;
