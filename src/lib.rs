pub mod acquire;
pub mod cli;
pub mod commands;
pub mod container;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod server;
pub mod telemetry;

pub use error::{Result, StampedeError};
