#[cfg(feature = "cli")]
pub mod cli;
pub mod client_config;

pub use client_config::ClientConfig;
