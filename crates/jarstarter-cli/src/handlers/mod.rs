//! Command handlers.

pub mod address;
pub mod config;
pub mod logs;
pub mod paths;
pub mod provision;
pub mod run;
