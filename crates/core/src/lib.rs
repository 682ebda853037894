#![deny(warnings)]

pub mod aggregate;
pub mod audio;
pub mod classify;
pub mod config;
pub mod interpret;
pub mod metrics;
pub mod pipeline;
pub mod segment;
pub mod signal;
