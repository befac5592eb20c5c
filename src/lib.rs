// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod schema;

pub mod error;
pub mod export;
pub mod progress;
pub mod runner;
pub mod search;
pub mod session;
pub mod store;

pub use error::Error;
