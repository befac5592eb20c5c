// src/api/mod.rs

pub mod client;
pub mod types;

pub use client::KoboClient;
pub use types::{Asset, Page, ProjectView};
