// src/core/mod.rs

pub mod csv;
pub mod fuzzy;
pub mod sanitize;
