// src/services/mod.rs

pub mod ranking;
pub mod scoring;
pub mod selector;
