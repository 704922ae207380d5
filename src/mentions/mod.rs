// src/mentions/mod.rs

pub mod debounce;
pub mod detector;
pub mod scoring;

pub use debounce::Debouncer;
pub use scoring::{suggest, Suggestion};
