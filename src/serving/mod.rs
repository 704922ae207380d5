// src/serving/mod.rs

pub mod client;
pub mod engine;
pub mod rotation;
pub mod tracking;

pub use client::{AdClient, AdSlot};
pub use engine::{AdRequest, FeedItem, Placement};
