//! # Palaver
//!
//! A customer-support chatbot for an e-commerce store.
//!
//! ## Features
//!
//! - CSV dataset repair and merging tools
//! - TF-IDF + softmax intent classifier trained from labeled queries
//! - Canned responses for confidently classified intents
//! - Generative-AI fallback for everything else
//! - Web chat UI with image/video upload handling

pub mod ai;
pub mod analysis;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod ml;
pub mod model;
pub mod server;
pub mod trainer;
pub mod uploads;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
