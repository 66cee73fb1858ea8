//! Configuration module for archive rewriting
//!
//! This module provides the `RewriteConfig` struct and its type-safe builder, shared by
//! the rewriters of every document of one scrape.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{RewriteConfigBuilder, WithFuzzyRules};
pub use types::RewriteConfig;
