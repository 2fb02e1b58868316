//! Common definitions shared by the standin crates.
//!
//! - Recursion and capacity limits for template substitution

// Centralized limits and thresholds
pub mod limits;
pub use limits::{INLINE_ATOMIC_CAPACITY, MAX_INFERRED_REPLACE_DEPTH, MAX_STANDIN_DEPTH};
