//! Balance simulator for Cow Empire.
//! Run with: cargo test simulate_progression -- --nocapture
