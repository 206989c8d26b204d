//! Utility functions for the recorder.

mod conversion;

pub use conversion::{reserve_to_f64, u256_ratio};
