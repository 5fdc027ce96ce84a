//! Data generation: synthetic decline series for demos and tests.

pub mod sample;

pub use sample::*;
