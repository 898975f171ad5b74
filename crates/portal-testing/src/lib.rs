//! Testing utilities and harness for Portal-RS

#![allow(non_snake_case)]

pub mod testing;

// Re-export testing utilities
pub use testing::*;
