//! Shared types for the execution-amount calculation engine.
//!
//! Orders, fill requests, phase lists, the error taxonomy and the
//! configuration schema utilities live here so that every other crate in the
//! workspace speaks the same vocabulary.

pub mod configs;
pub mod errors;
pub mod order;
pub mod phase;
pub mod validation;

pub use alloy_primitives::{Address, Bytes, I256, U256};
pub use configs::*;
pub use errors::*;
pub use order::*;
pub use phase::*;
pub use validation::*;
