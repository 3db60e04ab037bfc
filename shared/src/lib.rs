//! Shared types and models for the mosKITA dengue forecast platform
//!
//! This crate contains the wire and domain types shared between the API
//! server, the training CLI and any other component of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
