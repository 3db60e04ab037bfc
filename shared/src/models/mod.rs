//! Domain models for the mosKITA dengue forecast platform

mod barangay;
mod climate;
mod forecast;
mod report;

pub use barangay::*;
pub use climate::*;
pub use forecast::*;
pub use report::*;
