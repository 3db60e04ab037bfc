//! HTTP request handlers

pub mod forecast;
pub mod health;
pub mod insights;
pub mod model;
pub mod reports;
pub mod uploads;

pub use forecast::*;
pub use health::*;
pub use insights::*;
pub use model::*;
pub use reports::*;
pub use uploads::*;
