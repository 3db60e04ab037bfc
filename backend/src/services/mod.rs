//! Business logic services for the mosKITA forecast platform

pub mod climate_index;
pub mod climate_resolver;
pub mod features;
pub mod forecast;
pub mod insights;
pub mod model_store;
pub mod reports;
pub mod training;
pub mod uploads;

pub use forecast::ForecastService;
pub use model_store::{ModelPaths, ModelSnapshot, ModelStore};
pub use reports::CaseReportService;
pub use uploads::{UploadKind, UploadService};
