// Filtering and aggregation core of the project dashboard.
//
// Datasets are loaded once into typed records (`loader`, `cache`), narrowed by
// facet selections (`filters`), summarized (`aggregate`) and placed on a map
// (`geo`). The terminal front-end lives in `main.rs`.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod filters;
pub mod geo;
pub mod loader;
pub mod output;
pub mod types;
pub mod util;

pub use cache::DatasetCache;
pub use config::DashboardConfig;
pub use error::{DataError, Result};
pub use filters::{ProjectCriteria, Selection};
