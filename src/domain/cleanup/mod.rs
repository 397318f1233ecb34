pub mod service;

pub use service::{
    compare_for_retention, retention_score, CleanupReport, CleanupService, CleanupServiceApi,
};
