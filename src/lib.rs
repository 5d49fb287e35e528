pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod platform;
pub mod progress;
pub mod scanner;

pub use classify::SheetFormat;
pub use config::AppConfig;
pub use engine::{DeleteRequest, DeletionFailure, DeletionReport, ScanEngine};
pub use error::Error;
pub use model::SheetFile;
pub use progress::{ProgressReporter, SilentReporter};
